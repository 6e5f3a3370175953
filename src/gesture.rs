// src/gesture.rs
use crate::error::{ConsensusError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GestureType {
    Export,
    Filter,
    Highlight,
    MultiSelect,
    Pan,
    Rotate,
    SaveView,
    SelectAxis,
    SelectCluster,
    SelectLasso,
    SelectSingle,
    Zoom,
    SelectRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HandSide {
    Left,
    Right,
}

/// What a gesture dropdown can hold. `All` never reaches the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureSelection {
    All,
    Only(GestureType),
}

/// The pair of filter keys an aggregation run is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GestureFilter {
    pub gesture: GestureType,
    pub hand: HandSide,
}

const WILDCARD: &str = "ALL";

static GESTURE_LOOKUP: Lazy<HashMap<String, GestureType>> = Lazy::new(|| {
    GestureType::ALL
        .iter()
        .map(|g| (lookup_key(g.name()), *g))
        .collect()
});

static HAND_LOOKUP: Lazy<HashMap<String, HandSide>> = Lazy::new(|| {
    HandSide::ALL
        .iter()
        .map(|h| (lookup_key(h.name()), *h))
        .collect()
});

// "Select Range", "select_range" and "SELECTRANGE" all resolve to the same key.
fn lookup_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl GestureType {
    pub const ALL: [GestureType; 13] = [
        GestureType::Export,
        GestureType::Filter,
        GestureType::Highlight,
        GestureType::MultiSelect,
        GestureType::Pan,
        GestureType::Rotate,
        GestureType::SaveView,
        GestureType::SelectAxis,
        GestureType::SelectCluster,
        GestureType::SelectLasso,
        GestureType::SelectSingle,
        GestureType::Zoom,
        GestureType::SelectRange,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GestureType::Export => "Export",
            GestureType::Filter => "Filter",
            GestureType::Highlight => "Highlight",
            GestureType::MultiSelect => "MultiSelect",
            GestureType::Pan => "Pan",
            GestureType::Rotate => "Rotate",
            GestureType::SaveView => "SaveView",
            GestureType::SelectAxis => "SelectAxis",
            GestureType::SelectCluster => "SelectCluster",
            GestureType::SelectLasso => "SelectLasso",
            GestureType::SelectSingle => "SelectSingle",
            GestureType::Zoom => "Zoom",
            GestureType::SelectRange => "SelectRange",
        }
    }

    /// Sorted dropdown options, wildcard included.
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Self::ALL.iter().map(|g| g.name()).collect();
        names.push(WILDCARD);
        names.sort_unstable();
        names
    }
}

impl HandSide {
    pub const ALL: [HandSide; 2] = [HandSide::Left, HandSide::Right];

    pub fn name(self) -> &'static str {
        match self {
            HandSide::Left => "Left",
            HandSide::Right => "Right",
        }
    }
}

impl fmt::Display for GestureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for HandSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for GestureFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.gesture, self.hand)
    }
}

impl FromStr for GestureType {
    type Err = ConsensusError;

    fn from_str(s: &str) -> Result<Self> {
        GESTURE_LOOKUP
            .get(&lookup_key(s))
            .copied()
            .ok_or_else(|| ConsensusError::InvalidFilter(s.to_string(), "gesture type"))
    }
}

impl FromStr for HandSide {
    type Err = ConsensusError;

    fn from_str(s: &str) -> Result<Self> {
        HAND_LOOKUP
            .get(&lookup_key(s))
            .copied()
            .ok_or_else(|| ConsensusError::InvalidFilter(s.to_string(), "hand side"))
    }
}

impl FromStr for GestureSelection {
    type Err = ConsensusError;

    fn from_str(s: &str) -> Result<Self> {
        if lookup_key(s) == lookup_key(WILDCARD) {
            return Ok(GestureSelection::All);
        }
        s.parse().map(GestureSelection::Only)
    }
}

impl GestureSelection {
    pub fn matches(self, gesture: GestureType) -> bool {
        match self {
            GestureSelection::All => true,
            GestureSelection::Only(g) => g == gesture,
        }
    }
}

impl GestureFilter {
    pub fn new(gesture: GestureType, hand: HandSide) -> Self {
        Self { gesture, hand }
    }

    /// Parses UI strings into a concrete filter. The wildcard is rejected here.
    pub fn parse(gesture: &str, hand: &str) -> Result<Self> {
        Ok(Self {
            gesture: gesture.parse()?,
            hand: hand.parse()?,
        })
    }
}
