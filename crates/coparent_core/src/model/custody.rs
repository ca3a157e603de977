//! Custodian label shared by every schedule computation.

use serde::{Deserialize, Serialize};

/// Which parent has the children on a given day.
///
/// The label is binary on purpose: a split holiday is not a label and is
/// represented separately by `HolidayCustody::Shared`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    A,
    B,
}

impl Label {
    /// Returns the other parent.
    pub fn flip(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Stable string id used in persisted rows (`"A"`/`"B"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }

    /// User-facing name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::A => "Parent A",
            Self::B => "Parent B",
        }
    }

    /// Parses the persisted `"A"`/`"B"` form. Case-sensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            _ => None,
        }
    }

    /// Custom pattern cells are persisted as `0` (parent A) and `1` (parent B).
    pub fn from_cell(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::A),
            1 => Some(Self::B),
            _ => None,
        }
    }

    pub fn to_cell(self) -> u8 {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}
