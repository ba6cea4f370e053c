//! Trade direction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a closed trade.
///
/// Ledgers are written in either English or Spanish, so parsing accepts
/// `long`/`largo` and `short`/`corto` regardless of case. Anything else is
/// rejected instead of silently falling back to one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn is_long(self) -> bool {
        matches!(self, Side::Long)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "Long"),
            Side::Short => write!(f, "Short"),
        }
    }
}

/// The raw side string did not name a known direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSide(pub String);

impl FromStr for Side {
    type Err = UnknownSide;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" | "largo" => Ok(Side::Long),
            "short" | "corto" => Ok(Side::Short),
            _ => Err(UnknownSide(s.to_string())),
        }
    }
}
