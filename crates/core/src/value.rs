use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel spellings the extraction stage emits for "value unknown".
/// Compared case-insensitively after trimming.
const ABSENT_TOKENS: [&str; 5] = ["na", "n/a", "n\\a", "not applicable", "not available"];

/// Flat scalar payload of a record field. The wire format carries strings,
/// numbers, booleans, and nulls; nothing nested survives extraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// Whether this value denotes "unknown". Absence never means "cleared";
    /// an absent incoming value must not overwrite a known one.
    pub fn is_absent(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Text(text) => {
                let cleaned = text.trim().to_ascii_lowercase();
                cleaned.is_empty() || ABSENT_TOKENS.contains(&cleaned.as_str())
            }
            Scalar::Bool(_) | Scalar::Number(_) => false,
        }
    }

    /// The single decision point for the absence sentinel: `Some` only when
    /// the value carries information.
    pub fn known(&self) -> Option<&Scalar> {
        if self.is_absent() {
            None
        } else {
            Some(self)
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(value) => write!(f, "{value}"),
            Scalar::Number(value) => write!(f, "{value}"),
            Scalar::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}
