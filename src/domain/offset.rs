use std::fmt;

use serde::{Deserialize, Serialize};

/// Which end of the sequence a page request extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Items strictly older than the cursor.
    Before,
    /// Items strictly newer than the cursor.
    After,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Before => "before",
            Direction::After => "after",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boundary ids of the range known to the client.
///
/// `before` is the oldest id at the tail of the live sequence and `after`
/// the newest id at its head. Both are `None` until something was loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    #[serde(default)]
    pub before: Option<i64>,
    #[serde(default)]
    pub after: Option<i64>,
}

impl Offset {
    pub fn new(before: Option<i64>, after: Option<i64>) -> Self {
        Self { before, after }
    }
}
