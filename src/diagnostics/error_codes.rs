//! Integer error code descriptions.
//!
//! The table is filled once from configuration and only read afterwards, so it
//! can be shared freely.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Returned for any code the table does not know.
pub const UNRECOGNIZED_CODE: &str = "Error code not recognized";

/// Read-only mapping from error code to description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCodeTable {
    codes: BTreeMap<i64, String>,
}

impl ErrorCodeTable {
    pub fn new(codes: BTreeMap<i64, String>) -> Self {
        Self { codes }
    }

    /// Description for `code`, or [`UNRECOGNIZED_CODE`]. Total over all inputs.
    pub fn lookup(&self, code: i64) -> &str {
        self.codes
            .get(&code)
            .map(String::as_str)
            .unwrap_or(UNRECOGNIZED_CODE)
    }

    pub fn contains(&self, code: i64) -> bool {
        self.codes.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.codes.iter().map(|(code, desc)| (*code, desc.as_str()))
    }
}

impl FromIterator<(i64, String)> for ErrorCodeTable {
    fn from_iter<I: IntoIterator<Item = (i64, String)>>(iter: I) -> Self {
        Self {
            codes: iter.into_iter().collect(),
        }
    }
}

/// Free-function form of [`ErrorCodeTable::lookup`].
pub fn lookup_error_code(code: i64, table: &ErrorCodeTable) -> &str {
    table.lookup(code)
}

/// Descriptions of the system error codes serial drivers commonly report.
pub fn default_error_codes() -> ErrorCodeTable {
    [
        (2, "The system cannot find the file specified (port does not exist)"),
        (5, "Access is denied (port is open in another application)"),
        (31, "A device attached to the system is not functioning"),
        (87, "The parameter is incorrect (unsupported port settings)"),
        (121, "The semaphore timeout period has expired"),
        (995, "The I/O operation has been aborted"),
        (1167, "The device is not connected"),
    ]
    .into_iter()
    .map(|(code, desc)| (code, desc.to_string()))
    .collect()
}
