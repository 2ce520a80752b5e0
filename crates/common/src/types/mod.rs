use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Body of `GET /api/v1/status`.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Status {
    pub status: String,
}

impl Status {
    pub fn ok() -> Self {
        Self { status: "OK".to_string() }
    }
}

/// Per-type object counts keyed by lowercase plural (`"states"`, ...).
pub type Stats = BTreeMap<String, u64>;

/// JSON error payload: `{"error": "..."}`.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}
