use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Anchor for one day's items and everything derived from them.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Digest {
    pub id: String,
    pub digest_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
