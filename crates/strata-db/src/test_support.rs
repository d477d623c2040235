//! Shared fixtures for strata-db unit tests.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use strata_core::entities::{Item, NewItem, NewQueueItem};
use strata_core::scoring::ScoreWeights;

use crate::StrataDb;
use crate::service::StrataService;

/// In-memory service with the schema applied.
pub async fn test_service() -> StrataService {
    let db = StrataDb::open_local(":memory:").await.unwrap();
    StrataService::from_db(db)
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

pub fn at(d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, hour, 0, 0).unwrap()
}

pub fn new_item(title: &str, source: &str, d: u32) -> NewItem {
    NewItem {
        title: title.to_string(),
        content: format!("{title}: body text long enough to embed."),
        source_identifier: source.to_string(),
        source_url: None,
        collected_at: at(d, 8),
        newsletter_date: day(d),
        embedding: None,
    }
}

pub async fn insert(svc: &StrataService, title: &str, source: &str, d: u32) -> Item {
    svc.insert_item(&new_item(title, source, d)).await.unwrap()
}

pub fn queue_row(title: &str, source: &str, synthesis: f64) -> NewQueueItem {
    NewQueueItem {
        title: title.to_string(),
        source_identifier: source.to_string(),
        synthesis_score: synthesis,
        ..Default::default()
    }
}

pub fn week() -> Duration {
    Duration::days(7)
}

pub fn weights() -> ScoreWeights {
    ScoreWeights::default()
}
