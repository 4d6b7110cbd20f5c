use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type PageId = i64;

/// A single journal page.
///
/// `timestamp` is fixed at creation and kept at millisecond precision, which
/// is what the persisted ISO-8601 form carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub content: String,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl Page {
    pub fn new(id: PageId, now: DateTime<Utc>) -> Self {
        Page {
            id,
            content: String::new(),
            timestamp: now.trunc_subsecs(3),
        }
    }

    /// Calendar date of the creation time, in UTC.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Picks an id from the clock, bumping past `last_issued` when the clock has
/// not moved forward. `None` when nothing above `last_issued` is left.
pub fn next_id(now: DateTime<Utc>, last_issued: Option<PageId>) -> Option<PageId> {
    let candidate = now.timestamp_millis();
    match last_issued {
        Some(last) if candidate <= last => last.checked_add(1),
        _ => Some(candidate),
    }
}

mod iso_millis {
    use super::*;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
