/// An absolute instant, UTC
pub type UtcTimestamp = chrono::DateTime<chrono::Utc>;
