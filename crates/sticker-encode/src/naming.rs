use chrono::{DateTime, Utc};

pub const FILENAME_PREFIX: &str = "dynamic-emoji";

/// `dynamic-emoji-<unix millis>.<extension>` for the given instant.
pub fn export_filename_at(extension: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}.{}", FILENAME_PREFIX, at.timestamp_millis(), extension)
}

/// Download name stamped with the current time.
pub fn export_filename(extension: &str) -> String {
    export_filename_at(extension, Utc::now())
}
