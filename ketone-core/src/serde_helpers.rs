//! Serde helpers for values commonly found in realtime-database documents.
//!
//! Use these with `#[serde(deserialize_with = "...")]` on fixed-schema records.

/// Deserialize integer milliseconds since the Unix epoch as a `SystemTime`.
///
/// Negative values are instants before the epoch.
pub mod timestamp_millis {
    use serde::de::{Error, Unexpected};
    use serde::{Deserialize, Deserializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = i64::deserialize(deserializer)?;
        let offset = Duration::from_millis(millis.unsigned_abs());
        let instant = if millis >= 0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        };
        instant.ok_or_else(|| {
            D::Error::invalid_value(Unexpected::Signed(millis), &"a representable timestamp")
        })
    }
}

/// Like [`timestamp_millis`], for optional fields: `null` or a missing field
/// (with `#[serde(default)]`) decodes as `None`.
pub mod option_timestamp_millis {
    use serde::{Deserialize, Deserializer};
    use std::time::SystemTime;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Millis(#[serde(deserialize_with = "super::timestamp_millis::deserialize")] SystemTime);

        Ok(Option::<Millis>::deserialize(deserializer)?.map(|Millis(t)| t))
    }
}
