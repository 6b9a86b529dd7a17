//! Roster TTL encoding for the config file
//!
//! The TTL is written back as humantime text ("5m") and read from either
//! that form or a bare number of seconds.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::{fmt, time::Duration};

/// `#[serde(with = ...)]` module for `roster.ttl`
pub mod duration {
    use super::*;

    pub fn serialize<S>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&humantime::format_duration(*ttl))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TtlVisitor;

        impl<'de> Visitor<'de> for TtlVisitor {
            type Value = Duration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a roster TTL like \"10m\" or a whole number of seconds")
            }

            fn visit_u64<E>(self, seconds: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Duration::from_secs(seconds))
            }

            fn visit_i64<E>(self, seconds: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(seconds)
                    .map(Duration::from_secs)
                    .map_err(|_| de::Error::invalid_value(de::Unexpected::Signed(seconds), &self))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                humantime::parse_duration(value)
                    .map_err(|e| de::Error::custom(format_args!("roster TTL {value:?}: {e}")))
            }
        }

        deserializer.deserialize_any(TtlVisitor)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super::duration")]
        ttl: Duration,
    }

    #[test]
    fn test_parses_humantime_and_seconds() {
        let parsed: Wrapper = toml::from_str("ttl = \"5m\"").unwrap();
        assert_eq!(parsed.ttl, Duration::from_secs(300));

        let parsed: Wrapper = toml::from_str("ttl = 90").unwrap();
        assert_eq!(parsed.ttl, Duration::from_secs(90));
    }

    #[test]
    fn test_rejects_garbage_and_negative() {
        assert!(toml::from_str::<Wrapper>("ttl = \"soon\"").is_err());
        assert!(toml::from_str::<Wrapper>("ttl = -5").is_err());
    }

    #[test]
    fn test_serializes_as_humantime() {
        let text = toml::to_string(&Wrapper {
            ttl: Duration::from_secs(300),
        })
        .unwrap();
        assert_eq!(text.trim(), "ttl = \"5m\"");
    }
}
