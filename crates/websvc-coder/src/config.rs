//! Coder configuration.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Settings a coder starts out with.
///
/// All of them can also be changed on a coder afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct CoderConfig {
    /// Suppress pretty-printing of built documents.
    #[builder(default = false)]
    pub compact: bool,
    /// Log every built and parsed document at debug level.
    #[builder(default = false)]
    pub debug: bool,
    /// Offset of the coder's time zone in seconds east of UTC.
    #[builder(default = 0)]
    pub utc_offset_seconds: i32,
    /// Resolve namespace prefixes while parsing.
    #[builder(default = true)]
    pub namespace_aware: bool,
}

impl Default for CoderConfig {
    fn default() -> Self {
        Self {
            compact: false,
            debug: false,
            utc_offset_seconds: 0,
            namespace_aware: true,
        }
    }
}

impl CoderConfig {
    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// | variable | field |
    /// |---|---|
    /// | `WEBSVC_COMPACT` | `compact` |
    /// | `WEBSVC_DEBUG` | `debug` |
    /// | `WEBSVC_UTC_OFFSET` | `utc_offset_seconds` |
    /// | `WEBSVC_NAMESPACE_AWARE` | `namespace_aware` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from `lookup`, which maps a `WEBSVC_*` variable name
    /// to its value.
    ///
    /// Unparsable offsets are logged and ignored.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("WEBSVC_COMPACT") {
            config.compact = parse_bool(&v);
        }
        if let Some(v) = lookup("WEBSVC_DEBUG") {
            config.debug = parse_bool(&v);
        }
        if let Some(v) = lookup("WEBSVC_UTC_OFFSET") {
            match v.trim().parse::<i32>() {
                Ok(n) => config.utc_offset_seconds = n,
                Err(_) => tracing::warn!(value = %v, "ignoring invalid WEBSVC_UTC_OFFSET"),
            }
        }
        if let Some(v) = lookup("WEBSVC_NAMESPACE_AWARE") {
            config.namespace_aware = parse_bool(&v);
        }

        config
    }

    /// The configured time zone, or `None` if the offset is out of range.
    #[must_use]
    pub fn time_zone(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_seconds)
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
