//! Cross-format integration tests for the websvc coders.
//!
//! Every test builds documents with one coder and parses them back, checking
//! the behaviour the formats share: value round trips, parameter order, fault
//! scoping and SOAP body shaping.
//!
//! Run them with:
//! ```text
//! cargo test -p websvc-integration
//! ```
//!
//! Set `RUST_LOG=websvc_coder=debug` and enable the coder debug flag to see the
//! documents involved.

use std::sync::Once;

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use websvc_coder::{CoderConfig, Format, RpcCoder, SoapCoder, SoapUse};
use websvc_model::{Struct, Value};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Configuration for test coders, honouring the `WEBSVC_*` environment.
fn config(compact: bool) -> CoderConfig {
    CoderConfig {
        compact,
        ..CoderConfig::from_env()
    }
}

/// Create a coder for `format`.
#[must_use]
pub fn coder(format: Format, compact: bool) -> Box<dyn RpcCoder> {
    init_tracing();
    tracing::debug!(%format, compact, "creating coder");
    format.coder(&config(compact))
}

/// Create a SOAP coder with encoded use.
#[must_use]
pub fn encoded_soap_coder(compact: bool) -> SoapCoder {
    init_tracing();
    let mut coder = SoapCoder::new(&config(compact));
    coder.set_soap_use(SoapUse::Encoded);
    coder
}

/// A fixed instant with whole seconds.
#[must_use]
pub fn sample_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 58)
        .single()
        .unwrap_or_else(|| panic!("sample date is valid"))
}

/// Parameters covering every scalar kind that survives XML round trips.
#[must_use]
pub fn sample_parameters() -> Struct {
    Struct::ordered([
        ("name", Value::from("Zoë <admin> & co")),
        ("count", Value::Int(42)),
        ("ratio", Value::Double(0.125)),
        ("enabled", Value::Bool(true)),
        ("disabled", Value::Bool(false)),
        ("created", Value::DateTime(sample_instant())),
        ("payload", Value::Binary(Bytes::from_static(b"\x00\x01\x02binary\xff"))),
        (
            "tags",
            Value::Array(vec![Value::from("a"), Value::from("b"), Value::from("c")]),
        ),
        (
            "owner",
            Value::Struct(Struct::ordered([
                ("id", Value::Int(7)),
                ("email", Value::from("o@example.com")),
            ])),
        ),
    ])
}

/// Owned field names.
#[must_use]
pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_owned()).collect()
}

mod test_fault;
mod test_order;
mod test_round_trip;
mod test_soap;
mod test_xmlrpc;
