//! Key/value views over transport metadata

use std::collections::BTreeMap;
use tonic::metadata::{Ascii, AsciiMetadataValue, MetadataKey, MetadataMap};
use tracing::warn;

/// Case-insensitive string dictionary an [`crate::Identity`] is read from
/// and written to
///
/// `set_value` fully replaces any prior value for the key; carriers never
/// append.
pub trait MetadataCarrier {
    /// First value stored under `key`, if it is valid text
    fn get_value(&self, key: &str) -> Option<&str>;

    /// Replace the value stored under `key`
    ///
    /// Values the carrier cannot represent (non-ASCII text in gRPC
    /// metadata) are dropped with a warning, so such identities do not
    /// round-trip.
    fn set_value(&mut self, key: &str, value: &str);
}

impl MetadataCarrier for MetadataMap {
    fn get_value(&self, key: &str) -> Option<&str> {
        self.get(key.to_ascii_lowercase().as_str())
            .and_then(|v| v.to_str().ok())
    }

    fn set_value(&mut self, key: &str, value: &str) {
        let key = match MetadataKey::<Ascii>::from_bytes(key.to_ascii_lowercase().as_bytes()) {
            Ok(key) => key,
            Err(e) => {
                warn!(key, error = %e, "Invalid metadata key");
                return;
            }
        };
        match AsciiMetadataValue::try_from(value) {
            Ok(value) => {
                self.insert(key, value);
            }
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "Metadata value is not valid ASCII, skipping");
            }
        }
    }
}

impl MetadataCarrier for http::HeaderMap {
    fn get_value(&self, key: &str) -> Option<&str> {
        self.get(key.to_ascii_lowercase().as_str())
            .and_then(|v| v.to_str().ok())
    }

    fn set_value(&mut self, key: &str, value: &str) {
        let name = match http::header::HeaderName::from_bytes(key.to_ascii_lowercase().as_bytes()) {
            Ok(name) => name,
            Err(e) => {
                warn!(key, error = %e, "Invalid header name");
                return;
            }
        };
        match http::HeaderValue::from_str(value) {
            Ok(value) => {
                self.insert(name, value);
            }
            Err(e) => {
                warn!(key = name.as_str(), error = %e, "Header value is not valid, skipping");
            }
        }
    }
}

/// Plain dictionary; keys are stored lowercase
impl MetadataCarrier for BTreeMap<String, String> {
    fn get_value(&self, key: &str) -> Option<&str> {
        self.get(&key.to_ascii_lowercase())
            .or_else(|| {
                self.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }

    fn set_value(&mut self, key: &str, value: &str) {
        self.retain(|k, _| !k.eq_ignore_ascii_case(key));
        self.insert(key.to_ascii_lowercase(), value.to_string());
    }
}
