//! # Call Metadata
//!
//! Ordered header name/value pairs attached to a call when it is started. The client
//! converts them into a `tonic::metadata::MetadataMap` (see
//! [`crate::grpc::client`]); the dispatcher only reads them back for logging.
use tonic::metadata::MetadataMap;

/// Header carrying a free-form tag, sent on every demo call.
pub const CUSTOM_HEADER: &str = "Custom-Header";
/// Header carrying the caller's address as the caller sees it.
pub const CLIENT_IP: &str = "Client-IP";
/// Header naming the driver that issued the call.
pub const CALL_FROM: &str = "CallFrom";

/// Ordered, read-only mapping of header names to string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallMetadata {
    entries: Vec<(String, String)>,
}

impl CallMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three headers every demo driver sends, tagged with the driver's name.
    pub fn uniform(call_from: &str) -> Self {
        Self::new()
            .with(CUSTOM_HEADER, "custom-test-metadata")
            .with(CLIENT_IP, "127.0.0.1")
            .with(CALL_FROM, call_from)
    }

    /// Appends a header. Order of insertion is preserved.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl IntoIterator for CallMetadata {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Reads one of the demo headers from a received call.
///
/// Header names travel lowercased on the wire, so lookups are case-insensitive.
/// Values that are not printable ASCII are reported as absent.
pub fn header<'a>(metadata: &'a MetadataMap, name: &str) -> Option<&'a str> {
    metadata
        .get(name.to_ascii_lowercase().as_str())
        .and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::metadata::MetadataValue;

    #[test]
    fn uniform_metadata_keeps_insertion_order() {
        let metadata = CallMetadata::uniform("unaryRPC");
        let keys: Vec<_> = metadata.iter().map(|(k, _)| k).collect();

        assert_eq!(keys, vec![CUSTOM_HEADER, CLIENT_IP, CALL_FROM]);
        assert_eq!(metadata.iter().last(), Some((CALL_FROM, "unaryRPC")));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let mut map = MetadataMap::new();
        map.insert("callfrom", MetadataValue::from_static("serverStream"));

        assert_eq!(header(&map, CALL_FROM), Some("serverStream"));
        assert_eq!(header(&map, CLIENT_IP), None);
    }
}
