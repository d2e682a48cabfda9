//! Content descriptors: the caller-supplied metadata a CID is extracted from.
//!
//! The shape follows the OCI image-spec descriptor so layer descriptors from a
//! manifest deserialize directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An OCI-style content descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDescriptor {
    /// Media type of the referenced content.
    #[serde(default)]
    pub media_type: String,
    /// Digest of the referenced content (`algorithm:hex`).
    #[serde(default)]
    pub digest: String,
    /// Size in bytes as recorded by the producer.
    #[serde(default)]
    pub size: u64,
    /// Alternate locations of the content.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    /// Arbitrary metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ContentDescriptor {
    /// Create a descriptor with the given media type, digest and size.
    pub fn new(media_type: impl Into<String>, digest: impl Into<String>, size: u64) -> Self {
        Self {
            media_type: media_type.into(),
            digest: digest.into(),
            size,
            ..Self::default()
        }
    }

    /// Add an annotation.
    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Add an alternate location.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.urls.push(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_from_oci_json() {
        let json = r#"{
            "mediaType": "application/vnd.oci.image.layer.v1.tar+gzip",
            "digest": "sha256:6c3c624b58dbbcd3c0dd82b4c53f04194d1247c6eebdaab7c610cf7d66709b3b",
            "size": 1000,
            "urls": ["ipfs://bafy123"],
            "annotations": {"org.opencontainers.image.title": "layer"}
        }"#;
        let desc: ContentDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(desc.size, 1000);
        assert_eq!(desc.urls, vec!["ipfs://bafy123".to_string()]);
        assert_eq!(desc.annotations["org.opencontainers.image.title"], "layer");
    }

    #[test]
    fn test_descriptor_builder() {
        let desc = ContentDescriptor::new("application/octet-stream", "sha256:00", 7)
            .annotation("k", "v")
            .url("ipfs://bafy123");
        assert_eq!(desc.annotations.len(), 1);
        assert_eq!(desc.urls.len(), 1);

        let json = serde_json::to_string(&ContentDescriptor::new("t", "d", 1)).unwrap();
        assert!(!json.contains("annotations"));
        assert!(json.contains("\"mediaType\""));
    }
}
