//! Golden range-id vectors.
//!
//! Range ids are persisted by consumers as cache keys, so every
//! implementation must derive the same id for the same `(cid, offset,
//! length)`. These values are SHA-256 of `"{cid}-{offset}-{length}"`.

use blobcat_core::{ContentId, RangeId};
use serde::{Deserialize, Serialize};

/// A single golden test vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenVector {
    pub name: String,
    pub cid: String,
    pub offset: u64,
    pub length: u64,
    /// Expected range id, 64 lowercase hex characters.
    pub range_id: String,
}

fn vector(name: &str, cid: &str, offset: u64, length: u64, range_id: &str) -> GoldenVector {
    GoldenVector {
        name: name.to_string(),
        cid: cid.to_string(),
        offset,
        length,
        range_id: range_id.to_string(),
    }
}

/// All golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        vector(
            "first_half",
            "bafy123",
            0,
            500,
            "0664e89765dcab600ab9a54a7b38490dd78d9af97846680caf2f5f1c2f641395",
        ),
        vector(
            "second_half",
            "bafy123",
            500,
            500,
            "fba2c19306d38e0c790209d3ba79758ed0826b3b9dac806231f6efffa010e295",
        ),
        vector(
            "whole_blob",
            "bafy123",
            0,
            1000,
            "542b1cb8a22c2951abeca13c53ac48efa5a5b3363ba61d4663e486017e37a917",
        ),
        vector(
            "cidv0_chunk",
            "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG",
            4096,
            65536,
            "ef09b65a0dba29301829595bad9d76fc8026ee45f57f763f3f27ebac1097e9ed",
        ),
    ]
}

/// Derive the range id for a vector's inputs.
pub fn range_id_of(vector: &GoldenVector) -> String {
    let cid = ContentId::parse(vector.cid.as_str()).expect("golden cid must be valid");
    RangeId::derive(&cid, vector.offset, vector.length).to_hex()
}

/// Check every vector, returning the names of those that do not match.
pub fn verify_all_vectors() -> Result<(), Vec<String>> {
    let failed: Vec<String> = all_vectors()
        .into_iter()
        .filter(|v| range_id_of(v) != v.range_id)
        .map(|v| v.name)
        .collect();

    if failed.is_empty() {
        Ok(())
    } else {
        Err(failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_names_unique() {
        let vectors = all_vectors();
        let mut names: Vec<&str> = vectors.iter().map(|v| v.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), vectors.len());
    }

    #[test]
    fn test_vectors_json_roundtrip() {
        let json = serde_json::to_string_pretty(&all_vectors()).unwrap();
        let parsed: Vec<GoldenVector> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, all_vectors());
    }
}
