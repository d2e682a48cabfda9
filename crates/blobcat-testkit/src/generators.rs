//! Proptest generators for property-based testing.

use proptest::prelude::*;

use blobcat_core::ContentId;
use blobcat_store::Fault;

/// Generate a valid CID-shaped string.
pub fn content_id() -> impl Strategy<Value = ContentId> {
    "bafy[a-z2-7]{8,52}".prop_map(|s| ContentId::parse(s).expect("generated cid is valid"))
}

/// Generate blob content of at most `max_len` bytes.
pub fn content(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate up to `max` lock-contention faults, each delivering at most
/// `max_after` bytes before the read is cut short.
pub fn lock_faults(max: usize, max_after: u64) -> impl Strategy<Value = Vec<Fault>> {
    prop::collection::vec((0..=max_after).prop_map(Fault::lock_contention), 0..=max)
}

/// A blob and an in-bounds range of it.
#[derive(Debug, Clone)]
pub struct RangeParams {
    pub content: Vec<u8>,
    pub offset: u64,
    pub length: u64,
}

/// Generate a blob of at most `max_len` bytes and a range within it.
pub fn range_params(max_len: usize) -> impl Strategy<Value = RangeParams> {
    content(max_len).prop_flat_map(|content| {
        let len = content.len() as u64;
        (Just(content), 0..=len).prop_flat_map(move |(content, offset)| {
            (Just(content), Just(offset), 0..=len - offset).prop_map(
                |(content, offset, length)| RangeParams {
                    content,
                    offset,
                    length,
                },
            )
        })
    })
}

impl Arbitrary for RangeParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        range_params(4096).boxed()
    }
}
