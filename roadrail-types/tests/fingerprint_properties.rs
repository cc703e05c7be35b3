//! Property-based tests for fingerprint determinism.

use proptest::prelude::*;
use roadrail_types::Fingerprint;

proptest! {
    /// Identical content always hashes to the same digest.
    #[test]
    fn identical_content_same_digest(bytes in prop::collection::vec(any::<u8>(), 0..512), ts in any::<i64>()) {
        let a = Fingerprint::of_bytes(&bytes, ts);
        let b = Fingerprint::of_bytes(&bytes, ts);
        prop_assert!(a.same_content(&b));
        prop_assert_eq!(a, b);
    }

    /// Appending a byte always changes the digest.
    #[test]
    fn extended_content_changes_digest(bytes in prop::collection::vec(any::<u8>(), 0..512), extra in any::<u8>()) {
        let a = Fingerprint::of_bytes(&bytes, 0);
        let mut longer = bytes.clone();
        longer.push(extra);
        let b = Fingerprint::of_bytes(&longer, 0);
        prop_assert!(!a.same_content(&b));
    }
}
