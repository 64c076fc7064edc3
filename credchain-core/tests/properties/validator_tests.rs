//! Property-based tests for the private key heuristic

use credchain_core::validator::{
    bytes_look_like_private_key, looks_like_private_key, KEY_HEADERS, PREFIX_LEN,
};
use proptest::prelude::*;
use tempfile::TempDir;

fn arb_header() -> impl Strategy<Value = &'static str> {
    proptest::sample::select(KEY_HEADERS.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A header fully inside the inspected prefix is always accepted
    #[test]
    fn header_within_prefix_is_accepted(
        header in arb_header(),
        lead in "[a-z \n]{0,40}",
        tail in "[A-Za-z0-9+/=\n]{0,200}",
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key");
        std::fs::write(&path, format!("{lead}{header}{tail}")).unwrap();
        prop_assert!(looks_like_private_key(&path));
    }

    /// Text without the marker is never accepted
    #[test]
    fn text_without_marker_is_rejected(body in "[a-z0-9 \n]{1,300}") {
        prop_assert!(!bytes_look_like_private_key(body.as_bytes()));
    }

    /// A header starting past the prefix is not seen
    #[test]
    fn header_past_prefix_is_ignored(header in arb_header(), extra in 0usize..50) {
        let mut content = "x".repeat(PREFIX_LEN + extra);
        content.push_str(header);
        prop_assert!(!bytes_look_like_private_key(content.as_bytes()));
    }
}

#[test]
fn non_files_are_rejected() {
    let dir = TempDir::new().unwrap();
    assert!(!looks_like_private_key(dir.path()));
    assert!(!looks_like_private_key(&dir.path().join("missing")));

    let empty = dir.path().join("empty");
    std::fs::write(&empty, b"").unwrap();
    assert!(!looks_like_private_key(&empty));
}

#[test]
fn public_keys_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("id_ed25519.pub");
    std::fs::write(&path, "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAI dev@host\n").unwrap();
    assert!(!looks_like_private_key(&path));
}
