//! Laws of canonical path normalisation.

use hottest_core::loader::strip_comments;
use hottest_core::CanonicalPath;
use proptest::prelude::*;
use serde_json::json;

fn raw_path() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof!["[a-z0-9_-]{1,6}", Just(String::new())], 0..6)
        .prop_map(|parts| parts.join("/"))
}

proptest! {
    #[test]
    fn canonicalisation_is_idempotent(raw in raw_path()) {
        let once = CanonicalPath::new(&raw);
        let twice = CanonicalPath::new(once.as_str());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn join_is_associative(root in raw_path(), a in raw_path(), b in raw_path()) {
        let root = CanonicalPath::new(&root);
        let left = root.join(&a).join(&b);
        let right = root.join(CanonicalPath::new(&a).join(&b).as_str());
        prop_assert_eq!(left, right);
    }

    #[test]
    fn no_empty_segments_survive(raw in raw_path()) {
        let p = CanonicalPath::new(&raw);
        prop_assert!(!p.as_str().starts_with('/'));
        prop_assert!(!p.as_str().ends_with('/'));
        prop_assert!(!p.as_str().contains("//"));
    }
}

#[test]
fn comment_stripping_is_idempotent() {
    let doc = json!({
        "#|comment": 1,
        "a": [ { "#|comment": "x", "b": { "#|comment": [] } } ]
    });
    let once = strip_comments(&doc);
    assert_eq!(strip_comments(&once), once);
}
