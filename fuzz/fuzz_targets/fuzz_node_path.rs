//! Fuzz target for node path parsing.
//!
//! Parsing must never panic, and every parsed path must be normalised:
//! re-parsing it is a no-op and walking its ancestors ends at the root.

#![no_main]

use libfuzzer_sys::fuzz_target;
use replication_orchestrator::tree::NodePath;

fuzz_target!(|raw: &str| {
    let Some(path) = NodePath::parse(raw) else {
        return;
    };

    // Normalised form is stable
    assert_eq!(NodePath::parse(path.as_str()).as_ref(), Some(&path));
    assert!(!path.as_str().contains("//"));

    let ancestors = path.ancestors();
    assert_eq!(ancestors.len(), path.depth());
    if let Some(last) = ancestors.last() {
        assert!(last.is_root());
        assert!(last.is_ancestor_of(&path));
    }
    for ancestor in &ancestors {
        assert!(ancestor.is_ancestor_of(&path));
        assert!(!path.is_ancestor_of(ancestor));
    }

    if !path.is_root() {
        let name = path.name().to_string();
        let parent = path.parent().unwrap();
        assert_eq!(parent.child(&name), path);
    }
});
