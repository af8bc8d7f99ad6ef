//! Integration tests for the mutation catalog.

use desyncx::catalog;

#[test]
fn build_returns_the_full_854_entry_catalog() {
    let cat = catalog::build();
    assert_eq!(cat.len(), 854);
}

#[test]
fn every_entry_hosts_and_renders_for_a_concrete_target() {
    let cat = catalog::build();
    for (name, template) in &cat {
        let mut p = template.clone();
        p.host = "victim.internal".to_string();
        p.method = "GET".to_string();
        let rendered = p.render();
        assert!(!rendered.is_empty(), "{name} rendered nothing");
        assert!(
            rendered.windows(b"victim.internal".len()).any(|w| w == b"victim.internal"),
            "{name} missing substituted host"
        );
    }
}

#[test]
fn named_gadgets_are_present_among_the_catalog() {
    let cat = catalog::build();
    let names: Vec<&str> = cat.iter().map(|(n, _)| n.as_str()).collect();
    for expected in ["tabprefix1", "smashed", "spaceFF", "revdualchunk", "x-nout"] {
        assert!(names.contains(&expected), "missing named gadget {expected}");
    }
}
