mod common;

use common::{simple_document, Fixture};
use ocrdex::{ErrorKind, TermCount};

fn term(term: &str, count: u64) -> TermCount {
    TermCount { term: term.to_string(), count }
}

fn garage() -> String {
    simple_document(&[
        ("page_1", &["car cart car", "carbon"]),
        ("page_2", &["car cart dog"]),
    ])
}

#[test]
fn ordered_by_frequency() {
    let fx = Fixture::new();
    fx.ingest("garage.html", &garage());

    let terms = fx.db.autocomplete("car", "garage", 1).unwrap();
    assert_eq!(terms, vec![term("car", 3), term("cart", 2), term("carbon", 1)]);
}

#[test]
fn min_count_excludes_lower_frequencies() {
    let fx = Fixture::new();
    fx.ingest("garage.html", &garage());

    let all = fx.db.autocomplete("c", "garage", 1).unwrap();
    for t in &all {
        let above = fx.db.autocomplete("c", "garage", t.count + 1).unwrap();
        assert!(above.iter().all(|other| other.term != t.term), "{:?}", t);
    }
    assert_eq!(fx.db.autocomplete("car", "garage", 2).unwrap(), vec![term("car", 3), term("cart", 2)]);
}

#[test]
fn persisted_threshold_drops_rare_terms() {
    let fx = Fixture::with_config(|c| c.autocomplete_min_count = 2);
    fx.ingest("garage.html", &garage());

    let terms = fx.db.autocomplete("car", "garage", 1).unwrap();
    assert_eq!(terms, vec![term("car", 3), term("cart", 2)]);
}

#[test]
fn counts_are_local_to_the_document() {
    let fx = Fixture::new();
    fx.ingest("first.html", &simple_document(&[("page_1", &["car car car car"])]));
    fx.ingest("garage.html", &garage());

    assert_eq!(fx.db.autocomplete("car", "first", 1).unwrap(), vec![term("car", 4)]);
    assert_eq!(fx.db.autocomplete("car", "garage", 1).unwrap()[0], term("car", 3));
}

#[test]
fn prefix_is_normalized() {
    let fx = Fixture::new();
    fx.ingest("garage.html", &garage());

    assert_eq!(fx.db.autocomplete("CÁR", "garage", 1).unwrap().len(), 3);
    assert!(fx.db.autocomplete("car", "missing", 1).unwrap().is_empty());
    assert!(fx.db.autocomplete("zebra", "garage", 1).unwrap().is_empty());
    assert_eq!(fx.db.autocomplete("  ", "garage", 1).unwrap_err().kind(), ErrorKind::InvalidArgument);
}

#[test]
fn reingest_invalidates_cached_table() {
    let fx = Fixture::new();
    fx.ingest("garage.html", &garage());
    assert_eq!(fx.db.autocomplete("dog", "garage", 1).unwrap(), vec![term("dog", 1)]);
    assert_eq!(fx.db.autocomplete("dog", "garage", 1).unwrap(), vec![term("dog", 1)]);
    assert_eq!(fx.db.stats().lexicon_cache.hit_count, 1);

    fx.ingest("garage.html", &simple_document(&[("page_1", &["dog dog dog"])]));
    assert_eq!(fx.db.autocomplete("dog", "garage", 1).unwrap(), vec![term("dog", 3)]);
    assert!(fx.db.autocomplete("car", "garage", 1).unwrap().is_empty());
}
