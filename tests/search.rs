mod common;

use common::{document, line, page, simple_document, word, Fixture};
use ocrdex::{BBox, ErrorKind, INVALID_COORD};

fn quick_brown_fox() -> String {
    let first = line(
        Some((0, 100, 80, 120)),
        &[
            word("the", Some((0, 10))),
            word("quick", Some((12, 30))),
            word("brown", Some((32, 60))),
            word("fox", Some((62, 80))),
        ],
    );
    let second = line(
        Some((0, 300, 60, 320)),
        &[word("fox", Some((0, 25))), word("jumps", Some((30, 60)))],
    );
    document(&[page("page_1", &[first]), page("page_2", &[second])])
}

#[test]
fn brown_has_box_and_context() {
    let fx = Fixture::new();
    let id = fx.ingest("book.html", &quick_brown_fox());
    assert_eq!(id, "book");

    let hits = fx.db.search("brown", "book", None).unwrap();
    assert_eq!(hits.len(), 1);

    let hit = &hits[0];
    assert_eq!(hit.page_id, "page_1");
    assert_eq!(hit.matched_text, "brown");
    assert_eq!(hit.before, "...the quick");
    assert_eq!(hit.after, "fox...");
    assert_eq!(hit.bbox(), BBox { x: 32, y: 100, width: 28, height: 20 });
    assert_eq!(hit.words[0].sequence_pos, 2);
}

#[test]
fn hits_are_ordered_by_score() {
    let fx = Fixture::new();
    fx.ingest("book.html", &quick_brown_fox());

    let hits = fx.db.search("fox", "book", None).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].score >= hits[1].score);

    let mut pages: Vec<&str> = hits.iter().map(|h| h.page_id.as_str()).collect();
    pages.sort();
    assert_eq!(pages, vec!["page_1", "page_2"]);

    let limited = fx.db.search("fox", "book", Some(1)).unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].page_id, hits[0].page_id);
}

#[test]
fn line_without_bbox_reports_sentinels() {
    let fx = Fixture::new();
    let body = document(&[page(
        "page_1",
        &[line(None, &[word("ghostly", None), word("writing", None)])],
    )]);
    fx.ingest("ghost.html", &body);

    let hits = fx.db.search("ghostly", "ghost", None).unwrap();
    assert_eq!(hits.len(), 1);

    let word = &hits[0].words[0];
    assert_eq!(word.text, "ghostly");
    assert_eq!((word.x, word.y, word.width, word.height), (INVALID_COORD, INVALID_COORD, INVALID_COORD, INVALID_COORD));
    assert!(!hits[0].has_geometry());
    assert_eq!(hits[0].bbox(), BBox::UNKNOWN);

    let lines = fx.db.get_lines("ghost", "page_1");
    assert_eq!(lines[0].text, "ghostly writing");
    assert_eq!(lines[0].x, INVALID_COORD);
}

#[test]
fn wordless_line_keeps_later_boxes_aligned() {
    let fx = Fixture::new();
    let body = document(&[page(
        "page_1",
        &[
            line(Some((0, 100, 120, 120)), &["alpha beta".to_string()]),
            line(
                Some((0, 300, 120, 320)),
                &[word("gamma", Some((10, 60))), word("delta", Some((70, 120)))],
            ),
        ],
    )]);
    fx.ingest("mixed.html", &body);

    let hits = fx.db.search("beta", "mixed", None).unwrap();
    assert_eq!(hits[0].words.len(), 1);
    let beta = &hits[0].words[0];
    assert_eq!((beta.text.as_str(), beta.sequence_pos, beta.line_position), ("beta", 1, 0));
    assert_eq!((beta.x, beta.width), (INVALID_COORD, INVALID_COORD));
    assert_eq!((beta.y, beta.height), (100, 20));

    let hits = fx.db.search("gamma", "mixed", None).unwrap();
    assert_eq!(hits[0].words.len(), 1);
    assert_eq!(hits[0].words[0].text, "gamma");
    assert_eq!(hits[0].bbox(), BBox { x: 10, y: 300, width: 50, height: 20 });

    let hits = fx.db.search("delta", "mixed", None).unwrap();
    assert_eq!(hits[0].bbox(), BBox { x: 70, y: 300, width: 50, height: 20 });
}

#[test]
fn single_occurrence_yields_single_span() {
    let fx = Fixture::new();
    let body = simple_document(&[
        ("page_1", &["a harbour at dusk", "gulls over the water"]),
        ("page_2", &["nothing to see"]),
    ]);
    fx.ingest("harbour.html", &body);

    let hits = fx.db.search("gulls", "harbour", None).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].matched_text, "gulls");
    assert_eq!(hits[0].words.len(), 1);

    let bbox = hits[0].bbox();
    assert!(bbox.is_known());
    assert!(bbox.area() > 0);
    assert_eq!(hits[0].words[0].line_position, 1);
}

#[test]
fn phrase_spans_cover_each_word() {
    let fx = Fixture::new();
    let body = simple_document(&[("page_1", &["we sailed to", "the old harbour", "at dawn"])]);
    fx.ingest("voyage.html", &body);

    let hits = fx.db.search("\"old harbour at\"", "voyage", None).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].matched_text, "old harbour at");

    let lines: Vec<u32> = hits[0].words.iter().map(|w| w.line_position).collect();
    assert_eq!(lines, vec![1, 1, 2]);
}

#[test]
fn boolean_and_prefix_queries() {
    let fx = Fixture::new();
    let body = simple_document(&[
        ("page_1", &["red apples and pears"]),
        ("page_2", &["green apples only"]),
        ("page_3", &["pearl necklace"]),
    ]);
    fx.ingest("fruit.html", &body);

    let pages = |query: &str| -> Vec<String> {
        let mut ids: Vec<String> = fx.db.search_pages(query, "fruit", None)
            .unwrap()
            .into_iter()
            .map(|p| p.page_id)
            .collect();
        ids.sort();
        ids
    };

    assert_eq!(pages("apples"), vec!["page_1", "page_2"]);
    assert_eq!(pages("apples NOT green"), vec!["page_1"]);
    assert_eq!(pages("green OR necklace"), vec!["page_2", "page_3"]);
    assert_eq!(pages("pear*"), vec!["page_1", "page_3"]);

    let matched = fx.db.search_pages("green apples", "fruit", None).unwrap();
    assert_eq!(matched[0].highlighted_text, "<hi>green</hi> <hi>apples</hi> only");
}

#[test]
fn search_is_scoped_to_document() {
    let fx = Fixture::new();
    fx.ingest("one.html", &simple_document(&[("page_1", &["shared words here"])]));
    fx.ingest("two.html", &simple_document(&[("page_1", &["shared words there"])]));

    let hits = fx.db.search("shared", "one", None).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].after, "words here...");

    assert!(fx.db.search("shared", "missing", None).unwrap().is_empty());
}

#[test]
fn malformed_query_is_an_error() {
    let fx = Fixture::new();
    fx.ingest("book.html", &quick_brown_fox());

    for query in ["", "\"brown", "(brown", "brown AND", "*"] {
        let err = fx.db.search(query, "book", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query, "{}", query);
    }
}
