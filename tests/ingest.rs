mod common;

use std::fs;
use common::{simple_document, Fixture};
use ocrdex::storage::file_lock::FileLock;
use ocrdex::storage::segment::SegmentId;
use ocrdex::ErrorKind;

fn two_pages() -> String {
    simple_document(&[
        ("page_1", &["call me ishmael", "some years ago"]),
        ("page_2", &["never mind how long", "precisely"]),
    ])
}

#[test]
fn metadata_reads() {
    let fx = Fixture::new();
    let path = fx.write("moby.html", &two_pages());
    let id = fx.db.ingest_with_metadata(&path, Some(serde_json::json!({"author": "Melville"}))).unwrap();
    assert_eq!(id, "moby");

    let document = fx.db.get_document("moby").unwrap();
    assert_eq!(document.metadata, Some(serde_json::json!({"author": "Melville"})));
    assert_eq!(document.filename, path.to_string_lossy());

    let pages = fx.db.get_pages("moby");
    assert_eq!(pages.len(), 2);
    assert_eq!((pages[0].width, pages[0].height), (1200, 1800));

    let image = fx.db.get_image_path("moby", "page_2").unwrap();
    assert!(image.is_absolute());
    assert!(image.ends_with("page_2.png"));

    let lines: Vec<String> = fx.db.get_lines("moby", "page_1").into_iter().map(|l| l.text).collect();
    assert_eq!(lines, vec!["call me ishmael", "some years ago"]);
    assert_eq!(fx.db.get_lines("moby", "page_1")[1].y, 130);

    assert!(fx.db.get_document("nobody").is_none());
    assert!(fx.db.get_pages("nobody").is_empty());
    assert!(fx.db.get_page("moby", "page_9").is_none());
    assert!(fx.db.get_lines("moby", "page_9").is_empty());
}

#[test]
fn google_books_layout_uses_directory_name() {
    let fx = Fixture::new();
    let id = fx.ingest("abc123/hOCR.html", &two_pages());
    assert_eq!(id, "abc123");
    assert_eq!(fx.db.document_ids(), vec!["abc123".to_string()]);
}

#[test]
fn reingest_replaces_without_duplicates() {
    let fx = Fixture::new();
    fx.ingest("moby.html", &two_pages());
    let first_hits = fx.db.search("years", "moby", None).unwrap();
    let first_stats = fx.db.stats();

    fx.ingest("moby.html", &two_pages());
    let stats = fx.db.stats();

    assert_eq!(fx.db.document_ids().len(), 1);
    assert_eq!(stats.pages, first_stats.pages);
    assert_eq!(stats.lines, first_stats.lines);
    assert_eq!(stats.index_entries, first_stats.index_entries);
    assert_eq!(stats.total_tokens, first_stats.total_tokens);
    assert_eq!(fx.db.search("years", "moby", None).unwrap(), first_hits);

    // One segment per document on disk
    assert_eq!(fx.db.storage().segment_files().unwrap().len(), 1);
}

#[test]
fn failing_reingest_keeps_original() {
    let fx = Fixture::new();
    fx.ingest("moby.html", &two_pages());

    let segments_dir = fx.db.storage().segments_dir.clone();
    fs::rename(&segments_dir, fx.dir.path().join("parked")).unwrap();
    fs::write(&segments_dir, b"blocked").unwrap();

    let path = fx.write("moby.html", &simple_document(&[("page_1", &["a whale of a tale"])]));
    let err = fx.db.ingest(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ingest);

    let hits = fx.db.search("ishmael", "moby", None).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(fx.db.search("whale", "moby", None).unwrap().is_empty());
    assert_eq!(fx.db.get_pages("moby").len(), 2);
}

#[test]
fn parse_errors_are_not_ingest_errors() {
    let fx = Fixture::new();
    let path = fx.write("plain.html", "<html><body><p>no ocr here</p></body></html>");
    assert_eq!(fx.db.ingest(&path).unwrap_err().kind(), ErrorKind::Parse);

    let missing = fx.dir.path().join("docs/missing.html");
    assert_eq!(fx.db.ingest(&missing).unwrap_err().kind(), ErrorKind::Parse);
    assert!(fx.db.document_ids().is_empty());
}

#[test]
fn second_writer_fails_fast() {
    let fx = Fixture::new();
    let path = fx.write("moby.html", &two_pages());

    let held = FileLock::acquire(fx.db.storage()).unwrap();
    let err = fx.db.ingest(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ingest);
    assert!(fx.db.document_ids().is_empty());

    drop(held);
    assert_eq!(fx.db.ingest(&path).unwrap(), "moby");
}

#[test]
fn batch_reports_each_outcome() {
    let fx = Fixture::with_config(|c| c.ingest_threads = 2);
    let paths = vec![
        fx.write("one.html", &two_pages()),
        fx.write("bad.html", "<html><body>nothing</body></html>"),
        fx.dir.path().join("docs/absent.html"),
        fx.write("two.html", &simple_document(&[("page_1", &["second book"])])),
    ];

    let outcomes = fx.db.ingest_batch(&paths);
    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes[0].result.as_ref().unwrap(), "one");
    assert_eq!(outcomes[1].result.as_ref().unwrap_err().kind(), ErrorKind::Parse);
    assert_eq!(outcomes[2].result.as_ref().unwrap_err().kind(), ErrorKind::Parse);
    assert_eq!(outcomes[3].result.as_ref().unwrap(), "two");
    assert_eq!(outcomes[3].path, paths[3]);

    assert_eq!(fx.db.document_ids(), vec!["one".to_string(), "two".to_string()]);
}

#[test]
fn batch_commits_in_chunks() {
    let fx = Fixture::with_config(|c| {
        c.ingest_threads = 1;
        c.ingest_chunk_size = 2;
    });
    let mut paths = Vec::new();
    for i in 0..5 {
        let name = format!("book{}.html", i);
        if i == 2 {
            paths.push(fx.write(&name, "<html><body>empty</body></html>"));
        } else {
            paths.push(fx.write(&name, &simple_document(&[("page_1", &["volume number"])])));
        }
    }

    let outcomes = fx.db.ingest_batch(&paths);
    let results: Vec<Option<String>> = outcomes.iter().map(|o| o.result.as_ref().ok().cloned()).collect();
    assert_eq!(results, vec![
        Some("book0".to_string()),
        Some("book1".to_string()),
        None,
        Some("book3".to_string()),
        Some("book4".to_string()),
    ]);
    for (outcome, path) in outcomes.iter().zip(&paths) {
        assert_eq!(&outcome.path, path);
    }
    assert_eq!(fx.db.document_ids().len(), 4);
    assert_eq!(fx.db.search("volume", "book4", None).unwrap().len(), 1);
}

#[test]
fn reopen_restores_store() {
    let fx = Fixture::new();
    fx.ingest("moby.html", &two_pages());
    fx.ingest("other.html", &simple_document(&[("page_1", &["some other years"])]));

    let hits = fx.db.search("years", "moby", None).unwrap();
    let terms = fx.db.autocomplete("ye", "moby", 1).unwrap();

    let fx = fx.reopen();
    assert_eq!(fx.db.document_ids(), vec!["moby".to_string(), "other".to_string()]);
    assert_eq!(fx.db.search("years", "moby", None).unwrap(), hits);
    assert_eq!(fx.db.autocomplete("ye", "moby", 1).unwrap(), terms);
    assert_eq!(fx.db.stats().pages, 3);
}

#[test]
fn reopen_removes_orphaned_segments() {
    let fx = Fixture::new();
    fx.ingest("moby.html", &two_pages());

    let orphan = fx.db.storage().segment_path(&SegmentId::new());
    fs::write(&orphan, b"half written").unwrap();

    let fx = fx.reopen();
    assert!(!orphan.exists());
    assert_eq!(fx.db.storage().segment_files().unwrap().len(), 1);
    assert_eq!(fx.db.search("ishmael", "moby", None).unwrap().len(), 1);
}

#[test]
fn unreadable_segment_is_skipped_on_open() {
    let fx = Fixture::new();
    fx.ingest("moby.html", &two_pages());
    fx.ingest("other.html", &simple_document(&[("page_1", &["still here"])]));

    let catalog = ocrdex::storage::catalog::Catalog::load(fx.db.storage()).unwrap();
    let segment = catalog.segment_of("moby").unwrap();
    fs::write(fx.db.storage().segment_path(&segment), b"garbage").unwrap();

    let fx = fx.reopen();
    assert_eq!(fx.db.document_ids(), vec!["other".to_string()]);
    assert_eq!(fx.db.search("still", "other", None).unwrap().len(), 1);
}
