use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ocrdex::index::positional::PageGeometry;
use ocrdex::{Config, Database};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WORDS: [&str; 12] = [
    "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog",
    "harbour", "whale", "captain", "voyage",
];

/// Helper to write a random hOCR book
fn write_book(dir: &Path, name: &str, pages: usize, lines_per_page: usize) -> PathBuf {
    let mut rng = rand::thread_rng();
    let mut body = String::from("<html><body>\n");

    for p in 0..pages {
        body.push_str(&format!(
            r#"<div class="ocr_page" id="page_{:04}" title="image &quot;p{}.png&quot;; bbox 0 0 1200 1800">"#,
            p, p
        ));
        for l in 0..lines_per_page {
            let y = 40 + l as i32 * 30;
            body.push_str(&format!(r#"<span class="ocr_line" title="bbox 0 {} 1100 {}">"#, y, y + 24));
            let mut x = 0;
            for _ in 0..rng.gen_range(6..12) {
                let word = WORDS[rng.gen_range(0..WORDS.len())];
                let end = x + 12 * word.len() as i32;
                body.push_str(&format!(r#"<span class="ocrx_word" title="bbox {} {} {} {}">{}</span> "#, x, y, end, y + 24, word));
                x = end + 8;
            }
            body.push_str("</span>\n");
        }
        body.push_str("</div>\n");
    }
    body.push_str("</body></html>");

    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn open(dir: &TempDir) -> Database {
    let config = Config::with_storage_path(dir.path().join("store"));
    Database::open(config).unwrap()
}

/// Benchmark ingestion by book size
fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");
    group.sample_size(10);

    for pages in [10, 100].iter() {
        let dir = TempDir::new().unwrap();
        let path = write_book(dir.path(), "book.html", *pages, 30);
        let db = open(&dir);

        group.bench_with_input(BenchmarkId::from_parameter(pages), pages, |b, _| {
            b.iter(|| db.ingest(black_box(&path)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark query shapes against a 200 page book
fn bench_search(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = write_book(dir.path(), "book.html", 200, 30);
    let db = open(&dir);
    db.ingest(&path).unwrap();

    let mut group = c.benchmark_group("search");
    for query in ["whale", "\"quick brown\"", "harb*", "fox AND dog", "captain OR voyage", "fox NOT lazy"] {
        group.bench_with_input(BenchmarkId::from_parameter(query), query, |b, query| {
            b.iter(|| db.search(black_box(query), "book", Some(20)).unwrap());
        });
    }
    group.finish();

    c.bench_function("autocomplete", |b| {
        b.iter(|| db.autocomplete(black_box("ca"), "book", 1).unwrap());
    });
}

/// Benchmark positional blob decoding
fn bench_positional(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = write_book(dir.path(), "book.html", 1, 60);
    let db = open(&dir);
    db.ingest(&path).unwrap();

    let page = db.search_pages("the OR fox OR dog", "book", Some(1)).unwrap();
    let blob = page[0].word_infos.clone();

    c.bench_function("positional_decode", |b| {
        b.iter(|| PageGeometry::decode(black_box(&blob)).unwrap());
    });
}

criterion_group!(benches, bench_ingest, bench_search, bench_positional);
criterion_main!(benches);
