#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use ocrdex::{Config, Database};

/// `<span class="ocrx_word">` with an optional horizontal extent.
pub fn word(text: &str, extent: Option<(i32, i32)>) -> String {
    match extent {
        Some((x0, x1)) => format!(r#"<span class="ocrx_word" title="bbox {} 0 {} 10; x_wconf 95">{}</span>"#, x0, x1, text),
        None => format!(r#"<span class="ocrx_word">{}</span>"#, text),
    }
}

/// A line of words; `None` leaves the line without a bbox.
pub fn line(bbox: Option<(i32, i32, i32, i32)>, words: &[String]) -> String {
    let title = match bbox {
        Some((x0, y0, x1, y1)) => format!(r#" title="bbox {} {} {} {}""#, x0, y0, x1, y1),
        None => String::new(),
    };
    format!(r#"<span class="ocr_line"{}>{}</span>"#, title, words.join(" "))
}

/// A line whose words are laid out left to right, 10px per character.
pub fn text_line(y: i32, height: i32, text: &str) -> String {
    let mut x = 0;
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            let end = x + 10 * w.chars().count() as i32;
            let html = word(w, Some((x, end)));
            x = end + 5;
            html
        })
        .collect();
    line(Some((0, y, x.max(1), y + height)), &words)
}

pub fn page(id: &str, lines: &[String]) -> String {
    format!(
        r#"<div class="ocr_page" id="{}" title="image &quot;{}.png&quot;; bbox 0 0 1200 1800">{}</div>"#,
        id,
        id,
        lines.join("\n")
    )
}

pub fn document(pages: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>scan</title></head>
<body>
{}
</body></html>"#,
        pages.join("\n")
    )
}

/// One page per entry of `pages`, each line of text laid out by `text_line`.
pub fn simple_document(pages: &[(&str, &[&str])]) -> String {
    let pages: Vec<String> = pages
        .iter()
        .map(|(id, lines)| {
            let lines: Vec<String> = lines
                .iter()
                .enumerate()
                .map(|(i, text)| text_line(100 + 30 * i as i32, 20, text))
                .collect();
            page(id, &lines)
        })
        .collect();
    document(&pages)
}

/// A store and a scratch directory for hOCR files.
pub struct Fixture {
    pub dir: TempDir,
    pub config: Config,
    pub db: Database,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();

        let mut config = Config::with_storage_path(dir.path().join("store"));
        config.autocomplete_min_count = 1;
        adjust(&mut config);

        let db = Database::open(config.clone()).unwrap();
        Fixture { dir, config, db }
    }

    pub fn write(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join("docs").join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, body).unwrap();
        path
    }

    pub fn ingest(&self, name: &str, body: &str) -> String {
        let path = self.write(name, body);
        self.db.ingest(&path).unwrap()
    }

    /// Close and open the store again.
    pub fn reopen(self) -> Self {
        let Fixture { dir, config, db } = self;
        drop(db);
        let db = Database::open(config.clone()).unwrap();
        Fixture { dir, config, db }
    }
}
