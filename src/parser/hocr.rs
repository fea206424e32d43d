use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use crate::core::error::{Error, Result};
use crate::core::types::{BBox, Coord, WordCut, INVALID_COORD};
use crate::parser::title::{parse_bbox, parse_corners, parse_title, TitleProps};
use crate::parser::{document_id_for, ParsedLine, ParsedPage, ParserConfig};

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid whitespace regex"));

struct Selectors {
    page: Selector,
    line: Selector,
    word: Selector,
}

impl Selectors {
    fn new(config: &ParserConfig) -> Result<Self> {
        Ok(Selectors {
            page: class_selector(&config.page_classes)?,
            line: class_selector(&config.line_classes)?,
            word: class_selector(&config.word_classes)?,
        })
    }
}

fn class_selector(classes: &[String]) -> Result<Selector> {
    if classes.is_empty() {
        return Err(Error::new(
            crate::core::error::ErrorKind::InvalidArgument,
            "empty class list in parser config".to_string(),
        ));
    }
    let css = classes
        .iter()
        .map(|c| format!(".{}", c))
        .collect::<Vec<_>>()
        .join(", ");
    Selector::parse(&css)
        .map_err(|e| Error::parse(format!("invalid selector '{}': {:?}", css, e)))
}

/// One hOCR file, parsed leniently (HTML or XHTML).
pub struct HocrDocument {
    id: String,
    path: PathBuf,
    html: Html,
    selectors: Selectors,
    skip_line_classes: Vec<String>,
}

impl HocrDocument {
    pub fn open(path: &Path, config: &ParserConfig) -> Result<Self> {
        let id = document_id_for(path)?;
        let bytes = fs::read(path)
            .map_err(|e| Error::parse(format!("cannot read {}: {}", path.display(), e)))?;
        let source = String::from_utf8(bytes)
            .map_err(|e| Error::parse(format!("{} is not UTF-8: {}", path.display(), e)))?;

        let html = Html::parse_document(&source);
        let selectors = Selectors::new(config)?;

        if html.select(&selectors.page).next().is_none() {
            return Err(Error::parse(format!("{} contains no OCR pages", path.display())));
        }

        Ok(HocrDocument {
            id,
            path: path.to_path_buf(),
            html,
            selectors,
            skip_line_classes: config.skip_line_classes.clone(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pages with resolvable image and dimensions. Others are logged and
    /// skipped.
    pub fn pages(&self) -> impl Iterator<Item = ParsedPage> + '_ {
        self.html
            .select(&self.selectors.page)
            .enumerate()
            .filter_map(move |(idx, node)| self.parse_page(idx, node))
    }

    /// Lines of every page, in reading order.
    pub fn lines(&self) -> impl Iterator<Item = (String, Vec<ParsedLine>)> + '_ {
        self.html
            .select(&self.selectors.page)
            .enumerate()
            .map(move |(idx, node)| {
                let page_id = page_id_of(idx, node);
                let lines = self.parse_lines(&page_id, node);
                (page_id, lines)
            })
    }

    fn parse_page(&self, idx: usize, node: ElementRef<'_>) -> Option<ParsedPage> {
        let props = parse_title(node.value().attr("title"));
        let page_id = page_id_of(idx, node);

        let Some(image_path) = self.image_path(idx, &props) else {
            debug!(document_id = %self.id, page_id = %page_id, "could not resolve page image, skipping page");
            return None;
        };

        let (width, height) = match page_dimensions(&props) {
            Some(dimensions) => dimensions,
            None => match image::image_dimensions(&image_path) {
                Ok(dimensions) => dimensions,
                Err(e) => {
                    let err = Error::from(e);
                    warn!(
                        document_id = %self.id,
                        page_id = %page_id,
                        image = %image_path.display(),
                        error = %err,
                        "no page dimensions in markup or image, skipping page"
                    );
                    return None;
                }
            },
        };

        Some(ParsedPage {
            page_id,
            width,
            height,
            image_path,
            checksum: props.get("imagemd5").cloned(),
        })
    }

    fn image_path(&self, idx: usize, props: &TitleProps) -> Option<PathBuf> {
        let base_dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let candidate = match props.get("image") {
            Some(image) if !image.is_empty() => base_dir.join(image),
            _ => base_dir.join(format!("Image_{:04}.JPEG", idx)),
        };

        fs::canonicalize(&candidate)
            .ok()
            .or_else(|| std::path::absolute(&candidate).ok())
    }

    fn parse_lines(&self, page_id: &str, page: ElementRef<'_>) -> Vec<ParsedLine> {
        let mut lines = Vec::new();
        let mut next_sequence = 0u32;

        for node in page.select(&self.selectors.line) {
            if self.is_skipped_line(node) {
                continue;
            }

            let raw: String = node.text().collect();
            let text = normalize_text(&raw);
            if text.is_empty() {
                continue;
            }

            let props = parse_title(node.value().attr("title"));
            let bbox = parse_bbox(&props).unwrap_or_else(|| {
                debug!(
                    document_id = %self.id,
                    page_id = %page_id,
                    line_id = node.value().attr("id").unwrap_or(""),
                    "could not determine line bbox"
                );
                BBox::UNKNOWN
            });

            let word_cuts = self.word_cuts(page_id, node, &mut next_sequence);
            lines.push(ParsedLine { bbox, word_cuts, text });
        }

        lines
    }

    fn is_skipped_line(&self, node: ElementRef<'_>) -> bool {
        if node.value().classes().any(|c| self.skip_line_classes.iter().any(|s| s == c)) {
            return true;
        }
        // Block-level wrappers around real lines; the inner lines are taken.
        node.select(&self.selectors.line).next().is_some()
    }

    /// One cut per whitespace token of the line text, so `sequence_pos` is
    /// always the token index in the page text. A token takes the extent of
    /// the word element(s) its characters fall in; text outside any word
    /// element gets sentinel coordinates.
    fn word_cuts(&self, page_id: &str, line: ElementRef<'_>, next_sequence: &mut u32) -> Vec<WordCut> {
        let mut words = HashMap::new();
        for word in line.select(&self.selectors.word) {
            if !self.is_nested_word(word, line) {
                words.insert(word.id(), word_extent(&parse_title(word.value().attr("title"))));
            }
        }

        let mut cuts = Vec::new();
        let mut token: Option<TokenExtent> = None;

        for node in line.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            // Outermost word element between the text and its line
            let owner = node.ancestors()
                .take_while(|n| n.id() != line.id())
                .filter_map(ElementRef::wrap)
                .filter(|el| self.selectors.word.matches(el))
                .last()
                .map(|el| words.get(&el.id()).copied().flatten());

            for c in text.chars() {
                if c.is_whitespace() {
                    if let Some(done) = token.take() {
                        cuts.push(self.finish_token(page_id, done, next_sequence));
                    }
                    continue;
                }
                token.get_or_insert_with(TokenExtent::default).add(owner);
            }
        }
        if let Some(done) = token.take() {
            cuts.push(self.finish_token(page_id, done, next_sequence));
        }

        cuts
    }

    fn finish_token(&self, page_id: &str, token: TokenExtent, next_sequence: &mut u32) -> WordCut {
        let (start_x, end_x) = token.extent.unwrap_or_else(|| {
            debug!(
                document_id = %self.id,
                page_id = %page_id,
                sequence_pos = *next_sequence,
                in_word = token.in_word,
                "word without bbox"
            );
            (INVALID_COORD, INVALID_COORD)
        });

        let cut = WordCut { start_x, end_x, sequence_pos: *next_sequence };
        *next_sequence += 1;
        cut
    }

    // Character boxes inside a word box are not words of their own.
    fn is_nested_word(&self, word: ElementRef<'_>, line: ElementRef<'_>) -> bool {
        word.ancestors()
            .take_while(|node| node.id() != line.id())
            .filter_map(ElementRef::wrap)
            .any(|el| self.selectors.word.matches(&el))
    }
}

fn page_id_of(idx: usize, node: ElementRef<'_>) -> String {
    node.value()
        .attr("id")
        .map(String::from)
        .unwrap_or_else(|| format!("page_{:04}", idx))
}

fn page_dimensions(props: &TitleProps) -> Option<(u32, u32)> {
    let [x0, y0, x1, y1] = parse_corners(props.get("bbox")?)?;
    x1.checked_sub(x0).filter(|w| *w >= 0)?;
    y1.checked_sub(y0).filter(|h| *h >= 0)?;
    Some((u32::try_from(x1).ok()?, u32::try_from(y1).ok()?))
}

fn word_extent(props: &TitleProps) -> Option<(Coord, Coord)> {
    let [x0, _, x1, _] = parse_corners(props.get("bbox")?)?;
    x1.checked_sub(x0).filter(|w| *w >= 0)?;
    Some((x0, x1))
}

/// Horizontal extent of one token, merged over the word elements its
/// characters belong to.
#[derive(Default)]
struct TokenExtent {
    extent: Option<(Coord, Coord)>,
    in_word: bool,
}

impl TokenExtent {
    /// `owner` is `None` outside word elements, `Some(None)` inside a word
    /// element without a usable bbox.
    fn add(&mut self, owner: Option<Option<(Coord, Coord)>>) {
        let Some(word) = owner else {
            return;
        };
        self.in_word = true;
        if let Some((x0, x1)) = word {
            self.extent = Some(match self.extent {
                Some((s, e)) => (s.min(x0), e.max(x1)),
                None => (x0, x1),
            });
        }
    }
}

/// Collapse whitespace runs of two or more into one space, then trim.
pub fn normalize_text(raw: &str) -> String {
    WHITESPACE_RUNS.replace_all(raw.trim(), " ").into_owned()
}
