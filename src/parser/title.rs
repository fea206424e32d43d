//! hOCR `title` attribute properties: `bbox 10 20 30 40; image "p1.png"`.

use std::collections::HashMap;
use crate::core::types::{BBox, Coord};

pub type TitleProps = HashMap<String, String>;

pub fn parse_title(title: Option<&str>) -> TitleProps {
    let mut props = TitleProps::new();
    let Some(title) = title else {
        return props;
    };

    for item in title.split(';') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (key, value) = item.split_once(char::is_whitespace).unwrap_or((item, ""));
        props.insert(key.to_string(), unquote(value.trim()).to_string());
    }

    props
}

/// `x0 y0 x1 y1` as four integers.
pub fn parse_corners(value: &str) -> Option<[Coord; 4]> {
    let mut parts = value.split_whitespace().map(|p| p.parse::<Coord>().ok());
    let corners = [parts.next()??, parts.next()??, parts.next()??, parts.next()??];
    Some(corners)
}

pub fn parse_bbox(props: &TitleProps) -> Option<BBox> {
    let [x0, y0, x1, y1] = parse_corners(props.get("bbox")?)?;
    Some(BBox::from_corners(x0, y0, x1, y1))
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
