/// Post metadata from the leading `<!-- key: value -->` comment.
use std::collections::BTreeMap;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const UNTITLED: &str = "Untitled";
const DEFAULT_TIME: &str = "00:00";

/// Metadata block of a post.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Hero image path, used for social cards and the feed enclosure.
    pub image: Option<String>,
    /// Publish date, `YYYY-MM-DD`.
    pub date: Option<String>,
    /// Publish time of day, `HH:MM`.
    pub time: Option<String>,
    pub updated: Option<String>,
    pub updated_time: Option<String>,
    /// Keys this crate does not interpret.
    pub extra: BTreeMap<String, String>,
}

impl Metadata {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED)
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn time(&self) -> &str {
        self.time.as_deref().unwrap_or(DEFAULT_TIME)
    }

    pub fn updated_time(&self) -> &str {
        self.updated_time.as_deref().unwrap_or(DEFAULT_TIME)
    }

    fn set(&mut self, key: &str, value: String) {
        let slot = match key {
            "title" => &mut self.title,
            "description" => &mut self.description,
            "image" => &mut self.image,
            "date" => &mut self.date,
            "time" => &mut self.time,
            "updated" => &mut self.updated,
            "updated_time" => &mut self.updated_time,
            _ => {
                self.extra.insert(key.to_owned(), value);
                return;
            }
        };
        *slot = Some(value);
    }
}

/// Byte range of the first `<!-- ... -->` comment: (start, inner start,
/// inner end, end).
fn first_comment(text: &str) -> Option<(usize, usize, usize, usize)> {
    let start = text.find(COMMENT_OPEN)?;
    let inner_start = start + COMMENT_OPEN.len();
    let inner_end = inner_start + text[inner_start..].find(COMMENT_CLOSE)?;
    Some((start, inner_start, inner_end, inner_end + COMMENT_CLOSE.len()))
}

/// Parse `key: value` lines from the first comment in `text`.
///
/// Lines without a colon are ignored; the value may itself contain colons.
pub fn parse_metadata(text: &str) -> Metadata {
    let mut metadata = Metadata::default();
    let Some((_, inner_start, inner_end, _)) = first_comment(text) else {
        return metadata;
    };

    for line in text[inner_start..inner_end].trim().lines() {
        if let Some((key, value)) = line.split_once(':') {
            let value = value.trim();
            if !value.is_empty() {
                metadata.set(key.trim(), value.to_owned());
            }
        }
    }
    metadata
}

/// The post body after the first comment, trimmed. Returns the whole text
/// (trimmed) when there is no comment.
pub fn strip_metadata(text: &str) -> &str {
    match first_comment(text) {
        Some((_, _, _, end)) => text[end..].trim(),
        None => text.trim(),
    }
}

/// `2024-03-01-my-post` → `my-post`; other stems are returned unchanged.
pub fn slug_from_file_stem(stem: &str) -> &str {
    let bytes = stem.as_bytes();
    let dated = bytes.len() > 11
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
        && bytes[10] == b'-';
    if dated { &stem[11..] } else { stem }
}
