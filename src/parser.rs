/// Line scanner for the blog markdown dialect
///
/// One forward pass over the lines. Code fences and comments may consume
/// following lines; everything else is handled one line at a time.
use crate::footnotes::Footnotes;
use crate::image::{COMMENT_CLOSE, IMAGE_MARKER, ImageDirective};
use crate::inline;
use crate::renderer::{render_code_block, render_heading};
use regex::Regex;
use std::sync::LazyLock;

const FENCE: &str = "```";
const COMMENT_OPEN: &str = "<!--";

/// Default URL prefix substituted for `~` in image paths.
pub const DEFAULT_ASSET_PREFIX: &str = "/blog_assets";

static ORDERED_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s+(.+)$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Replaces a leading `~` in image source paths.
    pub asset_prefix: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            asset_prefix: DEFAULT_ASSET_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    None,
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> Option<&'static str> {
        match self {
            ListKind::None => None,
            ListKind::Unordered => Some("ul"),
            ListKind::Ordered => Some("ol"),
        }
    }
}

/// Mutable state for a single document.
struct ParseState<'a> {
    list: ListKind,
    /// Lines of the open code block, if any.
    code_block: Option<Vec<&'a str>>,
    output: Vec<String>,
    notes: Footnotes,
}

impl<'a> ParseState<'a> {
    fn new() -> Self {
        ParseState {
            list: ListKind::None,
            code_block: None,
            output: Vec::new(),
            notes: Footnotes::new(),
        }
    }

    fn open_list(&mut self, kind: ListKind) {
        if self.list == kind {
            return;
        }
        self.close_list();
        if let Some(tag) = kind.tag() {
            self.output.push(format!("<{}>", tag));
        }
        self.list = kind;
    }

    fn close_list(&mut self) {
        if let Some(tag) = self.list.tag() {
            self.output.push(format!("</{}>", tag));
        }
        self.list = ListKind::None;
    }

    fn close_code_block(&mut self) {
        if let Some(lines) = self.code_block.take() {
            self.output.push(render_code_block(&lines));
        }
    }

    fn inline(&mut self, text: &str) -> String {
        inline::transform(text, &mut self.notes)
    }

    fn finish(mut self) -> String {
        self.close_list();
        self.close_code_block();
        let footnotes = self.notes.render();
        self.output.extend(footnotes);
        self.output.join("\n")
    }
}

pub struct Parser {
    options: ParseOptions,
}

impl Parser {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Parser { options }
    }

    /// Transform a post body (metadata comment already removed) into an
    /// HTML fragment. Never fails: malformed constructs degrade to text or
    /// are dropped.
    pub fn parse(&self, input: &str) -> String {
        let lines: Vec<&str> = input.lines().collect();
        let mut state = ParseState::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let trimmed = line.trim();

            // Inside a code block every line is literal until the next fence
            if state.code_block.is_some() {
                if trimmed.starts_with(FENCE) {
                    state.close_code_block();
                } else if let Some(code) = state.code_block.as_mut() {
                    code.push(line);
                }
                i += 1;
                continue;
            }

            if let Some((kind, text)) = self.parse_list_item(trimmed) {
                state.open_list(kind);
                let item = state.inline(text);
                state.output.push(format!("<li>{}</li>", item));
                i += 1;
                continue;
            }

            // Anything that is not a list item ends the current list
            state.close_list();

            if trimmed.starts_with(FENCE) {
                state.code_block = Some(Vec::new());
                i += 1;
            } else if trimmed.starts_with(IMAGE_MARKER) {
                let consumed = self.comment_extent(&lines[i..]);
                let comment = lines[i..i + consumed].join("\n");
                let directive = ImageDirective::parse(&comment);
                if let Some(html) = directive.render(&self.options.asset_prefix, &mut state.notes)
                {
                    state.output.push(html);
                }
                i += consumed;
            } else if trimmed.starts_with(COMMENT_OPEN) {
                i += self.comment_extent(&lines[i..]);
            } else if let Some((level, text)) = self.parse_heading(line) {
                let content = state.inline(text);
                state.output.push(render_heading(level + 1, &content));
                i += 1;
            } else if trimmed.is_empty() {
                state.output.push(String::new());
                i += 1;
            } else if trimmed.starts_with('<') {
                state.output.push(line.to_string());
                i += 1;
            } else {
                let content = state.inline(trimmed);
                state.output.push(format!("<p>{}</p>", content));
                i += 1;
            }
        }

        state.finish()
    }

    /// Number of lines up to and including the first one containing `-->`.
    /// An unterminated comment runs to the end of the input.
    fn comment_extent(&self, lines: &[&str]) -> usize {
        lines
            .iter()
            .position(|line| line.contains(COMMENT_CLOSE))
            .map_or(lines.len(), |pos| pos + 1)
    }

    /// `# Title` → (1, "Title"). The `#` must be the first character.
    fn parse_heading<'a>(&self, line: &'a str) -> Option<(usize, &'a str)> {
        if !line.starts_with('#') {
            return None;
        }
        let level = line.chars().take_while(|&c| c == '#').count();
        Some((level, line[level..].trim()))
    }

    /// `* text` or `12. text`, on an already trimmed line.
    fn parse_list_item<'a>(&self, trimmed: &'a str) -> Option<(ListKind, &'a str)> {
        if let Some(text) = trimmed.strip_prefix("* ") {
            return Some((ListKind::Unordered, text));
        }
        let caps = ORDERED_ITEM_RE.captures(trimmed)?;
        let text = caps.get(2)?.as_str();
        Some((ListKind::Ordered, text))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
