// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

pub mod config;
pub mod session;

pub type Error = Box<dyn std::error::Error>;
pub type Result<T> = std::result::Result<T, Error>;

pub use config::Options;
pub use session::{DraftStore, FileStore, STORAGE_KEY, Session};

/// The general-purpose Markdown converter the pipeline delegates to.
/// It is not assumed to be idempotent on already-produced HTML, which is
/// why finished fragments travel through the pipeline as placeholders.
pub trait MarkdownEngine {
    fn parse(&self, markdown: &str) -> String;
}

pub struct ComrakEngine {
    options: comrak::Options<'static>,
}

impl ComrakEngine {
    pub fn new() -> Self {
        Self {
            options: comrak_options(),
        }
    }
}

impl Default for ComrakEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownEngine for ComrakEngine {
    fn parse(&self, markdown: &str) -> String {
        comrak::markdown_to_html(markdown, &self.options)
    }
}

fn comrak_options() -> comrak::Options<'static> {
    let mut options = comrak::Options::default();
    options.extension.autolink = true;
    options.extension.strikethrough = true;
    options.extension.table = true;
    // Expanded fragments are trusted author markup and must pass through raw.
    options.render.unsafe_ = true;
    options
}

#[derive(Debug, Clone)]
pub struct Rendered {
    pub html: String,
    pub title: Option<String>,
}

pub fn render_str(markdown: &str) -> Rendered {
    render_str_with_options(markdown, &Options::default())
}

pub fn render_str_with_options(markdown: &str, options: &Options) -> Rendered {
    let engine = ComrakEngine::new();
    render_with_engine(markdown, Some(&engine), options)
}

/// Runs the full pipeline. With `engine` absent the remaining plain-Markdown
/// content is emitted as-is while custom blocks still substitute, so
/// rendering degrades instead of failing.
pub fn render_with_engine(
    markdown: &str,
    engine: Option<&dyn MarkdownEngine>,
    options: &Options,
) -> Rendered {
    let preprocessed = preprocess(markdown, engine, options);

    let mut html = match engine {
        Some(engine) => engine.parse(&preprocessed.text),
        None => preprocessed.text,
    };

    for index in (0..preprocessed.blocks.len()).rev() {
        let token = placeholder_token(&preprocessed.block_prefix, index);
        // The engine wraps a bare placeholder line in a paragraph; a
        // block element must not stay nested in inline flow.
        let wrapped = format!("<p>{token}</p>");
        replace_first(&mut html, &wrapped, &token);
        replace_first(&mut html, &token, &preprocessed.blocks[index]);
    }

    Rendered {
        html,
        title: document_title(markdown),
    }
}

pub fn is_local_path(url: &str) -> bool {
    if url.starts_with("file://") || url.starts_with("\\\\") {
        return true;
    }
    if url.starts_with('/') && !url.starts_with("//") {
        return true;
    }

    let bytes = url.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

fn document_title(markdown: &str) -> Option<String> {
    markdown.lines().find_map(|line| {
        let rest = line.strip_prefix('#')?;
        if rest.starts_with('#') || !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let title = rest.trim();
        (!title.is_empty()).then(|| title.to_string())
    })
}

const LITERAL_PLACEHOLDER_BASE: &str = "@@BONFIRE_LITERAL_";
const BLOCK_PLACEHOLDER_BASE: &str = "@@BONFIRE_BLOCK_";
const PLACEHOLDER_SUFFIX: &str = "@@";

struct Preprocessed {
    text: String,
    blocks: Vec<String>,
    block_prefix: String,
}

fn preprocess(
    markdown: &str,
    engine: Option<&dyn MarkdownEngine>,
    options: &Options,
) -> Preprocessed {
    let literal_prefix = choose_placeholder_prefix(markdown, LITERAL_PLACEHOLDER_BASE);
    let block_prefix = choose_placeholder_prefix(markdown, BLOCK_PLACEHOLDER_BASE);

    let (text, literals) = protect_literals(markdown, &literal_prefix);

    let text = expand_icons(&text);
    let text = expand_images(&text, options);
    let text = expand_muted_text(&text);
    let text = expand_inline_buttons(&text, options);

    let mut expander = Expander {
        engine,
        options,
        literal_prefix,
        literals,
        block_prefix,
        blocks: Vec::new(),
    };

    let text = expander.expand_all(&text);
    let text = expander.restore_literals(&text);
    Preprocessed {
        text,
        blocks: expander.blocks,
        block_prefix: expander.block_prefix,
    }
}

fn choose_placeholder_prefix(markdown: &str, base: &str) -> String {
    use std::hash::{Hash, Hasher};

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    markdown.hash(&mut hasher);
    base.hash(&mut hasher);
    let mut nonce = hasher.finish();

    loop {
        let prefix = format!("{base}{nonce:x}_");
        if !markdown.contains(&prefix) {
            return prefix;
        }
        nonce = nonce.wrapping_add(1);
    }
}

fn placeholder_token(prefix: &str, index: usize) -> String {
    format!("{prefix}{index}{PLACEHOLDER_SUFFIX}")
}

fn replace_first(text: &mut String, from: &str, to: &str) -> bool {
    match text.find(from) {
        Some(position) => {
            text.replace_range(position..position + from.len(), to);
            true
        }
        None => false,
    }
}

fn protect_literals(markdown: &str, prefix: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(markdown.len());
    let mut literals = Vec::new();
    let mut cursor = 0;

    while let Some(rel_start) = markdown[cursor..].find('`') {
        let start = cursor + rel_start;
        out.push_str(&markdown[cursor..start]);

        let span_end = if markdown[start..].starts_with("```") {
            markdown[start + 3..]
                .find("```")
                .map(|offset| start + 3 + offset + 3)
        } else {
            // An inline span must close on the same line.
            let rest = &markdown[start + 1..];
            match rest.find(['`', '\n']) {
                Some(offset) if rest[offset..].starts_with('`') => Some(start + 1 + offset + 1),
                _ => None,
            }
        };

        match span_end {
            Some(end) => {
                let token = placeholder_token(prefix, literals.len());
                literals.push(markdown[start..end].to_string());
                out.push_str(&token);
                cursor = end;
            }
            None => {
                // Unmatched fence marker stays literal text.
                out.push('`');
                cursor = start + 1;
            }
        }
    }

    out.push_str(&markdown[cursor..]);
    (out, literals)
}

fn expand_icons(text: &str) -> String {
    const MARKER: &str = "icon:";

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(rel_start) = text[cursor..].find(MARKER) {
        let start = cursor + rel_start;
        out.push_str(&text[cursor..start]);

        let name_start = start + MARKER.len();
        let name_len = text[name_start..]
            .find(|ch: char| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-'))
            .unwrap_or(text.len() - name_start);
        let name = &text[name_start..name_start + name_len];

        if name.is_empty() {
            out.push_str(MARKER);
        } else {
            out.push_str(&format!("<i class=\"fa-solid fa-{name}\"></i>"));
        }
        cursor = name_start + name_len;
    }
    out.push_str(&text[cursor..]);
    out
}

fn expand_images(text: &str, options: &Options) -> String {
    let text = expand_image_marker(text, "image@:", "profile", options);
    expand_image_marker(&text, "image:", "rounded", options)
}

fn is_image_path_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-' | '/')
}

fn expand_image_marker(text: &str, marker: &str, class: &str, options: &Options) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(rel_start) = text[cursor..].find(marker) {
        let start = cursor + rel_start;
        out.push_str(&text[cursor..start]);

        let file_start = start + marker.len();
        let file_len = text[file_start..]
            .find(|ch| !is_image_path_char(ch))
            .unwrap_or(text.len() - file_start);
        let file = &text[file_start..file_start + file_len];

        if file.is_empty() {
            out.push_str(marker);
        } else {
            let base = &options.image_base;
            out.push_str(&format!(
                "<img class=\"{class}\" src=\"{base}{file}\" alt=\"{file}\">"
            ));
        }
        cursor = file_start + file_len;
    }
    out.push_str(&text[cursor..]);
    out
}

fn expand_muted_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(rel_open) = text[cursor..].find('(') {
        let open = cursor + rel_open;
        out.push_str(&text[cursor..open]);

        // A run preceded by `]` is a Markdown link destination, not a note.
        let preceded_by_label = text[..open].ends_with(']');
        let inner_start = open + 1;
        let close = text[inner_start..]
            .find(['(', ')', '\n'])
            .map(|offset| inner_start + offset);

        match close {
            Some(close)
                if text[close..].starts_with(')') && close > inner_start && !preceded_by_label =>
            {
                out.push_str("<span class=\"muted\">");
                out.push_str(&text[inner_start..close]);
                out.push_str("</span>");
                cursor = close + 1;
            }
            _ => {
                out.push('(');
                cursor = inner_start;
            }
        }
    }
    out.push_str(&text[cursor..]);
    out
}

fn expand_inline_buttons(text: &str, options: &Options) -> String {
    const MARKER: &str = "button [";

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(rel_start) = text[cursor..].find(MARKER) {
        let start = cursor + rel_start;
        let at_word_start = text[..start]
            .chars()
            .next_back()
            .is_none_or(char::is_whitespace);

        match parse_inline_button(text, start + MARKER.len()) {
            Some((label, url, end)) if at_word_start && !label.is_empty() => {
                out.push_str(&text[cursor..start]);
                out.push_str(&render_button(label, url, "", options));
                cursor = end;
            }
            _ => {
                out.push_str(&text[cursor..start + MARKER.len()]);
                cursor = start + MARKER.len();
            }
        }
    }
    out.push_str(&text[cursor..]);
    out
}

fn parse_inline_button(text: &str, label_start: usize) -> Option<(&str, &str, usize)> {
    let close = label_start + text[label_start..].find([']', '\n'])?;
    if !text[close..].starts_with(']') {
        return None;
    }

    let url_open = close + 1;
    if !text[url_open..].starts_with('(') {
        return None;
    }
    let url_start = url_open + 1;
    let url_end = url_start + text[url_start..].find([')', '\n'])?;
    if !text[url_end..].starts_with(')') {
        return None;
    }

    Some((
        &text[label_start..close],
        &text[url_start..url_end],
        url_end + 1,
    ))
}

fn render_button(label: &str, url: &str, extra_class: &str, options: &Options) -> String {
    if is_local_path(url) {
        format!(
            "<a class=\"button{extra_class} copy-path\" href=\"#\" data-path=\"{url}\">{label}</a>"
        )
    } else if options.links_in_new_tab {
        format!(
            "<a class=\"button{extra_class}\" href=\"{url}\" target=\"_blank\" rel=\"noopener\">{label}</a>"
        )
    } else {
        format!("<a class=\"button{extra_class}\" href=\"{url}\">{label}</a>")
    }
}

#[derive(Clone, Copy)]
enum BlockKind {
    Center,
    Button,
    Card,
    Link,
    Grid,
}

const BLOCK_KINDS: [BlockKind; 5] = [
    BlockKind::Center,
    BlockKind::Button,
    BlockKind::Card,
    BlockKind::Link,
    BlockKind::Grid,
];

impl BlockKind {
    fn keyword(self) -> &'static str {
        match self {
            BlockKind::Center => "center",
            BlockKind::Button => "button",
            BlockKind::Card => "card",
            BlockKind::Link => "link",
            BlockKind::Grid => "grid",
        }
    }
}

fn fence_open_header<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.trim().strip_prefix(":::")?;
    let rest = rest.trim_start().strip_prefix(keyword)?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}

fn is_fence_open(line: &str) -> bool {
    BLOCK_KINDS
        .iter()
        .any(|kind| fence_open_header(line, kind.keyword()).is_some())
}

// Fences of known kinds nest; the close marker of an inner block must not
// terminate the outer one.
fn find_matching_close(lines: &[&str], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, candidate) in lines[from..].iter().enumerate() {
        if candidate.trim() == ":::" {
            if depth == 0 {
                return Some(from + offset);
            }
            depth -= 1;
        } else if is_fence_open(candidate) {
            depth += 1;
        }
    }
    None
}

struct Expander<'a> {
    engine: Option<&'a dyn MarkdownEngine>,
    options: &'a Options,
    literal_prefix: String,
    literals: Vec<String>,
    block_prefix: String,
    blocks: Vec<String>,
}

impl Expander<'_> {
    fn expand_all(&mut self, text: &str) -> String {
        let mut text = text.to_string();
        for kind in BLOCK_KINDS {
            text = self.expand_kind(&text, kind);
        }
        text
    }

    fn expand_kind(&mut self, text: &str, kind: BlockKind) -> String {
        let lines = text.split_inclusive('\n').collect::<Vec<_>>();
        let mut out = String::with_capacity(text.len());
        let mut index = 0;

        while index < lines.len() {
            let line = lines[index];
            let Some(header) = fence_open_header(line, kind.keyword()) else {
                out.push_str(line);
                index += 1;
                continue;
            };

            let Some(close) = find_matching_close(&lines, index + 1) else {
                // Unterminated fence: the marker stays literal text.
                out.push_str(line);
                index += 1;
                continue;
            };

            let body = lines[index + 1..close].concat();
            let body = body.strip_suffix('\n').unwrap_or(&body).to_string();
            // Inner custom blocks become placeholders before this block's
            // body is handed to the engine.
            let body = self.expand_all(&body);
            let html = self.render_block(kind, header, &body);
            // The token must sit in a paragraph of its own, even when the
            // fence directly follows other text or another block.
            while !out.is_empty() && !out.ends_with("\n\n") {
                out.push('\n');
            }
            out.push_str(&self.register_block(html));
            out.push_str("\n\n");
            index = close + 1;
        }
        out
    }

    fn register_block(&mut self, html: String) -> String {
        let token = placeholder_token(&self.block_prefix, self.blocks.len());
        self.blocks.push(html);
        token
    }

    fn restore_literals(&self, text: &str) -> String {
        let mut out = text.to_string();
        for index in (0..self.literals.len()).rev() {
            let token = placeholder_token(&self.literal_prefix, index);
            replace_first(&mut out, &token, &self.literals[index]);
        }
        out
    }

    // Unprotects code spans in the fragment, then hands it to the engine.
    // Each fragment is parsed exactly once; its finished HTML is parked
    // behind a block placeholder and never re-enters the engine.
    fn parse_fragment(&self, fragment: &str) -> String {
        let fragment = self.restore_literals(fragment);
        match self.engine {
            Some(engine) => engine.parse(&fragment),
            None => ensure_trailing_newline(fragment),
        }
    }

    fn render_block(&mut self, kind: BlockKind, header: &str, body: &str) -> String {
        match kind {
            BlockKind::Center => {
                let inner = self.parse_fragment(body);
                format!("<div class=\"centered\">\n{inner}</div>")
            }
            BlockKind::Button => {
                let url = self.restore_literals(header);
                let label = self.restore_literals(body.trim());
                render_button(&label, url.trim(), " block-button", self.options)
            }
            BlockKind::Card => {
                let title = self.restore_literals(header);
                let inner = self.parse_fragment(body);
                if title.is_empty() {
                    format!("<div class=\"card\"><div class=\"card-body\">\n{inner}</div></div>")
                } else {
                    format!(
                        "<div class=\"card\"><div class=\"card-title\">{title}</div><div class=\"card-body\">\n{inner}</div></div>"
                    )
                }
            }
            BlockKind::Link => {
                let header = self.restore_literals(header);
                let (label, url) = parse_link_header(&header);
                let inner = self.parse_fragment(body);
                let aria = label
                    .map(|label| format!(" aria-label=\"{label}\""))
                    .unwrap_or_default();
                if is_local_path(url) {
                    format!(
                        "<a class=\"card link-card copy-path\" href=\"#\" data-path=\"{url}\"{aria}>\n{inner}</a>"
                    )
                } else if self.options.links_in_new_tab {
                    format!(
                        "<a class=\"card link-card\" href=\"{url}\" target=\"_blank\" rel=\"noopener\"{aria}>\n{inner}</a>"
                    )
                } else {
                    format!("<a class=\"card link-card\" href=\"{url}\"{aria}>\n{inner}</a>")
                }
            }
            BlockKind::Grid => {
                let mut cells = Vec::new();
                let mut current = String::new();
                for line in body.lines() {
                    if line.trim() == "|" {
                        cells.push(std::mem::take(&mut current));
                    } else {
                        current.push_str(line);
                        current.push('\n');
                    }
                }
                cells.push(current);

                let mut out = String::from("<div class=\"grid-container\">\n");
                for cell in &cells {
                    let inner = self.parse_fragment(cell.trim());
                    out.push_str("<div class=\"grid-item\">\n");
                    out.push_str(&inner);
                    out.push_str("</div>\n");
                }
                out.push_str("</div>");
                out
            }
        }
    }
}

fn parse_link_header(header: &str) -> (Option<&str>, &str) {
    if let Some(rest) = header.strip_prefix('[')
        && let Some(close) = rest.find(']')
        && let Some(url) = rest[close + 1..]
            .strip_prefix('(')
            .and_then(|after| after.strip_suffix(')'))
    {
        return (Some(&rest[..close]), url.trim());
    }
    (None, header)
}

fn ensure_trailing_newline(mut text: String) -> String {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
