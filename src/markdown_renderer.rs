use std::path::PathBuf;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use textwrap::{WordSeparator, WrapAlgorithm};
use unicode_width::UnicodeWidthStr;

use crate::document::DocumentId;
use crate::error::RenderError;
use crate::theme::{Appearance, Base16Palette};

/// Documents are never wrapped wider than this, however wide the terminal is.
pub const MAX_DOCUMENT_WIDTH: u16 = 120;

/// Which colors the renderer paints with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StyleSelector {
    /// Dark or light palette, following the terminal background
    #[default]
    Auto,
    /// A base16 YAML scheme on disk
    Path(PathBuf),
}

impl StyleSelector {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("auto") || value.trim().is_empty() {
            StyleSelector::Auto
        } else {
            StyleSelector::Path(PathBuf::from(value.trim()))
        }
    }
}

/// Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub appearance: Appearance,
    /// Pass markdown through untouched instead of styling it
    pub disable_styling: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub document_id: DocumentId,
    /// Pager generation the request was issued for
    pub generation: u64,
    pub markdown: String,
    pub width: u16,
    pub style: StyleSelector,
}

#[derive(Debug, Clone)]
pub struct RenderedContent {
    pub document_id: DocumentId,
    pub generation: u64,
    pub text: Text<'static>,
}

/// Width the body gets wrapped to for a given viewport width.
pub fn render_width(viewport_width: u16) -> u16 {
    viewport_width.min(MAX_DOCUMENT_WIDTH)
}

/// Turns raw markdown into styled, width-bounded lines.
///
/// The renderer is a pure function of its inputs: the markdown, the wrap
/// width and the style selector, plus the [`RenderConfig`] it was built with.
/// Every output line has leading and trailing whitespace removed; the number
/// and order of lines produced by the styler is kept as is.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    config: RenderConfig,
}

impl MarkdownRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn render(&self, request: &RenderRequest) -> Result<RenderedContent, RenderError> {
        let text = self.render_markdown(&request.markdown, request.width, &request.style)?;
        Ok(RenderedContent {
            document_id: request.document_id,
            generation: request.generation,
            text,
        })
    }

    pub fn render_markdown(
        &self,
        markdown: &str,
        width: u16,
        style: &StyleSelector,
    ) -> Result<Text<'static>, RenderError> {
        if self.config.disable_styling {
            return Ok(passthrough(markdown));
        }

        let palette = match style {
            StyleSelector::Auto => Base16Palette::for_appearance(self.config.appearance).clone(),
            StyleSelector::Path(path) => Base16Palette::load(path)?,
        };

        let width = render_width(width) as usize;
        let lines = Styler::new(&palette, width).run(markdown);
        Ok(Text::from(trim_lines(lines)))
    }
}

fn passthrough(markdown: &str) -> Text<'static> {
    Text::from(
        markdown
            .split('\n')
            .map(|line| Line::raw(line.to_string()))
            .collect::<Vec<_>>(),
    )
}

/// Strip leading and trailing whitespace from every line without touching the
/// line count.
pub fn trim_lines(lines: Vec<Line<'static>>) -> Vec<Line<'static>> {
    lines.into_iter().map(trim_line).collect()
}

fn trim_line(line: Line<'static>) -> Line<'static> {
    let Line {
        style,
        alignment,
        spans,
    } = line;
    let mut spans: Vec<Span<'static>> = spans;

    while let Some(first) = spans.first_mut() {
        let trimmed = first.content.trim_start();
        if trimmed.is_empty() {
            spans.remove(0);
        } else {
            if trimmed.len() != first.content.len() {
                first.content = trimmed.to_string().into();
            }
            break;
        }
    }

    while let Some(last) = spans.last_mut() {
        let trimmed = last.content.trim_end();
        if trimmed.is_empty() {
            spans.pop();
        } else {
            if trimmed.len() != last.content.len() {
                last.content = trimmed.to_string().into();
            }
            break;
        }
    }

    Line {
        style,
        alignment,
        spans,
    }
}

#[derive(Debug, Clone)]
enum Inline {
    Text(String, Style),
    Break,
}

#[derive(Debug)]
struct ListState {
    next_index: Option<u64>,
    /// Set once the first item has been emitted
    started: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct InlineStyle {
    emphasis: u8,
    strong: u8,
    strikethrough: u8,
    link: u8,
}

struct Styler<'p> {
    palette: &'p Base16Palette,
    width: usize,
    lines: Vec<Line<'static>>,
    inline: Vec<Inline>,
    inline_style: InlineStyle,
    heading: Option<HeadingLevel>,
    quote_depth: usize,
    lists: Vec<ListState>,
    /// Bullet waiting for the first line of the current list item
    pending_bullet: Option<String>,
    code_block: Option<String>,
    link_targets: Vec<String>,
    image_alt: Option<String>,
    needs_gap: bool,
}

impl<'p> Styler<'p> {
    fn new(palette: &'p Base16Palette, width: usize) -> Self {
        Self {
            palette,
            width,
            lines: Vec::new(),
            inline: Vec::new(),
            inline_style: InlineStyle::default(),
            heading: None,
            quote_depth: 0,
            lists: Vec::new(),
            pending_bullet: None,
            code_block: None,
            link_targets: Vec::new(),
            image_alt: None,
            needs_gap: false,
        }
    }

    fn run(mut self, markdown: &str) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(tag) => self.start(tag),
                Event::End(tag) => self.end(tag),
                Event::Text(text) => self.text(&text),
                Event::Code(code) => {
                    let style = Style::default()
                        .fg(self.palette.base_08)
                        .bg(self.palette.base_01);
                    self.inline.push(Inline::Text(code.to_string(), style));
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    let style = Style::default().fg(self.palette.base_03);
                    self.inline.push(Inline::Text(html.to_string(), style));
                }
                Event::FootnoteReference(name) => {
                    let style = self.current_style();
                    self.inline.push(Inline::Text(format!("[^{name}]"), style));
                }
                Event::SoftBreak => {
                    let style = self.current_style();
                    self.inline.push(Inline::Text(" ".to_string(), style));
                }
                Event::HardBreak => self.inline.push(Inline::Break),
                Event::Rule => self.rule(),
                Event::TaskListMarker(done) => {
                    let marker = if done { "[x] " } else { "[ ] " };
                    let style = Style::default().fg(self.palette.base_0e);
                    self.inline.push(Inline::Text(marker.to_string(), style));
                }
                _ => {}
            }
        }

        self.flush_block();
        self.lines
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_block();
                self.heading = Some(level);
            }
            Tag::Paragraph => self.flush_block(),
            Tag::BlockQuote(_) => {
                self.flush_block();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(_) => {
                self.flush_block();
                self.code_block = Some(String::new());
            }
            Tag::List(start) => {
                self.flush_block();
                self.lists.push(ListState {
                    next_index: start,
                    started: false,
                });
            }
            Tag::Item => {
                self.flush_block();
                let bullet = match self.lists.last_mut() {
                    Some(ListState {
                        next_index: Some(index),
                        ..
                    }) => {
                        let bullet = format!("{index}. ");
                        *index += 1;
                        bullet
                    }
                    _ => match self.lists.len() {
                        0 | 1 => "• ".to_string(),
                        2 => "◦ ".to_string(),
                        _ => "▪ ".to_string(),
                    },
                };
                self.pending_bullet = Some(bullet);
            }
            Tag::Emphasis => self.inline_style.emphasis += 1,
            Tag::Strong => self.inline_style.strong += 1,
            Tag::Strikethrough => self.inline_style.strikethrough += 1,
            Tag::Link { dest_url, .. } => {
                self.inline_style.link += 1;
                self.link_targets.push(dest_url.to_string());
            }
            Tag::Image { dest_url, .. } => {
                self.image_alt = Some(String::new());
                self.link_targets.push(dest_url.to_string());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.flush_block();
                self.heading = None;
            }
            TagEnd::Paragraph => self.flush_block(),
            TagEnd::BlockQuote => {
                self.flush_block();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => self.flush_code_block(),
            TagEnd::List(_) => {
                self.flush_block();
                self.lists.pop();
            }
            TagEnd::Item => {
                self.flush_block();
                self.pending_bullet = None;
            }
            TagEnd::Emphasis => {
                self.inline_style.emphasis = self.inline_style.emphasis.saturating_sub(1)
            }
            TagEnd::Strong => self.inline_style.strong = self.inline_style.strong.saturating_sub(1),
            TagEnd::Strikethrough => {
                self.inline_style.strikethrough = self.inline_style.strikethrough.saturating_sub(1)
            }
            TagEnd::Link => {
                self.inline_style.link = self.inline_style.link.saturating_sub(1);
                if let Some(target) = self.link_targets.pop() {
                    let label_matches = matches!(
                        self.inline.last(),
                        Some(Inline::Text(text, _)) if *text == target
                    );
                    if !label_matches && !target.is_empty() {
                        let style = Style::default().fg(self.palette.base_03);
                        self.inline.push(Inline::Text(format!(" ({target})"), style));
                    }
                }
            }
            TagEnd::Image => {
                let alt = self.image_alt.take().unwrap_or_default();
                let target = self.link_targets.pop().unwrap_or_default();
                let style = Style::default().fg(self.palette.base_0c);
                let label = if alt.is_empty() {
                    format!("Image: {target}")
                } else {
                    format!("Image: {alt} → {target}")
                };
                self.inline.push(Inline::Text(label, style));
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(code) = self.code_block.as_mut() {
            code.push_str(text);
            return;
        }
        if let Some(alt) = self.image_alt.as_mut() {
            alt.push_str(text);
            return;
        }

        let content = if self.heading == Some(HeadingLevel::H1) {
            text.to_uppercase()
        } else {
            text.to_string()
        };
        let style = self.current_style();
        self.inline.push(Inline::Text(content, style));
    }

    fn current_style(&self) -> Style {
        if let Some(level) = self.heading {
            return self.heading_style(level);
        }

        let mut style = Style::default().fg(self.palette.base_05);
        if self.quote_depth > 0 {
            style = style.fg(self.palette.base_04);
        }
        if self.inline_style.emphasis > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.inline_style.strong > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.inline_style.strikethrough > 0 {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }
        if self.inline_style.link > 0 {
            style = style
                .fg(self.palette.base_0c)
                .add_modifier(Modifier::UNDERLINED);
        }
        style
    }

    fn heading_style(&self, level: HeadingLevel) -> Style {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        match level {
            HeadingLevel::H1 => bold.fg(self.palette.base_0a).bg(self.palette.base_02),
            HeadingLevel::H2 => bold.fg(self.palette.base_0d),
            HeadingLevel::H3 => bold.fg(self.palette.base_0e),
            _ => bold.fg(self.palette.base_0c),
        }
    }

    fn heading_marker(level: HeadingLevel) -> &'static str {
        match level {
            HeadingLevel::H1 => "",
            HeadingLevel::H2 => "## ",
            HeadingLevel::H3 => "### ",
            HeadingLevel::H4 => "#### ",
            HeadingLevel::H5 => "##### ",
            HeadingLevel::H6 => "###### ",
        }
    }

    /// Prefix spans for the first and following lines of a block.
    fn prefixes(&mut self) -> (Vec<Span<'static>>, Vec<Span<'static>>) {
        let mut first = Vec::new();
        let mut rest = Vec::new();

        if self.quote_depth > 0 {
            let bar = "│ ".repeat(self.quote_depth);
            let style = Style::default().fg(self.palette.base_03);
            first.push(Span::styled(bar.clone(), style));
            rest.push(Span::styled(bar, style));
        }

        if !self.lists.is_empty() {
            let depth = self.lists.len() - 1;
            let indent = "  ".repeat(depth);
            let bullet_style = Style::default().fg(self.palette.base_0d);
            match self.pending_bullet.take() {
                Some(bullet) => {
                    if let Some(list) = self.lists.last_mut() {
                        list.started = true;
                    }
                    let hang = " ".repeat(bullet.width());
                    first.push(Span::styled(format!("{indent}{bullet}"), bullet_style));
                    rest.push(Span::raw(format!("{indent}{hang}")));
                }
                None => {
                    let hang = format!("{indent}  ");
                    first.push(Span::raw(hang.clone()));
                    rest.push(Span::raw(hang));
                }
            }
        }

        if let Some(level) = self.heading {
            let marker = Self::heading_marker(level);
            if !marker.is_empty() {
                first.push(Span::styled(marker, self.heading_style(level)));
            }
        }

        (first, rest)
    }

    fn gap(&mut self) {
        // List items follow each other (and their parent item) without a blank line
        let in_tight_item = self.pending_bullet.is_some()
            && (self.lists.len() > 1 || self.lists.last().is_some_and(|list| list.started));
        if self.needs_gap && !in_tight_item {
            self.lines.push(Line::default());
        }
        self.needs_gap = true;
    }

    fn flush_block(&mut self) {
        if self.inline.is_empty() {
            return;
        }
        let inline = std::mem::take(&mut self.inline);
        if inline
            .iter()
            .all(|item| matches!(item, Inline::Text(text, _) if text.trim().is_empty()))
        {
            return;
        }

        self.gap();
        let (first, rest) = self.prefixes();
        // Hard breaks start a new line that hangs like any continuation line
        for (idx, segment) in inline
            .split(|item| matches!(item, Inline::Break))
            .enumerate()
        {
            let first = if idx == 0 { &first } else { &rest };
            let wrapped = wrap_styled(segment, self.width, first, &rest);
            self.lines.extend(wrapped);
        }
    }

    fn flush_code_block(&mut self) {
        let Some(code) = self.code_block.take() else {
            return;
        };
        self.gap();
        let (first, rest) = self.prefixes();
        let style = Style::default().fg(self.palette.base_0b);
        let code = code.strip_suffix('\n').unwrap_or(&code);
        for (idx, line) in code.split('\n').enumerate() {
            let mut spans = if idx == 0 { first.clone() } else { rest.clone() };
            spans.push(Span::styled(line.to_string(), style));
            self.lines.push(Line::from(spans));
        }
    }

    fn rule(&mut self) {
        self.flush_block();
        self.gap();
        let len = if self.width == 0 { 40 } else { self.width };
        let style = Style::default().fg(self.palette.base_03);
        self.lines.push(Line::from(Span::styled("─".repeat(len), style)));
    }
}

fn prefix_width(spans: &[Span<'static>]) -> usize {
    spans.iter().map(|span| span.content.width()).sum()
}

/// Wrap a run of styled text with textwrap, then cut the styles back along
/// the wrapped lines. Whitespace is collapsed to single spaces first. A width
/// of zero disables wrapping.
fn wrap_styled(
    segment: &[Inline],
    width: usize,
    first_prefix: &[Span<'static>],
    rest_prefix: &[Span<'static>],
) -> Vec<Line<'static>> {
    let mut plain = String::new();
    // byte range of each styled run within `plain`
    let mut runs: Vec<(usize, usize, Style)> = Vec::new();
    for item in segment {
        let Inline::Text(text, style) = item else {
            continue;
        };
        let start = plain.len();
        for ch in text.chars() {
            if !ch.is_whitespace() {
                plain.push(ch);
            } else if !plain.is_empty() && !plain.ends_with(' ') {
                plain.push(' ');
            }
        }
        if plain.len() > start {
            runs.push((start, plain.len(), *style));
        }
    }

    let wrapped: Vec<String> = if width == 0 {
        vec![plain.clone()]
    } else {
        let first_indent = " ".repeat(prefix_width(first_prefix));
        let rest_indent = " ".repeat(prefix_width(rest_prefix));
        // Deeply nested prefixes still leave one column for text
        let width = width.max(first_indent.len().max(rest_indent.len()) + 1);
        let options = textwrap::Options::new(width)
            .initial_indent(&first_indent)
            .subsequent_indent(&rest_indent)
            .word_separator(WordSeparator::AsciiSpace)
            .wrap_algorithm(WrapAlgorithm::FirstFit);
        textwrap::wrap(&plain, options)
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                let line: &str = line;
                let indent = if idx == 0 { &first_indent } else { &rest_indent };
                line.strip_prefix(indent.as_str()).unwrap_or(line).to_string()
            })
            .collect()
    };

    let mut lines = Vec::with_capacity(wrapped.len());
    let mut pos = 0;
    for (idx, content) in wrapped.iter().enumerate() {
        let mut spans = if idx == 0 {
            first_prefix.to_vec()
        } else {
            rest_prefix.to_vec()
        };
        // Wrapped lines appear in order in `plain`, minus the spaces at breaks
        match plain[pos..].find(content.as_str()) {
            Some(offset) => {
                let start = pos + offset;
                let end = start + content.len();
                for &(run_start, run_end, style) in &runs {
                    let (from, to) = (run_start.max(start), run_end.min(end));
                    if from < to {
                        spans.push(Span::styled(plain[from..to].to_string(), style));
                    }
                }
                pos = end;
            }
            None => spans.push(Span::raw(content.clone())),
        }
        lines.push(Line::from(spans));
    }
    lines
}
