//! Markdown → ratatui `Text` for the preview pane.
//!
//! Notes are read, not edited, here, so the renderer favours a calm page:
//! headings are underlined rather than prefixed with `#`, fenced code sits
//! on the theme's code background, and links keep only their text.
//! Everything is colored from the active [`Theme`].

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::core::theme::Theme;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const FALLBACK_CODE_THEME: &str = "base16-ocean.dark";
const TAB: &str = "    ";

/// Render `content` as styled text in `theme`'s colors.
pub fn render(content: &str, theme: &Theme) -> Text<'static> {
    let opts = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut page = Page::new(theme);
    for event in Parser::new_ext(content, opts) {
        page.feed(event);
    }
    page.lines.into()
}

/// State of the fenced block being read, if any.
enum Fence {
    Plain,
    Highlighted(Box<HighlightLines<'static>>),
}

enum Bullet {
    Dash,
    Number(u64),
}

struct Page {
    lines: Vec<Line<'static>>,
    fg: Color,
    muted: Color,
    accent: Color,
    code_bg: Color,
    code_theme: &'static str,
    /// Inline modifiers in effect, innermost last.
    inline: Vec<Style>,
    quote_depth: usize,
    bullets: Vec<Bullet>,
    fence: Option<Fence>,
    /// The last line is a bare list marker; a loose item's paragraph
    /// continues on it.
    fresh_item: bool,
    /// A finished block is waiting for a blank separator line.
    gap: bool,
}

impl Page {
    fn new(theme: &Theme) -> Self {
        Self {
            lines: Vec::new(),
            fg: theme.foreground,
            muted: theme.muted,
            accent: theme.accent,
            code_bg: theme.border,
            code_theme: theme.code_theme,
            inline: Vec::new(),
            quote_depth: 0,
            bullets: Vec::new(),
            fence: None,
            fresh_item: false,
            gap: false,
        }
    }

    fn current_style(&self) -> Style {
        self.inline
            .iter()
            .fold(Style::default().fg(self.fg), |acc, s| acc.patch(*s))
    }

    fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Start a fresh line carrying the blockquote gutter.
    fn new_line(&mut self) {
        let gutter: Vec<Span<'static>> = (0..self.quote_depth)
            .map(|_| Span::styled("▎ ", Style::default().fg(self.muted)))
            .collect();
        self.lines.push(Line::from(gutter));
    }

    fn append(&mut self, span: Span<'static>) {
        if self.lines.is_empty() {
            self.new_line();
        }
        if let Some(line) = self.lines.last_mut() {
            line.push_span(span);
        }
    }

    fn begin_block(&mut self) {
        if self.gap {
            self.new_line();
            self.gap = false;
        }
    }

    fn feed(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text.replace('\t', TAB)),
            Event::Code(code) => {
                let style = Style::default().fg(self.fg).bg(self.code_bg);
                self.append(Span::styled(code.to_string(), style));
            }
            Event::SoftBreak => self.append(Span::raw(" ")),
            Event::HardBreak => self.new_line(),
            Event::Rule => {
                self.begin_block();
                self.new_line();
                self.append(Span::styled("· · ·", self.muted()));
                self.gap = true;
            }
            Event::TaskListMarker(done) => {
                let span = if done {
                    Span::styled("✓ ", Style::default().fg(self.accent))
                } else {
                    Span::styled("○ ", self.muted())
                };
                self.append(span);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph if self.fresh_item => {
                self.fresh_item = false;
                self.gap = false;
            }
            Tag::Paragraph => {
                self.begin_block();
                self.new_line();
            }
            Tag::Heading { level, .. } => {
                self.begin_block();
                self.new_line();
                self.inline.push(heading_style(self.accent, self.fg, level));
            }
            Tag::BlockQuote(_) => {
                self.begin_block();
                self.quote_depth += 1;
                self.inline
                    .push(Style::default().add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock(kind) => {
                self.begin_block();
                let lang = match &kind {
                    CodeBlockKind::Fenced(lang) => lang.split_whitespace().next().unwrap_or(""),
                    CodeBlockKind::Indented => "",
                };
                if !lang.is_empty() {
                    self.new_line();
                    self.append(Span::styled(
                        lang.to_owned(),
                        self.muted().add_modifier(Modifier::BOLD),
                    ));
                }
                self.fence = Some(self.fence_for(lang));
            }
            Tag::List(start) => {
                if self.bullets.is_empty() {
                    self.begin_block();
                }
                self.bullets
                    .push(start.map_or(Bullet::Dash, Bullet::Number));
            }
            Tag::Item => {
                self.new_line();
                let indent = "  ".repeat(self.bullets.len().saturating_sub(1));
                let marker = match self.bullets.last_mut() {
                    Some(Bullet::Number(n)) => {
                        *n += 1;
                        format!("{indent}{}. ", *n - 1)
                    }
                    _ => format!("{indent}• "),
                };
                self.append(Span::styled(marker, self.muted()));
                self.fresh_item = true;
            }
            Tag::Emphasis => self.inline.push(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.inline.push(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self
                .inline
                .push(Style::default().add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { .. } => self.inline.push(
                Style::default()
                    .fg(self.accent)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.gap = true,
            TagEnd::Heading(level) => {
                self.inline.pop();
                self.underline(level);
                self.gap = true;
            }
            TagEnd::BlockQuote(_) => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.inline.pop();
                self.gap = true;
            }
            TagEnd::CodeBlock => {
                self.fence = None;
                self.gap = true;
            }
            TagEnd::List(_) => {
                self.bullets.pop();
                if self.bullets.is_empty() {
                    self.gap = true;
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.inline.pop();
            }
            _ => {}
        }
    }

    fn fence_for(&self, lang: &str) -> Fence {
        if lang.is_empty() {
            return Fence::Plain;
        }
        let syntax = SYNTAX_SET.find_syntax_by_token(lang);
        let theme = THEME_SET
            .themes
            .get(self.code_theme)
            .or_else(|| THEME_SET.themes.get(FALLBACK_CODE_THEME));
        match (syntax, theme) {
            (Some(syntax), Some(theme)) => {
                Fence::Highlighted(Box::new(HighlightLines::new(syntax, theme)))
            }
            _ => Fence::Plain,
        }
    }

    fn text(&mut self, text: &str) {
        self.fresh_item = false;
        match self.fence.take() {
            Some(Fence::Highlighted(mut hl)) => {
                for source in LinesWithEndings::from(text) {
                    let spans = match hl.highlight_line(source, &SYNTAX_SET) {
                        Ok(ranges) => ranges
                            .into_iter()
                            .map(|(style, frag)| {
                                let fg = style.foreground;
                                Span::styled(
                                    frag.trim_end_matches('\n').to_owned(),
                                    Style::default()
                                        .fg(Color::Rgb(fg.r, fg.g, fg.b))
                                        .bg(self.code_bg),
                                )
                            })
                            .collect(),
                        Err(_) => vec![self.code_span(source.trim_end_matches('\n'))],
                    };
                    self.code_line(spans);
                }
                self.fence = Some(Fence::Highlighted(hl));
            }
            Some(Fence::Plain) => {
                for source in text.lines() {
                    let span = self.code_span(source);
                    self.code_line(vec![span]);
                }
                self.fence = Some(Fence::Plain);
            }
            None => {
                let style = self.current_style();
                self.append(Span::styled(text.to_owned(), style));
            }
        }
    }

    fn code_span(&self, source: &str) -> Span<'static> {
        Span::styled(
            source.to_owned(),
            Style::default().fg(self.fg).bg(self.code_bg),
        )
    }

    fn code_line(&mut self, spans: Vec<Span<'static>>) {
        self.new_line();
        self.append(Span::styled("  ", Style::default().bg(self.code_bg)));
        for span in spans {
            self.append(span);
        }
    }

    /// Draw a rule under the heading just written, as wide as its text.
    fn underline(&mut self, level: HeadingLevel) {
        let glyph = match level {
            HeadingLevel::H1 => "═",
            HeadingLevel::H2 => "─",
            _ => return,
        };
        let gutter = 2 * self.quote_depth;
        let width = self
            .lines
            .last()
            .map(|line| line.width().saturating_sub(gutter))
            .unwrap_or(0)
            .max(1);
        self.new_line();
        self.append(Span::styled(glyph.repeat(width), Style::default().fg(self.accent)));
    }
}

/// Top two levels take the theme accent; deeper ones stay in body color.
fn heading_style(accent: Color, fg: Color, level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 | HeadingLevel::H2 => {
            Style::default().fg(accent).add_modifier(Modifier::BOLD)
        }
        _ => Style::default()
            .fg(fg)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
    }
}
