use std::{path::Path, sync::LazyLock};

use eyre::WrapErr;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use syntect::{
    highlighting::{self, FontStyle, HighlightIterator, HighlightState, ThemeSet},
    parsing::{ParseState, ScopeStack, SyntaxSet},
};

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const TAB: &str = "    ";

/// Turns source text into styled lines, one per input line
pub trait Highlighter {
    fn highlight(&self, text: &str, language: &str) -> eyre::Result<Vec<Line<'static>>>;
}

/// Language token for a file, taken from its extension
pub fn language_for(path: &Path) -> &str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("txt")
}

pub struct SyntectHighlighter {
    theme: highlighting::Theme,
}

impl SyntectHighlighter {
    pub fn new(theme_name: &str) -> eyre::Result<Self> {
        let Some(theme) = THEME_SET.themes.get(theme_name) else {
            let available: Vec<_> = THEME_SET.themes.keys().map(String::as_str).collect();
            eyre::bail!(
                "unknown highlight theme {theme_name:?}, available themes: {}",
                available.join(", ")
            );
        };
        Ok(Self {
            theme: theme.clone(),
        })
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, text: &str, language: &str) -> eyre::Result<Vec<Line<'static>>> {
        let syntax = SYNTAX_SET
            .find_syntax_by_token(language)
            .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
        let highlighter = highlighting::Highlighter::new(&self.theme);
        let mut highlight_state = HighlightState::new(&highlighter, ScopeStack::new());
        let mut parse_state = ParseState::new(syntax);

        let mut lines = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line_with_newline = format!("{line}\n");
            let ops = parse_state
                .parse_line(&line_with_newline, &SYNTAX_SET)
                .wrap_err_with(|| format!("highlighting line {}", i + 1))?;
            let spans: Vec<Span<'static>> = HighlightIterator::new(
                &mut highlight_state,
                &ops,
                &line_with_newline,
                &highlighter,
            )
            .filter_map(|(style, piece)| {
                let piece = piece.trim_end_matches('\n');
                (!piece.is_empty())
                    .then(|| Span::styled(piece.replace('\t', TAB), convert_style(style)))
            })
            .collect();
            lines.push(Line::from(spans));
        }
        Ok(lines)
    }
}

fn convert_style(style: highlighting::Style) -> Style {
    let fg = style.foreground;
    let mut converted = Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b));
    if style.font_style.contains(FontStyle::BOLD) {
        converted = converted.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        converted = converted.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        converted = converted.add_modifier(Modifier::UNDERLINED);
    }
    converted
}

/// Highlighter that applies no styling
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, text: &str, _language: &str) -> eyre::Result<Vec<Line<'static>>> {
        Ok(text
            .lines()
            .map(|line| Line::raw(line.replace('\t', TAB)))
            .collect())
    }
}
