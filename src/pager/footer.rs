//! Status bar and note prompt shown on the pager's last line.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::theme::{
    Appearance, CREAM, FUSCHIA, GREEN, STATUS_BAR_BG, STATUS_BAR_NOTE_FG,
    STATUS_BAR_SCROLL_POS_FG,
};
use crate::widget::text_input::TextInput;

pub const LOGO_TEXT: &str = " Glimmer ";
pub const NOTE_HEADING_TEXT: &str = " Set Memo ";
pub const NOTE_PROMPT_TEXT: &str = " > ";
pub const NOTE_PLACEHOLDER: &str = "(No title)";

/// Cut `s` down to at most `width` display columns, marking the cut with an
/// ellipsis.
pub fn truncate(s: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if s.width() <= width {
        return s.to_string();
    }

    let budget = width - 1;
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Four columns, `"  0%"` through `"100%"`.
pub fn scroll_percent_label(fraction: f64) -> String {
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    format!("{:>3.0}%", fraction * 100.0)
}

/// Columns left for the edit buffer once heading, prompt and cursor are drawn.
/// Never below one, since a zero-width input would stop scrolling.
pub fn note_input_width(total_width: u16) -> u16 {
    let reserved = NOTE_HEADING_TEXT.width() + NOTE_PROMPT_TEXT.width() + 1;
    (total_width as usize).saturating_sub(reserved).max(1) as u16
}

fn logo_span() -> Span<'static> {
    Span::styled(
        LOGO_TEXT,
        Style::default()
            .fg(CREAM)
            .bg(FUSCHIA)
            .add_modifier(Modifier::BOLD),
    )
}

/// Browse-mode footer: logo, note, padding and scroll position.
pub fn status_bar(
    width: u16,
    note: &str,
    scroll_fraction: f64,
    appearance: Appearance,
) -> Line<'static> {
    let bg = STATUS_BAR_BG.resolve(appearance);
    let width = width as usize;

    let percent_text = format!(" {} ", scroll_percent_label(scroll_fraction));
    let percent = Span::styled(
        percent_text.clone(),
        Style::default()
            .fg(STATUS_BAR_SCROLL_POS_FG.resolve(appearance))
            .bg(bg),
    );

    let note = if note.is_empty() {
        NOTE_PLACEHOLDER
    } else {
        note
    };
    let budget = width.saturating_sub(LOGO_TEXT.width() + percent_text.width());
    let note_text = truncate(&format!(" {note} "), budget);

    let padding = width.saturating_sub(LOGO_TEXT.width() + note_text.width() + percent_text.width());

    Line::from(vec![
        logo_span(),
        Span::styled(
            note_text,
            Style::default()
                .fg(STATUS_BAR_NOTE_FG.resolve(appearance))
                .bg(bg),
        ),
        Span::styled(" ".repeat(padding), Style::default().bg(bg)),
        percent,
    ])
}

/// EditNote footer: heading followed by the live input line.
pub fn note_prompt(input: &TextInput) -> Line<'static> {
    let heading = Span::styled(
        NOTE_HEADING_TEXT,
        Style::default().fg(CREAM).bg(GREEN),
    );
    let mut spans = vec![heading];
    spans.extend(input.view().spans);
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line<'static>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn truncate_handles_zero_width() {
        assert_eq!(truncate("anything", 0), "");
        assert_eq!(truncate("", 0), "");
    }

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("note", 4), "note");
        assert_eq!(truncate("note", 40), "note");
    }

    #[test]
    fn truncate_never_exceeds_width() {
        let s = "a fairly long note about the document";
        for width in 0..=s.len() + 2 {
            let out = truncate(s, width);
            assert!(out.width() <= width, "{out:?} wider than {width}");
        }
        assert_eq!(truncate(s, 8), "a fairl…");
        assert_eq!(truncate(s, 1), "…");
    }

    #[test]
    fn truncate_respects_wide_chars() {
        let out = truncate("日本語のメモ", 5);
        assert!(out.width() <= 5);
        assert_eq!(out, "日本…");
    }

    #[test]
    fn percent_label_is_clamped() {
        assert_eq!(scroll_percent_label(0.0), "  0%");
        assert_eq!(scroll_percent_label(1.0), "100%");
        assert_eq!(scroll_percent_label(0.42), " 42%");
        assert_eq!(scroll_percent_label(-3.0), "  0%");
        assert_eq!(scroll_percent_label(7.5), "100%");
        assert_eq!(scroll_percent_label(f64::NAN), "  0%");
        assert_eq!(scroll_percent_label(f64::INFINITY), "100%");
    }

    #[test]
    fn status_bar_fills_the_width() {
        let line = status_bar(80, "", 0.0, Appearance::Dark);
        let text = plain(&line);
        assert_eq!(text.width(), 80);
        assert!(text.starts_with(" Glimmer  (No title) "));
        assert!(text.ends_with("   0% "));
    }

    #[test]
    fn status_bar_truncates_long_notes() {
        let note = "x".repeat(200);
        let line = status_bar(40, &note, 0.5, Appearance::Light);
        let text = plain(&line);
        assert_eq!(text.width(), 40);
        assert!(text.contains('…'));
        assert!(text.ends_with("  50% "));
    }

    #[test]
    fn status_bar_on_tiny_terminal_does_not_panic() {
        for width in 0..20 {
            let line = status_bar(width, "note", 1.0, Appearance::Dark);
            // logo and percent are fixed; only note and padding shrink
            let text = plain(&line);
            assert!(text.contains("Glimmer"));
            assert!(text.contains("100%"));
        }
    }

    #[test]
    fn note_prompt_shows_heading_prompt_and_value() {
        let mut input = TextInput::new(NOTE_PROMPT_TEXT);
        input.set_value("draft");
        input.cursor_end();
        assert_eq!(plain(&note_prompt(&input)), " Set Memo  > draft ");
    }

    #[test]
    fn input_width_never_reaches_zero() {
        assert_eq!(note_input_width(80), 80 - 10 - 3 - 1);
        assert_eq!(note_input_width(15), 1);
        assert_eq!(note_input_width(14), 1);
        assert_eq!(note_input_width(5), 1);
        assert_eq!(note_input_width(0), 1);
    }
}
