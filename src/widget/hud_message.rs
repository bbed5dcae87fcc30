use std::time::{Duration, Instant};

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};

use crate::theme::{Appearance, Base16Palette};

pub const HUD_DURATION: Duration = Duration::from_secs(3);
pub const ERROR_HUD_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudMode {
    Normal,
    Error,
}

/// Short-lived message drawn over the body, one line above the footer.
#[derive(Debug, Clone)]
pub struct HudMessage {
    pub message: String,
    pub expires_at: Instant,
    pub mode: HudMode,
}

impl HudMessage {
    pub fn new(message: impl Into<String>, duration: Duration, mode: HudMode) -> Self {
        Self {
            message: message.into(),
            expires_at: Instant::now() + duration,
            mode,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, HUD_DURATION, HudMode::Normal)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, ERROR_HUD_DURATION, HudMode::Error)
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn styled_line(&self, appearance: Appearance) -> Line<'static> {
        let palette = Base16Palette::for_appearance(appearance);
        let style = match self.mode {
            HudMode::Normal => Style::default()
                .fg(palette.base_06)
                .bg(palette.base_02)
                .add_modifier(Modifier::BOLD),
            HudMode::Error => Style::default()
                .fg(palette.base_07)
                .bg(palette.base_08)
                .add_modifier(Modifier::BOLD),
        };

        Line::from(vec![Span::styled(format!(" {} ", self.message), style)]).centered()
    }

    /// Draw on the last body row of `area`, which includes the footer row.
    pub fn render(&self, f: &mut Frame, area: Rect, appearance: Appearance) {
        if area.height < 2 {
            return;
        }
        let row = Rect::new(area.x, area.y + area.height - 2, area.width, 1);
        f.render_widget(Clear, row);
        f.render_widget(Paragraph::new(self.styled_line(appearance)), row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_expire() {
        let hud = HudMessage::new("gone", Duration::ZERO, HudMode::Normal);
        assert!(hud.is_expired());
        assert!(!HudMessage::info("still here").is_expired());
    }

    #[test]
    fn message_is_padded() {
        let line = HudMessage::error("can't set note").styled_line(Appearance::Dark);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, " can't set note ");
    }
}
