use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::Theme;
use crate::app::Session;

const SEPARATOR: &str = "  |  ";

/// Directory name, counts, mode, filter badges and the transient message.
pub fn render_status_bar(f: &mut Frame, session: &Session, theme: &Theme, area: Rect) {
    let base = Style::default().fg(Color::Black).bg(theme.accent);

    let mut parts = vec![format!("📁 {}", dir_label(session))];
    let (files, dirs) = session.counts();
    if files > 0 || dirs > 0 {
        parts.push(format!("{} files, {} dirs", files, dirs));
    }
    parts.push(format!("mode: {}", session.mode_label()));
    let badges = session.filters.badges();
    if !badges.is_empty() {
        parts.push(badges.join(" "));
    }

    let mut spans = vec![Span::styled(format!(" {}", parts.join(SEPARATOR)), base)];
    if let Some(status) = &session.status {
        spans.push(Span::styled(SEPARATOR, base));
        spans.push(Span::styled(
            status.text.clone(),
            base.add_modifier(Modifier::BOLD),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).style(base), area);
}

fn dir_label(session: &Session) -> String {
    session
        .current_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| session.current_dir.display().to_string())
}
