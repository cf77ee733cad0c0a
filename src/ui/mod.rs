mod browser;
mod home;
mod modal;
mod status_bar;
pub mod theme;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::{Screen, Session};

pub use theme::Theme;

/// Rows taken by everything around the file list: the header, the status
/// bar, the footer and the list's two borders.
const CHROME_ROWS: u16 = 5;

/// How many list rows fit in a terminal `height` rows tall.
pub fn list_rows(height: u16) -> u16 {
    height.saturating_sub(CHROME_ROWS).max(1)
}

pub fn draw(f: &mut Frame, session: &Session) {
    let theme = theme::get(session.theme_index);
    let area = f.area();

    match session.screen {
        Screen::Home => home::render_home(f, theme, area),
        Screen::Browsing => {
            let [header, status, body, footer] = split(area);
            browser::render_header(f, session, theme, header);
            status_bar::render_status_bar(f, session, theme, status);
            browser::render_browser(f, session, theme, body);
            browser::render_footer(f, session, theme, footer);
        }
    }

    if let Some(modal) = &session.modal {
        modal::render_modal(f, modal, theme);
    }
}

fn split(area: Rect) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

/// A rectangle of at most `width` x `height` centered in `area`.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2)).max(1);
    let height = height.min(area.height.saturating_sub(2)).max(1);
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}
