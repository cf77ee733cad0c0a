use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph},
    Frame,
};

use super::{centered, Theme};

const TITLE: [&str; 5] = [
    " _   _  ___ _____ _____ ____    __  __ ____  ",
    "| \\ | |/ _ \\_   _| ____/ ___|  |  \\/  |  _ \\ ",
    "|  \\| | | | || | |  _| \\___ \\  | |\\/| | | | |",
    "| |\\  | |_| || | | |___ ___) |_| |  | | |_| |",
    "|_| \\_|\\___/ |_| |_____|____/(_)_|  |_|____/ ",
];

pub fn render_home(f: &mut Frame, theme: &Theme, area: Rect) {
    let mut lines: Vec<Line> = TITLE
        .iter()
        .map(|row| {
            Line::from(Span::styled(
                *row,
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ))
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "NOTES.md",
        Style::default().fg(theme.info).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        "Press Enter to start  •  t theme  •  ? help  •  q quit",
        Style::default().fg(theme.muted),
    )));

    let width = 64;
    let height = lines.len() as u16 + 4;
    let card = centered(area, width, height);

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.accent))
            .padding(Padding::vertical(1)),
    );
    f.render_widget(paragraph, card);
}
