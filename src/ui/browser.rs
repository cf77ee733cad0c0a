use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, List, ListState, Paragraph, Wrap},
    Frame,
};

use super::Theme;
use crate::app::{highlight_matches, ListItem, Modal, Session};

const LIST_PERCENT: u16 = 30;
const LIST_MIN_WIDTH: u16 = 20;

pub fn render_header(f: &mut Frame, session: &Session, theme: &Theme, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            " Note explorer ",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("› ", Style::default().fg(theme.muted)),
        Span::styled(
            session.current_dir.display().to_string(),
            Style::default().fg(theme.foreground),
        ),
        Span::styled(format!("  [{}]", theme.name), Style::default().fg(theme.muted)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

pub fn render_browser(f: &mut Frame, session: &Session, theme: &Theme, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(list_width(area.width)), Constraint::Min(10)])
        .split(area);

    render_list(f, session, theme, chunks[0]);
    render_preview(f, session, theme, chunks[1]);
}

fn list_width(total: u16) -> u16 {
    let share = u32::from(total) * u32::from(LIST_PERCENT) / 100;
    u16::try_from(share).unwrap_or(u16::MAX).max(LIST_MIN_WIDTH)
}

fn render_list(f: &mut Frame, session: &Session, theme: &Theme, area: Rect) {
    let items: Vec<ratatui::widgets::ListItem> = session
        .items
        .iter()
        .map(|item| {
            let mut line = item_line(item, theme);
            if item.entry().is_some_and(|e| session.is_bookmarked(&e.path)) {
                line.spans
                    .insert(0, Span::styled("★ ", Style::default().fg(theme.warning)));
            }
            line
        })
        .map(ratatui::widgets::ListItem::new)
        .collect();

    let title = format!(" {} ", session.items.len());
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(theme.accent)),
        )
        .highlight_style(
            Style::default()
                .bg(theme.selection)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("› ");

    let mut state = ListState::default();
    if !session.items.is_empty() {
        state.select(Some(session.selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

/// One list row: the title, then the description dimmed.
pub(super) fn item_line(item: &ListItem, theme: &Theme) -> Line<'static> {
    let title_style = match item {
        ListItem::File(entry) if entry.is_error => Style::default().fg(theme.error),
        ListItem::File(entry) if entry.is_dir => Style::default().fg(theme.info),
        ListItem::Link(link) if !link.is_resolved() => Style::default().fg(theme.warning),
        _ => Style::default().fg(theme.foreground),
    };
    let mut spans = vec![Span::styled(item.title(), title_style)];
    let description = item.description();
    if !description.is_empty() {
        spans.push(Span::styled(
            format!("  {}", description),
            Style::default().fg(theme.muted),
        ));
    }
    Line::from(spans)
}

fn render_preview(f: &mut Frame, session: &Session, theme: &Theme, area: Rect) {
    let preview = &session.preview;
    let title = preview
        .path
        .as_deref()
        .and_then(|p| p.file_name())
        .map(|n| format!(" {} ", n.to_string_lossy()))
        .unwrap_or_default();

    let muted = Style::default().fg(theme.muted);
    let text = match (&preview.error, &preview.content, &preview.path) {
        (Some(error), _, _) => Text::styled(error.clone(), Style::default().fg(theme.error)),
        (None, Some(content), _) => match session.note_search_query() {
            Some(query) if !query.is_empty() => {
                highlighted(&highlight_matches(&content.raw, query), theme)
            }
            _ => Text::raw(content.rendered.clone()),
        },
        (None, None, Some(_)) => Text::styled("Loading...", muted),
        (None, None, None) => match session.selected_item() {
            Some(ListItem::File(entry)) if entry.is_dir => {
                Text::styled("Directory: press Enter to open it.", muted)
            }
            _ => Text::styled("Select a file to preview it.", muted),
        },
    };

    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((preview.scroll, 0))
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(theme.accent)),
        );
    f.render_widget(paragraph, area);
}

/// Style the `**⚡ m ⚡**` markers so matches stand out.
fn highlighted(marked: &str, theme: &Theme) -> Text<'static> {
    let match_style = Style::default()
        .fg(theme.warning)
        .add_modifier(Modifier::BOLD | Modifier::REVERSED);
    let lines = marked.lines().map(|line| {
        let mut spans = Vec::new();
        let mut rest = line;
        while let Some(start) = rest.find("**⚡ ") {
            let after = &rest[start + "**⚡ ".len()..];
            let Some(end) = after.find(" ⚡**") else { break };
            if start > 0 {
                spans.push(Span::raw(rest[..start].to_string()));
            }
            spans.push(Span::styled(after[..end].to_string(), match_style));
            rest = &after[end + " ⚡**".len()..];
        }
        if !rest.is_empty() {
            spans.push(Span::raw(rest.to_string()));
        }
        Line::from(spans)
    });
    Text::from(lines.collect::<Vec<_>>())
}

const KEY_HINT: &str = " ? help • ↑/↓ move • Enter open • h back • n new • D delete • r rename • \
                        m .md • / search • ^f content • q quit";

pub fn render_footer(f: &mut Frame, session: &Session, theme: &Theme, area: Rect) {
    let line = match &session.modal {
        Some(Modal::NoteSearch { input }) => Line::from(vec![
            Span::styled(
                " Search in note: ",
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(input.value().to_string(), Style::default().fg(theme.foreground)),
            Span::styled("_", Style::default().fg(theme.accent)),
            Span::styled("   ↑/↓ scroll • Enter/Esc close", Style::default().fg(theme.muted)),
        ]),
        _ => Line::from(Span::styled(KEY_HINT, Style::default().fg(theme.muted))),
    };
    f.render_widget(Paragraph::new(line), area);
}
