use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListState, Paragraph, Wrap},
    Frame,
};

use super::browser::item_line;
use super::{centered, Theme};
use crate::app::{Modal, NoteField, Picker, TextInput};

const POPUP_WIDTH: u16 = 80;
const PICKER_HEIGHT: u16 = 18;

const HELP: &[(&str, &str)] = &[
    ("j/k ↑/↓", "move"),
    ("gg / G", "top / bottom"),
    ("ctrl+d / ctrl+u", "half page down / up"),
    ("enter l →", "open directory or preview note"),
    ("h ← -", "parent directory"),
    ("~", "home directory as new root"),
    ("ctrl+o / tab", "back / forward"),
    ("u / d", "scroll preview"),
    ("n / N", "new note / new directory"),
    ("r / D", "rename / delete"),
    ("e", "edit in external editor"),
    ("c / x / p", "copy / cut / paste"),
    ("y / Y", "copy path / copy content"),
    ("b / B", "toggle bookmark / bookmarks"),
    ("ctrl+r", "recent files"),
    ("L", "links of the current note"),
    ("F", "search in note"),
    ("/", "fuzzy search under the root"),
    ("ctrl+f", "content search under the root"),
    ("m / . / s", "markdown only / hidden / sort"),
    ("R", "refresh"),
    ("t", "cycle theme"),
    ("q", "quit"),
];

pub fn render_modal(f: &mut Frame, modal: &Modal, theme: &Theme) {
    let area = f.area();
    match modal {
        Modal::CreateNote(form) => {
            let popup = popup(f, area, 9, " New note ", theme);
            let name_label = field_label("Name", form.focus == NoteField::Name, theme);
            let body_label = field_label("Body", form.focus == NoteField::Body, theme);
            let lines = vec![
                name_label,
                input_line(&form.name, form.focus == NoteField::Name, theme),
                body_label,
                input_line(&form.body, form.focus == NoteField::Body, theme),
                Line::from(""),
                hint("Tab switch field • Enter on name or ctrl+s save • Esc cancel", theme),
            ];
            f.render_widget(Paragraph::new(lines), popup);
        }
        Modal::ConfirmDelete { name, .. } => {
            let popup = popup(f, area, 5, " Delete ", theme);
            let lines = vec![
                Line::from(vec![
                    Span::raw("Delete "),
                    Span::styled(
                        name.clone(),
                        Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("?"),
                ]),
                Line::from(""),
                hint("y confirm • n/Esc cancel", theme),
            ];
            f.render_widget(Paragraph::new(lines), popup);
        }
        Modal::Rename {
            original, input, ..
        } => {
            let popup = popup(f, area, 6, " Rename ", theme);
            let lines = vec![
                Line::from(Span::styled(
                    format!("Renaming {}", original),
                    Style::default().fg(theme.muted),
                )),
                input_line(input, true, theme),
                Line::from(""),
                hint("Enter confirm • Esc cancel", theme),
            ];
            f.render_widget(Paragraph::new(lines), popup);
        }
        Modal::CreateDir { input } => {
            let popup = popup(f, area, 5, " New directory ", theme);
            let lines = vec![
                input_line(input, true, theme),
                Line::from(""),
                hint("Enter create • Esc cancel", theme),
            ];
            f.render_widget(Paragraph::new(lines), popup);
        }
        Modal::RecentFiles(picker) => render_picker(
            f,
            area,
            " Recent files ",
            picker,
            "No recent files",
            "Enter open • a-z jump • Esc close",
            theme,
        ),
        Modal::Bookmarks(picker) => render_picker(
            f,
            area,
            " Bookmarks ",
            picker,
            "No bookmarks",
            "Enter open • a-z jump • D remove • Esc close",
            theme,
        ),
        Modal::Links(picker) => render_picker(
            f,
            area,
            " Links ",
            picker,
            "No links",
            "Enter open or create • a-z jump • Esc close",
            theme,
        ),
        Modal::Help => render_help(f, area, theme),
        Modal::ListSearch(search) => {
            let empty = if search.indexing {
                "Indexing..."
            } else {
                "No matches"
            };
            render_search(
                f,
                area,
                " Search ",
                &search.input,
                &search.results,
                empty,
                "Enter open • ↑/↓ move • Esc close",
                theme,
            );
        }
        Modal::ContentSearch(search) => {
            let empty = if search.searching {
                "Searching..."
            } else if search.last_query.is_some() {
                "No matches"
            } else {
                "Type a query and press Enter"
            };
            render_search(
                f,
                area,
                " Content search ",
                &search.input,
                &search.results,
                empty,
                "Enter search, Enter again to open • ↑/↓ move • Esc close",
                theme,
            );
        }
        // Drawn in the footer so the preview stays visible.
        Modal::NoteSearch { .. } => {}
    }
}

/// Clear a centered popup of `height` inner rows and return its inner area.
fn popup(f: &mut Frame, area: Rect, height: u16, title: &str, theme: &Theme) -> Rect {
    let outer = centered(area, POPUP_WIDTH, height + 2);
    f.render_widget(Clear, outer);
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.accent))
        .style(Style::default().bg(theme.background_secondary));
    let inner = block.inner(outer);
    f.render_widget(block, outer);
    inner
}

fn field_label(label: &str, focused: bool, theme: &Theme) -> Line<'static> {
    let style = if focused {
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.muted)
    };
    Line::from(Span::styled(label.to_string(), style))
}

/// The input's text with a block cursor when focused.
fn input_line(input: &TextInput, focused: bool, theme: &Theme) -> Line<'static> {
    let text = Style::default().fg(theme.foreground);
    if !focused {
        return Line::from(Span::styled(format!("  {}", input.value()), text));
    }
    let chars: Vec<char> = input.value().chars().collect();
    let cursor = input.cursor().min(chars.len());
    let before: String = chars[..cursor].iter().collect();
    let at = chars.get(cursor).map(|c| c.to_string()).unwrap_or_else(|| " ".into());
    let after: String = chars.get(cursor + 1..).map(|s| s.iter().collect()).unwrap_or_default();
    Line::from(vec![
        Span::styled("› ", Style::default().fg(theme.accent)),
        Span::styled(before, text),
        Span::styled(at, text.add_modifier(Modifier::REVERSED)),
        Span::styled(after, text),
    ])
}

fn hint(text: &str, theme: &Theme) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), Style::default().fg(theme.muted)))
}

fn picker_list(picker: &Picker, theme: &Theme) -> (List<'static>, ListState) {
    let items: Vec<ratatui::widgets::ListItem> = picker
        .items
        .iter()
        .map(|item| ratatui::widgets::ListItem::new(item_line(item, theme)))
        .collect();
    let list = List::new(items)
        .highlight_style(Style::default().bg(theme.selection).add_modifier(Modifier::BOLD))
        .highlight_symbol("› ");
    let mut state = ListState::default();
    if !picker.items.is_empty() {
        state.select(Some(picker.selected));
    }
    (list, state)
}

fn render_picker(
    f: &mut Frame,
    area: Rect,
    title: &str,
    picker: &Picker,
    empty: &str,
    keys: &str,
    theme: &Theme,
) {
    let inner = popup(f, area, PICKER_HEIGHT, title, theme);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    if picker.items.is_empty() {
        f.render_widget(Paragraph::new(hint(empty, theme)), chunks[0]);
    } else {
        let (list, mut state) = picker_list(picker, theme);
        f.render_stateful_widget(list, chunks[0], &mut state);
    }
    f.render_widget(Paragraph::new(hint(keys, theme)), chunks[1]);
}

#[allow(clippy::too_many_arguments)]
fn render_search(
    f: &mut Frame,
    area: Rect,
    title: &str,
    input: &TextInput,
    results: &Picker,
    empty: &str,
    keys: &str,
    theme: &Theme,
) {
    let inner = popup(f, area, PICKER_HEIGHT, title, theme);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    f.render_widget(Paragraph::new(input_line(input, true, theme)), chunks[0]);
    let count = if results.items.is_empty() {
        String::new()
    } else {
        format!("{}/{}", results.selected + 1, results.items.len())
    };
    f.render_widget(Paragraph::new(hint(&count, theme)), chunks[1]);

    if results.items.is_empty() {
        f.render_widget(Paragraph::new(hint(empty, theme)), chunks[2]);
    } else {
        let (list, mut state) = picker_list(results, theme);
        f.render_stateful_widget(list, chunks[2], &mut state);
    }
    f.render_widget(Paragraph::new(hint(keys, theme)), chunks[3]);
}

fn render_help(f: &mut Frame, area: Rect, theme: &Theme) {
    let inner = popup(f, area, HELP.len() as u16 + 2, " Help ", theme);
    let mut lines: Vec<Line> = HELP
        .iter()
        .map(|(keys, action)| {
            Line::from(vec![
                Span::styled(
                    format!("{:>18}  ", keys),
                    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
                ),
                Span::styled(action.to_string(), Style::default().fg(theme.foreground)),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(hint("Esc, ? or q to close", theme));
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
