//! Open files list component.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::domain::model::PanelEntry;

/// Renders panel entries as a selectable list with the file path beside each name.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileList;

impl FileList {
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        title: &str,
        entries: &[PanelEntry],
        selected: Option<usize>,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{title} ({})", entries.len()));

        if entries.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let placeholder = Paragraph::new("No open files").style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            );
            frame.render_widget(placeholder, inner);
            return;
        }

        let items: Vec<ListItem> = entries.iter().map(entry_item).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        let mut state = ListState::default();
        state.select(selected.filter(|index| *index < entries.len()));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

fn entry_item(entry: &PanelEntry) -> ListItem<'static> {
    ListItem::new(Line::from(vec![
        Span::styled(
            format!("[{}] ", entry.icon_hint),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw(entry.label.clone()),
        Span::styled(
            format!("  {}", entry.tooltip),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
}
