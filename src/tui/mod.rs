use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::parser::{Cell, Dataset};

pub mod run;
pub use run::run_viewer;

const DEFAULT_PAGE_SIZE: usize = 10;

pub enum Action {
    Continue,
    Quit,
}

pub trait View {
    fn render(&mut self, frame: &mut Frame) -> Result<()>;
    fn handle_input(&mut self, event: Event) -> Result<Action>;
}

/// Scrollable table of one scrape result with a status line underneath
pub struct ResultsTable {
    title: String,
    dataset: Dataset,
    error: Option<String>,
    state: TableState,
    page_size: usize,
    show_help: bool,
}

impl ResultsTable {
    pub fn new(title: impl Into<String>, dataset: Dataset, error: Option<String>) -> Self {
        let mut state = TableState::default();
        if !dataset.is_empty() {
            state.select(Some(0));
        }

        Self {
            title: title.into(),
            dataset,
            error,
            state,
            page_size: DEFAULT_PAGE_SIZE,
            show_help: false,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.selected()
    }

    fn move_by(&mut self, delta: isize) {
        if self.dataset.is_empty() {
            return;
        }
        let last = self.dataset.len() - 1;
        let current = self.state.selected().unwrap_or(0);
        let next = if delta.is_negative() {
            current.saturating_sub(delta.unsigned_abs())
        } else {
            current.saturating_add(delta as usize).min(last)
        };
        self.state.select(Some(next));
    }

    fn select_first(&mut self) {
        if !self.dataset.is_empty() {
            self.state.select(Some(0));
        }
    }

    fn select_last(&mut self) {
        if !self.dataset.is_empty() {
            self.state.select(Some(self.dataset.len() - 1));
        }
    }

    fn status_line(&self) -> Line<'static> {
        if let Some(ref message) = self.error {
            return Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red)));
        }

        let position = match self.state.selected() {
            Some(i) => format!("row {} of {}", i + 1, self.dataset.len()),
            None => "no rows".to_string(),
        };
        Line::from(vec![
            Span::styled(position, Style::default().fg(Color::Green)),
            Span::raw("  q quit  ? help"),
        ])
    }

    // numeric columns stay narrow, the text body takes what is left
    fn column_widths(&self) -> Vec<Constraint> {
        let first_row = self.dataset.rows().first();
        self.dataset
            .columns()
            .iter()
            .enumerate()
            .map(|(i, name)| match (i, first_row.and_then(|row| row.get(i))) {
                (_, Some(Cell::Int(_))) => Constraint::Length(name.len().max(8) as u16),
                (0, _) => Constraint::Length(19),
                (1, _) => Constraint::Length(20),
                _ => Constraint::Min(20),
            })
            .collect()
    }
}

impl View for ResultsTable {
    fn render(&mut self, frame: &mut Frame) -> Result<()> {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(frame.size());

        // header, borders and header margin
        self.page_size = (chunks[0].height.saturating_sub(4) as usize).max(1);

        let header_cells = self.dataset.columns().iter().map(|h| {
            ratatui::widgets::Cell::from(h.clone())
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        });
        let header = Row::new(header_cells).height(1).bottom_margin(1);

        let rows = self.dataset.rows().iter().map(|row| {
            Row::new(
                row.iter()
                    .map(|cell| ratatui::widgets::Cell::from(cell.to_string().replace('\n', " "))),
            )
        });

        let widths = self.column_widths();
        let table = Table::new(rows)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(self.title.clone()))
            .widths(&widths)
            .highlight_style(Style::default().bg(Color::DarkGray));

        frame.render_stateful_widget(table, chunks[0], &mut self.state);

        let status = Paragraph::new(self.status_line())
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(status, chunks[1]);

        if self.show_help {
            let area = centered_rect(50, 40, frame.size());
            let help = Paragraph::new(vec![
                Line::from("Up/k, Down/j   move one row"),
                Line::from("PgUp, PgDn     move one page"),
                Line::from("Home/g, End/G  first or last row"),
                Line::from("q, Esc         quit"),
            ])
            .block(Block::default().title("Help").borders(Borders::ALL));
            frame.render_widget(Clear, area);
            frame.render_widget(help, area);
        }

        Ok(())
    }

    fn handle_input(&mut self, event: Event) -> Result<Action> {
        if let Event::Key(key) = event {
            if key.kind != KeyEventKind::Press {
                return Ok(Action::Continue);
            }

            if self.show_help {
                if matches!(key.code, KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Esc) {
                    self.show_help = false;
                }
                return Ok(Action::Continue);
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(Action::Quit),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(Action::Quit),
                KeyCode::Down | KeyCode::Char('j') => self.move_by(1),
                KeyCode::Up | KeyCode::Char('k') => self.move_by(-1),
                KeyCode::PageDown => self.move_by(self.page_size as isize),
                KeyCode::PageUp => self.move_by(-(self.page_size as isize)),
                KeyCode::Home | KeyCode::Char('g') => self.select_first(),
                KeyCode::End | KeyCode::Char('G') => self.select_last(),
                KeyCode::Char('?') | KeyCode::Char('h') => self.show_help = true,
                _ => {}
            }
        }

        Ok(Action::Continue)
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
