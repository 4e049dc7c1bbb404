use crate::parser::Dataset;
use crate::tui::{Action, ResultsTable, View};
use anyhow::Result;
use crossterm::{event, execute, terminal};
use ratatui::prelude::{CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;

/// Show the dataset full screen until the user quits
pub async fn run_viewer(title: &str, dataset: Dataset, error: Option<String>) -> Result<()> {
    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut view = ResultsTable::new(title, dataset, error);
    let result = event_loop(&mut terminal, &mut view).await;

    // restore the terminal even when the loop failed
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, view: &mut ResultsTable) -> Result<()> {
    loop {
        let mut render_result = Ok(());
        terminal.draw(|f| {
            render_result = view.render(f);
        })?;
        render_result?;

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            input = async {
                if event::poll(Duration::from_millis(100))? {
                    Ok::<Option<event::Event>, anyhow::Error>(Some(event::read()?))
                } else {
                    Ok(None)
                }
            } => {
                if let Some(input_event) = input? {
                    if let Action::Quit = view.handle_input(input_event)? {
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
