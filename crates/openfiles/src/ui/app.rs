//! Interactive terminal rendition of the panel, driven by a [`LocalHost`].

use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::infra::config::Config;
use crate::infra::dispatch::UiQueue;
use crate::infra::local_host::LocalHost;
use crate::ui::action::{ActionEvent, ActionRegistry, RefreshOpenFilesAction};
use crate::ui::components::file_list::FileList;
use crate::ui::panel::{NoticeLevel, OpenFilesPanel, PanelCommand};
use crate::ui::tool_window::{ProjectContext, create_tool_window_content};

const TICK_RATE: Duration = Duration::from_millis(120);

/// Event loop hosting one panel in the terminal.
pub struct PanelApp {
    host: Arc<LocalHost>,
    project: ProjectContext,
    panel: Arc<OpenFilesPanel>,
    actions: ActionRegistry,
    file_list: FileList,
    selected: usize,
    status: Option<StatusMessage>,
    should_quit: bool,
}

impl PanelApp {
    pub fn new(host: Arc<LocalHost>, config: Config) -> Result<Self> {
        let project = ProjectContext::new(host.clone(), UiQueue::new(), config);
        let panel =
            create_tool_window_content(&project).context("failed to create open files panel")?;
        Ok(Self {
            host,
            project,
            panel,
            actions: ActionRegistry::with_defaults(),
            file_list: FileList,
            selected: 0,
            status: None,
            should_quit: false,
        })
    }

    /// Launch the terminal UI and enter the event loop.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        enter_alternate_screen(&mut stdout, || {
            disable_raw_mode().ok();
        })?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = match Terminal::new(backend) {
            Ok(terminal) => terminal,
            Err(err) => {
                disable_raw_mode().ok();
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                return Err(err).context("failed to initialize terminal");
            }
        };
        terminal.hide_cursor().ok();

        self.panel.on_show();
        let event_loop_result = self.event_loop(&mut terminal);
        self.panel.on_dispose();

        disable_raw_mode().ok();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        event_loop_result
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.tick();
            terminal.draw(|frame| self.render(frame))?;

            if self.should_quit {
                break;
            }

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    /// Run queued host work and fold panel notices into the status line.
    pub fn tick(&mut self) {
        self.project.queue.drain();

        if let Some(notice) = self.panel.take_notice() {
            self.status = Some(StatusMessage::new(notice.level, notice.text));
        }
        if let Some(status) = &self.status
            && status.is_expired()
        {
            self.status = None;
        }

        let len = self.panel.entries().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        let len = self.panel.entries().len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected + 1 < len {
                    self.selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Enter => {
                if self.panel.activate(self.selected)
                    && let Some(entry) = self.panel.entries().get(self.selected)
                {
                    self.set_status(NoticeLevel::Info, format!("Opened {}", entry.label));
                }
            }
            KeyCode::Char('x') => {
                if let Some(file) = self.panel.snapshot().get(self.selected) {
                    self.host.close_file(file);
                }
            }
            KeyCode::Char('r') => {
                let event = ActionEvent::for_project(Arc::clone(&self.project.service));
                if self.actions.perform(RefreshOpenFilesAction::ID, &event) {
                    self.set_status(NoticeLevel::Info, "Refreshed");
                }
            }
            KeyCode::Char('p') => self.panel.trigger(PanelCommand::Preview),
            _ => {}
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn panel(&self) -> &Arc<OpenFilesPanel> {
        &self.panel
    }

    pub fn render(&self, frame: &mut Frame<'_>) {
        let size = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(2),
            ])
            .split(size);

        let entries = self.panel.entries();
        self.file_list.render(
            frame,
            layout[0],
            self.panel.title(),
            &entries,
            Some(self.selected),
        );

        let hints = Paragraph::new(Line::from(vec![
            Span::styled("j/k", Style::default().fg(Color::Cyan)),
            Span::raw(" move · "),
            Span::styled("↵", Style::default().fg(Color::Cyan)),
            Span::raw(" open · "),
            Span::styled("x", Style::default().fg(Color::Cyan)),
            Span::raw(" close · "),
            Span::styled("r", Style::default().fg(Color::Cyan)),
            Span::raw(" refresh · "),
            Span::styled("p", Style::default().fg(Color::Cyan)),
            Span::raw(" preview · "),
            Span::styled("q", Style::default().fg(Color::Cyan)),
            Span::raw(" quit"),
        ]))
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Gray));
        frame.render_widget(hints, layout[1]);

        self.render_status(frame, layout[2]);
    }

    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let message = self.status.as_ref().map(|status| {
            let style = match status.level {
                NoticeLevel::Info => Style::default().fg(Color::Gray),
                NoticeLevel::Success => Style::default().fg(Color::Green),
                NoticeLevel::Error => Style::default().fg(Color::Red),
            };
            Line::styled(status.text.clone(), style)
        });

        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let line = message
            .unwrap_or_else(|| Line::styled("Ready", Style::default().fg(Color::DarkGray)));
        frame.render_widget(Paragraph::new(line), inner);
    }

    fn set_status<S: Into<String>>(&mut self, level: NoticeLevel, message: S) {
        self.status = Some(StatusMessage::new(level, message.into()));
    }
}

/// Switch `out` to the alternate screen, running `restore` if that fails.
fn enter_alternate_screen<W: Write>(out: &mut W, restore: impl FnOnce()) -> Result<()> {
    if let Err(err) = execute!(out, EnterAlternateScreen) {
        restore();
        return Err(err).context("failed to enter alternate screen");
    }
    Ok(())
}

#[derive(Debug)]
struct StatusMessage {
    level: NoticeLevel,
    text: String,
    expires_at: Instant,
}

impl StatusMessage {
    fn new(level: NoticeLevel, text: String) -> Self {
        Self {
            level,
            text,
            expires_at: Instant::now() + Duration::from_secs(4),
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    use ratatui::backend::TestBackend;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn fixture(names: &[&str]) -> Result<(TempDir, Arc<LocalHost>)> {
        let dir = tempfile::tempdir()?;
        let mut paths: Vec<PathBuf> = Vec::new();
        for name in names {
            let path = dir.path().join(name);
            fs::write(&path, format!("// {name}\n"))?;
            paths.push(path);
        }
        let host = Arc::new(LocalHost::with_files(paths).with_temp_dir(dir.path()));
        Ok((dir, host))
    }

    fn screen(app: &PanelApp) -> Result<String> {
        let mut terminal = Terminal::new(TestBackend::new(80, 12))?;
        terminal.draw(|frame| app.render(frame))?;
        let buffer = terminal.backend().buffer();
        Ok(buffer.content().iter().map(|cell| cell.symbol()).collect())
    }

    #[test]
    fn renders_title_and_entries() -> Result<()> {
        let (_dir, host) = fixture(&["main.rs", "notes.md"])?;
        let app = PanelApp::new(host, Config::default())?;

        let text = screen(&app)?;
        assert!(text.contains("Open Files: (2)"));
        assert!(text.contains("[rust] main.rs"));
        assert!(text.contains("[markdown] notes.md"));
        Ok(())
    }

    #[test]
    fn navigation_is_clamped_to_entries() -> Result<()> {
        let (_dir, host) = fixture(&["a.rs", "b.rs"])?;
        let mut app = PanelApp::new(host, Config::default())?;

        app.handle_key(key(KeyCode::Char('k')));
        assert_eq!(app.selected(), 0);
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.selected(), 1);
        Ok(())
    }

    #[test]
    fn closing_a_file_updates_list_on_tick() -> Result<()> {
        let (_dir, host) = fixture(&["a.rs", "b.rs"])?;
        let mut app = PanelApp::new(host, Config::default())?;

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(app.panel().entries().len(), 2);

        app.tick();
        assert_eq!(app.panel().entries().len(), 1);
        assert_eq!(app.selected(), 0);
        Ok(())
    }

    #[test]
    fn preview_key_writes_report_and_opens_it() -> Result<()> {
        let (_dir, host) = fixture(&["a.py"])?;
        let mut app = PanelApp::new(host.clone(), Config::default())?;

        app.handle_key(key(KeyCode::Char('p')));
        app.tick();

        let active = host.active().expect("preview opened");
        assert!(active.name().starts_with("open_files_preview_"));
        let report = fs::read_to_string(active.path())?;
        assert!(report.contains("```python\n// a.py\n```"));
        assert_eq!(app.panel().entries().len(), 2);
        assert!(screen(&app)?.contains("Preview of 1 files written to"));
        Ok(())
    }

    struct BrokenTerminal;

    impl Write for BrokenTerminal {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone"))
        }
    }

    #[test]
    fn failed_screen_switch_restores_terminal() {
        let mut restored = false;
        let result = enter_alternate_screen(&mut BrokenTerminal, || restored = true);
        assert!(result.is_err());
        assert!(restored);
    }

    #[test]
    fn successful_screen_switch_keeps_terminal_state() -> Result<()> {
        let mut out = Vec::new();
        let mut restored = false;
        enter_alternate_screen(&mut out, || restored = true)?;
        assert!(!restored);
        assert!(!out.is_empty());
        Ok(())
    }

    #[test]
    fn quit_keys_stop_the_loop() -> Result<()> {
        let (_dir, host) = fixture(&[])?;
        let mut app = PanelApp::new(host, Config::default())?;
        assert!(!app.should_quit());
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit());
        assert!(screen(&app)?.contains("No open files"));
        Ok(())
    }
}
