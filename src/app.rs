use crate::date_filter::parse_date_input;
use crate::editor::TextBuffer;
use crate::journal::Journal;
use crate::page_store::{Durability, LoadOutcome};
use crate::store::KeyValueStore;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    DateInput(String),
    Editing(TextBuffer),
}

/// Screen state and key handling. Rendering lives in `ui`.
pub struct App<S: KeyValueStore> {
    pub journal: Journal<S>,
    pub mode: Mode,
    pub cursor: usize,
    pub theme: Theme,
    pub status: Option<String>,
    pub quit: bool,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(journal: Journal<S>, outcome: &LoadOutcome, theme: Theme) -> Self {
        let status = match outcome {
            LoadOutcome::Recovered(e) => {
                Some(format!("Stored pages were unreadable ({e}), starting fresh"))
            }
            LoadOutcome::Unavailable(e) => Some(format!("Could not open saved pages: {e}")),
            _ => None,
        };
        App {
            journal,
            mode: Mode::Browse,
            cursor: 0,
            theme,
            status,
            quit: false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.status = None;
        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Browse => self.browse_key(key),
            Mode::DateInput(input) => self.date_key(key, input),
            Mode::Editing(buffer) => self.editing_key(key, buffer),
        }
    }

    fn browse_key(&mut self, key: KeyEvent) {
        let visible = self.journal.view().filtered().len();
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('t') => self.theme = self.theme.toggled(),
            KeyCode::Char('/') => {
                let current = self
                    .journal
                    .view()
                    .selected_date()
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                self.mode = Mode::DateInput(current);
            }
            KeyCode::Char('a') => {
                if self.journal.is_today_selected() {
                    let (_, durability) = self.journal.add_page();
                    self.report(durability);
                    self.start_editing();
                } else {
                    self.status = Some("New pages can only be added for today".to_string());
                }
            }
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.cursor + 1 < visible {
                    self.cursor += 1;
                }
            }
            KeyCode::Enter => {
                if self.journal.open_page(self.cursor) {
                    self.start_editing();
                }
            }
            _ => {}
        }
    }

    fn date_key(&mut self, key: KeyEvent, mut input: String) {
        match key.code {
            KeyCode::Esc => {}
            KeyCode::Enter => match parse_date_input(&input) {
                Ok(date) => {
                    self.journal.filter_by_date(date);
                    self.cursor = 0;
                }
                Err(e) => {
                    self.status = Some(e.to_string());
                    self.mode = Mode::DateInput(input);
                }
            },
            KeyCode::Backspace => {
                input.pop();
                self.mode = Mode::DateInput(input);
            }
            KeyCode::Char(c) => {
                input.push(c);
                self.mode = Mode::DateInput(input);
            }
            _ => self.mode = Mode::DateInput(input),
        }
    }

    fn editing_key(&mut self, key: KeyEvent, mut buffer: TextBuffer) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.journal.close_page(),
            KeyCode::Char('s') if ctrl => {
                if let Some(id) = self.journal.view().active_id() {
                    let _ = self.journal.update_page(id, buffer.text());
                }
                if let Some(durability) = self.journal.save_page() {
                    self.report(durability);
                }
            }
            KeyCode::Char('d') if ctrl => {
                if let Some(durability) = self.journal.delete_active_page() {
                    self.report(durability);
                }
                self.clamp_cursor();
            }
            KeyCode::Char(_) if ctrl => self.mode = Mode::Editing(buffer),
            _ => {
                match key.code {
                    KeyCode::Char(c) => buffer.insert(c),
                    KeyCode::Enter => buffer.insert('\n'),
                    KeyCode::Backspace => buffer.backspace(),
                    KeyCode::Delete => buffer.delete(),
                    KeyCode::Left => buffer.left(),
                    KeyCode::Right => buffer.right(),
                    KeyCode::Up => buffer.up(),
                    KeyCode::Down => buffer.down(),
                    _ => {}
                }
                self.mode = Mode::Editing(buffer);
            }
        }
    }

    fn start_editing(&mut self) {
        if let Some(position) = self.journal.view().active_position() {
            self.cursor = position;
        }
        if let Some(page) = self.journal.active_page() {
            self.mode = Mode::Editing(TextBuffer::new(&page.content));
        }
    }

    fn clamp_cursor(&mut self) {
        let visible = self.journal.view().filtered().len();
        self.cursor = self.cursor.min(visible.saturating_sub(1));
    }

    fn report(&mut self, durability: Durability) {
        self.status = match durability {
            Durability::Written => None,
            Durability::Lost(e) => {
                info!(error = %e, "showing durability warning");
                Some(format!("Not saved to disk: {e}"))
            }
        };
    }
}
