use crate::app::{App, Mode, Theme};
use crate::store::KeyValueStore;
use chrono::Local;
use color_eyre::Result;
use crossterm::{
    event::{self, Event},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::{
    io::{stdout, Stdout},
    time::Duration,
};

struct Palette {
    base: Style,
    accent: Color,
    hint: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Palette {
                base: Style::default().fg(Color::Black).bg(Color::White),
                accent: Color::Blue,
                hint: Color::DarkGray,
            },
            Theme::Dark => Palette {
                base: Style::default().fg(Color::White).bg(Color::Black),
                accent: Color::Cyan,
                hint: Color::Yellow,
            },
        }
    }
}

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl UI {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI { terminal })
    }

    pub fn display<S: KeyValueStore>(&mut self, app: &App<S>) -> Result<()> {
        self.terminal.draw(|f| render(f, app))?;
        Ok(())
    }

    /// Waits briefly for a key and hands it to the app.
    pub fn handle_input<S: KeyValueStore>(&self, app: &mut App<S>) -> Result<()> {
        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }
        Ok(())
    }
}

fn render<S: KeyValueStore>(f: &mut Frame, app: &App<S>) {
    let palette = Palette::for_theme(app.theme);
    f.render_widget(Block::default().style(palette.base), f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    let filter = match app.journal.view().selected_date() {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => "All pages".to_string(),
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Journal",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  |  {}  |  {} mode", filter, app.theme.name())),
    ]))
    .style(palette.base)
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(20)])
        .split(chunks[1]);

    render_page_list(f, app, &palette, body[0]);
    render_editor(f, app, &palette, body[1]);
    render_footer(f, app, &palette, chunks[2]);
}

fn render_page_list<S: KeyValueStore>(f: &mut Frame, app: &App<S>, palette: &Palette, area: Rect) {
    let active = app.journal.view().active_position();
    let items: Vec<ListItem> = app
        .journal
        .visible()
        .enumerate()
        .map(|(index, _)| {
            let label = format!("Page {}", index + 1);
            if Some(index) == active {
                ListItem::new(Span::styled(
                    label,
                    Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                ListItem::new(label)
            }
        })
        .collect();

    let empty = items.is_empty();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Pages"))
        .style(palette.base)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let selected = if empty || app.mode != Mode::Browse {
        None
    } else {
        Some(app.cursor)
    };
    f.render_stateful_widget(list, area, &mut ListState::default().with_selected(selected));
}

fn render_editor<S: KeyValueStore>(f: &mut Frame, app: &App<S>, palette: &Palette, area: Rect) {
    let (Mode::Editing(buffer), Some(page)) = (&app.mode, app.journal.active_page()) else {
        let hint = if app.journal.view().filtered().is_empty() {
            "No pages for this date"
        } else {
            "Select a page and press Enter"
        };
        let placeholder = Paragraph::new(hint)
            .style(palette.base.fg(palette.hint))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(placeholder, area);
        return;
    };

    let title = page
        .timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let editor = Paragraph::new(buffer.text())
        .style(palette.base)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(editor, area);

    let (row, column) = buffer.cursor_position();
    let max_x = area.x + area.width.saturating_sub(2);
    let max_y = area.y + area.height.saturating_sub(2);
    f.set_cursor_position((
        (area.x + 1 + column).min(max_x),
        (area.y + 1 + row).min(max_y),
    ));
}

fn render_footer<S: KeyValueStore>(f: &mut Frame, app: &App<S>, palette: &Palette, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().add_modifier(Modifier::BOLD));

    let line = match (&app.mode, &app.status) {
        (Mode::DateInput(input), status) => {
            let mut spans = vec![Span::raw("Date (YYYY-MM-DD, blank for all): "), Span::raw(input.clone())];
            if let Some(status) = status {
                spans.push(Span::styled(format!("  {status}"), Style::default().fg(Color::Red)));
            }
            Line::from(spans)
        }
        (_, Some(status)) => Line::from(Span::styled(status.clone(), Style::default().fg(Color::Red))),
        (Mode::Editing(_), None) => Line::from(vec![
            key("Ctrl-S"),
            Span::raw(" save, "),
            key("Ctrl-D"),
            Span::raw(" delete, "),
            key("Esc"),
            Span::raw(" close"),
        ]),
        (Mode::Browse, None) => {
            let mut spans = Vec::new();
            if app.journal.is_today_selected() {
                spans.extend([key("a"), Span::raw(" add new, ")]);
            }
            spans.extend([
                key("Enter"),
                Span::raw(" open, "),
                key("/"),
                Span::raw(" date, "),
                key("t"),
                Span::raw(" theme, "),
                key("q"),
                Span::raw(" quit"),
            ]);
            Line::from(spans)
        }
    };

    let footer = Paragraph::new(line)
        .style(palette.base.fg(palette.hint))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

impl Drop for UI {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
