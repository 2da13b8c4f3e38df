use std::{collections::HashMap, io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use mediaamp_core::{
    models::{GameDetail, GameId, GameSummary, Screenshot, Trailer},
    store::{CatalogStore, LoadStatus},
    view::{BrowseView, Projection},
    Identity,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const YEAR_DIGITS: usize = 4;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Browse,
    Library,
    Detail,
}

struct DetailBundle {
    detail: GameDetail,
    screenshots: Vec<Screenshot>,
    trailers: Vec<Trailer>,
}

enum AppEvent {
    Input(Event),
    Tick,
    CatalogLoaded(LoadStatus),
    DetailLoaded(GameId, Result<DetailBundle>),
    PreviewLoaded(GameId, String),
}

/// Terminal frontend over the catalog store.
pub struct MediaAmpApp {
    store: CatalogStore,
    identity: Identity,
    view: BrowseView,
    state: UiState,
    screen: Screen,
    detail_return: Screen,
    remote_page: u32,
    detail: Option<DetailBundle>,
    pending_detail: Option<GameId>,
    previews: HashMap<GameId, String>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    theme: Theme,
}

impl MediaAmpApp {
    pub fn new(store: CatalogStore, identity: Identity, start_page: u32) -> Self {
        Self {
            store,
            identity,
            view: BrowseView::default(),
            state: UiState::default(),
            screen: Screen::Browse,
            detail_return: Screen::Browse,
            remote_page: start_page.max(1),
            detail: None,
            pending_detail: None,
            previews: HashMap::new(),
            event_tx: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        if self.store.should_load() {
            self.spawn_load(self.remote_page);
        }

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn spawn_load(&mut self, page: u32) {
        let Some(tx) = self.event_tx.clone() else {
            return;
        };
        let store = self.store.clone();
        let ticket = store.begin_load(page);
        self.state.set_status(format!("Loading page {}...", ticket.page()));
        tokio::spawn(async move {
            let result = store.client().fetch_page(ticket.page()).await;
            let status = store.finish_load(ticket, result);
            let _ = tx.send(AppEvent::CatalogLoaded(status)).await;
        });
    }

    fn spawn_detail(&mut self, id: GameId) {
        let Some(tx) = self.event_tx.clone() else {
            return;
        };
        let client = self.store.client().clone();
        self.pending_detail = Some(id);
        self.detail = None;
        tokio::spawn(async move {
            let result = async {
                let detail = client
                    .fetch_detail(id)
                    .await
                    .context("failed to fetch game detail")?;
                let screenshots = client
                    .fetch_screenshots(id)
                    .await
                    .context("failed to fetch screenshots")?;
                let trailers = client
                    .fetch_trailers(id)
                    .await
                    .context("failed to fetch trailers")?;
                Ok::<_, anyhow::Error>(DetailBundle {
                    detail,
                    screenshots,
                    trailers,
                })
            }
            .await;
            let _ = tx.send(AppEvent::DetailLoaded(id, result)).await;
        });
    }

    fn spawn_previews(&mut self) {
        let Some(tx) = self.event_tx.clone() else {
            return;
        };
        let missing: Vec<GameId> = self
            .store
            .saved_games()
            .iter()
            .map(|game| game.id)
            .filter(|id| !self.previews.contains_key(id))
            .collect();
        if missing.is_empty() {
            return;
        }
        let client = self.store.client().clone();
        tokio::spawn(async move {
            for id in missing {
                match client.fetch_preview(id).await {
                    Ok(Some(url)) => {
                        if tx.send(AppEvent::PreviewLoaded(id, url)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => warn!(id, %err, "Preview fetch failed"),
                }
            }
        });
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    self.state.set_status(format!("Error: {err}"));
                }
                true
            }
            Some(AppEvent::Tick) => {
                self.handle_tick();
                true
            }
            Some(AppEvent::CatalogLoaded(status)) => {
                self.handle_catalog_loaded(status);
                true
            }
            Some(AppEvent::DetailLoaded(id, result)) => {
                if self.pending_detail != Some(id) {
                    return true;
                }
                self.pending_detail = None;
                match result {
                    Ok(bundle) => {
                        info!(id, name = %bundle.detail.name, "Detail loaded");
                        self.state.detail_scroll = 0;
                        self.detail = Some(bundle);
                        self.state.set_status("Esc to go back".to_string());
                    }
                    Err(err) => {
                        error!(?err, id, "Detail load failed");
                        self.state
                            .set_status(format!("Failed to load details: {err:#}"));
                    }
                }
                true
            }
            Some(AppEvent::PreviewLoaded(id, url)) => {
                self.previews.insert(id, url);
                true
            }
            None => false,
        }
    }

    fn handle_catalog_loaded(&mut self, status: LoadStatus) {
        match status {
            LoadStatus::Succeeded => {
                self.state.cursor = 0;
                self.state
                    .set_status(format!("Loaded {} games", self.store.games().len()));
            }
            LoadStatus::Failed => {
                let cause = self.store.error().unwrap_or_default();
                self.state
                    .set_status(format!("Error loading games: {cause} (r to retry)"));
            }
            LoadStatus::Loading | LoadStatus::Idle => {}
        }
    }

    fn handle_tick(&mut self) {
        match self.state.mode {
            Mode::Search => self
                .state
                .set_status(format!("Search: {}", self.view.query().search_text)),
            Mode::Year => self
                .state
                .set_status(format!("Year: {}", self.view.query().release_year)),
            Mode::Browse => {}
        }
    }

    fn projection(&mut self) -> Projection {
        let games = self.store.games();
        self.view.sync_catalog(self.store.generation());
        self.view.project(&games)
    }

    fn selected_game(&mut self) -> Option<GameSummary> {
        match self.screen {
            Screen::Browse => {
                let projection = self.projection();
                projection.page_items.get(self.state.cursor).cloned()
            }
            Screen::Library => self
                .store
                .saved_games()
                .get(self.state.library_cursor)
                .cloned(),
            Screen::Detail => None,
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return Ok(());
        }
        match self.screen {
            Screen::Browse => match self.state.mode {
                Mode::Browse => self.handle_browse_key(key),
                Mode::Search => self.handle_search_key(key),
                Mode::Year => self.handle_year_key(key),
            },
            Screen::Library => self.handle_library_key(key),
            Screen::Detail => self.handle_detail_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                let len = self.projection().page_items.len();
                self.state.move_cursor(1, len);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let len = self.projection().page_items.len();
                self.state.move_cursor(-1, len);
            }
            KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
                let total = self.projection().total_pages;
                if self.view.next_page(total) {
                    self.state.cursor = 0;
                }
            }
            KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
                if self.view.prev_page() {
                    self.state.cursor = 0;
                }
            }
            KeyCode::Char('/') => {
                self.state.mode = Mode::Search;
                self.state.set_status("Type to search by name".to_string());
            }
            KeyCode::Char('y') => {
                self.state.mode = Mode::Year;
                self.state.set_status("Type a release year".to_string());
            }
            KeyCode::Char('c') => {
                let category = self.view.cycle_category().to_string();
                self.state.cursor = 0;
                let label = if category.is_empty() {
                    "All".to_string()
                } else {
                    category
                };
                self.state.set_status(format!("Category: {label}"));
            }
            KeyCode::Char('s') => self.save_selected(),
            KeyCode::Char('r') => self.spawn_load(self.remote_page),
            KeyCode::Char(']') => {
                self.remote_page = self.remote_page.saturating_add(1);
                self.spawn_load(self.remote_page);
            }
            KeyCode::Char('[') => {
                if self.remote_page > 1 {
                    self.remote_page -= 1;
                    self.spawn_load(self.remote_page);
                }
            }
            KeyCode::Char('i') => self.toggle_identity(),
            KeyCode::Tab => self.open_library(),
            KeyCode::Enter => self.open_detail(),
            _ => {}
        }
        Ok(())
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<()> {
        let mut text = self.view.query().search_text.clone();
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Browse;
                self.view.set_search(String::new());
                self.state.set_status("Search cleared".to_string());
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                self.state.set_status(format!("Search applied: {text}"));
            }
            KeyCode::Backspace => {
                text.pop();
                self.view.set_search(text);
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    text.push(c);
                    self.view.set_search(text);
                }
            }
            _ => {}
        }
        self.state.cursor = 0;
        Ok(())
    }

    fn handle_year_key(&mut self, key: KeyEvent) -> Result<()> {
        let mut year = self.view.query().release_year.clone();
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Browse;
                self.view.set_release_year(String::new());
                self.state.set_status("Year filter cleared".to_string());
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                self.state.set_status(format!("Year filter applied: {year}"));
            }
            KeyCode::Backspace => {
                year.pop();
                self.view.set_release_year(year);
            }
            KeyCode::Char(c) => {
                if push_year_digit(&mut year, c) {
                    self.view.set_release_year(year);
                }
            }
            _ => {}
        }
        self.state.cursor = 0;
        Ok(())
    }

    fn handle_library_key(&mut self, key: KeyEvent) -> Result<()> {
        let total = self.store.saved_games().len();
        match key.code {
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.move_library_cursor(1, total),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_library_cursor(-1, total),
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(game) = self.selected_game() {
                    if self.store.remove_game(game.id) {
                        self.state
                            .set_status(format!("Removed {} from library", game.name));
                    }
                    let remaining = self.store.saved_games().len();
                    self.state.move_library_cursor(0, remaining);
                }
            }
            KeyCode::Char('i') => {
                self.toggle_identity();
                if !self.identity.is_signed_in() {
                    self.screen = Screen::Browse;
                }
            }
            KeyCode::Tab | KeyCode::Esc => {
                self.screen = Screen::Browse;
                self.state.set_status("Browsing catalog".to_string());
            }
            KeyCode::Enter => self.open_detail(),
            _ => {}
        }
        Ok(())
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Esc | KeyCode::Backspace => {
                self.screen = self.detail_return;
                self.pending_detail = None;
                self.state.set_status(String::new());
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.detail_scroll = self.state.detail_scroll.saturating_add(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.detail_scroll = self.state.detail_scroll.saturating_sub(1);
            }
            _ => {}
        }
        Ok(())
    }

    fn save_selected(&mut self) {
        if !self.identity.can_save() {
            self.state
                .set_status("Sign in to save games (press i)".to_string());
            return;
        }
        let Some(game) = self.selected_game() else {
            return;
        };
        let name = game.name.clone();
        if self.store.save_game(game) {
            self.state.set_status(format!("Saved {name} to library"));
        } else {
            self.state
                .set_status(format!("{name} is already in your library"));
        }
    }

    fn toggle_identity(&mut self) {
        self.identity.toggle();
        let message = if self.identity.is_signed_in() {
            self.identity.greeting()
        } else {
            "Signed out".to_string()
        };
        self.state.set_status(message);
    }

    fn open_library(&mut self) {
        if !self.identity.is_signed_in() {
            self.state
                .set_status("Sign in to view your library (press i)".to_string());
            return;
        }
        self.screen = Screen::Library;
        let total = self.store.saved_games().len();
        self.state.move_library_cursor(0, total);
        self.spawn_previews();
        self.state.set_status(format!("{total} saved games"));
    }

    fn open_detail(&mut self) {
        let Some(game) = self.selected_game() else {
            return;
        };
        self.detail_return = self.screen;
        self.screen = Screen::Detail;
        self.state
            .set_status(format!("Loading details for {}...", game.name));
        self.spawn_detail(game.id);
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(size);

        self.render_header(frame, chunks[0]);
        match self.screen {
            Screen::Browse => {
                let projection = self.projection();
                if !projection.page_items.is_empty() {
                    self.state
                        .move_cursor(0, projection.page_items.len());
                }
                let body = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                    .split(chunks[1]);
                self.render_page(frame, body[0], &projection);
                let selected = projection.page_items.get(self.state.cursor);
                self.render_summary(frame, body[1], selected, None);
                self.render_footer(frame, chunks[2], Some(&projection));
            }
            Screen::Library => {
                let saved = self.store.saved_games();
                let body = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                    .split(chunks[1]);
                self.render_library(frame, body[0], &saved);
                let selected = saved.get(self.state.library_cursor);
                let preview = selected.and_then(|game| self.previews.get(&game.id));
                self.render_summary(frame, body[1], selected, preview.map(String::as_str));
                self.render_footer(frame, chunks[2], None);
            }
            Screen::Detail => {
                self.render_detail(frame, chunks[1]);
                self.render_footer(frame, chunks[2], None);
            }
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let query = self.view.query();
        let category = if query.category.is_empty() {
            "All"
        } else {
            query.category.as_str()
        };
        let year = if query.release_year.is_empty() {
            "Any"
        } else {
            query.release_year.as_str()
        };
        let search_style = if self.state.mode == Mode::Search {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.primary_fg)
        };
        let year_style = if self.state.mode == Mode::Year {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.primary_fg)
        };

        let lines = vec![
            Line::from(Span::styled(
                self.identity.greeting(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::raw("Search: "),
                Span::styled(format!("{:<20}", query.search_text), search_style),
                Span::raw("  Category: "),
                Span::styled(category.to_string(), Style::default().fg(self.theme.primary_fg)),
                Span::raw("  Year: "),
                Span::styled(year.to_string(), year_style),
            ]),
        ];
        let title = match self.screen {
            Screen::Browse => "MediaAMP · Game List",
            Screen::Library => "MediaAMP · My Library",
            Screen::Detail => "MediaAMP · Game Details",
        };
        let paragraph =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);
    }

    fn render_page(&self, frame: &mut Frame, area: Rect, projection: &Projection) {
        let block = Block::default().borders(Borders::ALL).title("Games");
        match self.store.status() {
            LoadStatus::Loading if projection.page_items.is_empty() => {
                frame.render_widget(Paragraph::new("Loading...").block(block), area);
                return;
            }
            LoadStatus::Failed if projection.page_items.is_empty() => {
                let paragraph = Paragraph::new(Span::styled(
                    "Error loading games.",
                    Style::default().fg(self.theme.danger),
                ))
                .block(block);
                frame.render_widget(paragraph, area);
                return;
            }
            _ => {}
        }
        if projection.page_items.is_empty() {
            frame.render_widget(Paragraph::new("No games match").block(block), area);
            return;
        }

        let items: Vec<ListItem> = projection
            .page_items
            .iter()
            .enumerate()
            .map(|(idx, game)| {
                let marker = if idx == self.state.cursor {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let title = Span::styled(
                    game.name.clone(),
                    Style::default()
                        .fg(self.theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                );
                let mut line = vec![marker, title];
                line.push(Span::styled(
                    format!(" · {}", game.category),
                    Style::default().fg(self.theme.muted),
                ));
                if self.store.is_saved(game.id) {
                    line.push(Span::styled(" ✔", Style::default().fg(self.theme.success)));
                }
                ListItem::new(Line::from(line))
            })
            .collect();

        let mut list_state = ListState::default();
        list_state.select(Some(self.state.cursor));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_library(&self, frame: &mut Frame, area: Rect, saved: &[GameSummary]) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Saved ({})", saved.len()));
        if saved.is_empty() {
            let paragraph = Paragraph::new("Your library is empty. Press s on a game to save it.")
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }
        let items: Vec<ListItem> = saved
            .iter()
            .map(|game| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        game.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" · {}", game.category),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();
        let mut list_state = ListState::default();
        list_state.select(Some(self.state.library_cursor));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_summary(
        &self,
        frame: &mut Frame,
        area: Rect,
        game: Option<&GameSummary>,
        preview: Option<&str>,
    ) {
        let block = Block::default().borders(Borders::ALL).title("Details");
        let Some(game) = game else {
            frame.render_widget(Paragraph::new("No game selected").block(block), area);
            return;
        };

        let mut lines = vec![
            Line::from(Span::styled(
                game.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                game.description_or_default().to_string(),
                Style::default().fg(self.theme.muted),
            )),
            Line::from(format!("Tags: {}", game.tag_line())),
            Line::from(format!("Category: {}", game.category)),
            Line::from(format!("Rating: ★ {}", game.rating_label())),
            Line::from(format!(
                "Released: {}",
                game.release_year_label().unwrap_or_else(|| "unknown".to_string())
            )),
            Line::from(format!(
                "Image: {}",
                preview.unwrap_or_else(|| game.image_or_placeholder())
            )),
            Line::from(""),
        ];

        let (label, color) = if self.screen == Screen::Library {
            ("x: Remove from Library", self.theme.danger)
        } else if !self.identity.can_save() {
            ("Sign in to Save", self.theme.muted)
        } else if self.store.is_saved(game.id) {
            ("Saved", self.theme.success)
        } else {
            ("s: Save to Library", self.theme.warning)
        };
        lines.push(Line::from(Span::styled(
            format!("[ {label} ]"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Game Details");
        let Some(bundle) = self.detail.as_ref() else {
            let text = if self.pending_detail.is_some() {
                "Loading game details..."
            } else {
                "No details available"
            };
            frame.render_widget(Paragraph::new(text).block(block), area);
            return;
        };

        let detail = &bundle.detail;
        let join_or_na = |values: &[String]| {
            if values.is_empty() {
                "N/A".to_string()
            } else {
                values.join(", ")
            }
        };
        let mut lines = vec![
            Line::from(Span::styled(
                detail.name.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(
                detail
                    .description
                    .clone()
                    .unwrap_or_else(|| "No description available.".to_string()),
            ),
            Line::from(""),
            Line::from(format!(
                "Released: {}",
                detail.released.as_deref().unwrap_or("N/A")
            )),
            Line::from(format!(
                "Rating: ★ {}",
                detail
                    .rating
                    .map(|rating| format!("{rating:.2}"))
                    .unwrap_or_else(|| "N/A".to_string())
            )),
            Line::from(format!("Platforms: {}", join_or_na(&detail.platforms))),
            Line::from(format!("Genres: {}", join_or_na(&detail.genres))),
        ];
        if let Some(image) = &detail.background_image {
            lines.push(Line::from(format!("Artwork: {image}")));
        }
        if !bundle.screenshots.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Screenshots",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.extend(
                bundle
                    .screenshots
                    .iter()
                    .map(|shot| Line::from(format!("  {}", shot.image))),
            );
        }
        if !bundle.trailers.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Trailers",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.extend(bundle.trailers.iter().map(|trailer| {
                Line::from(format!(
                    "  {} {}",
                    trailer.name,
                    trailer.url.as_deref().unwrap_or("(no stream)")
                ))
            }));
        }

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true })
            .scroll((self.state.detail_scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, projection: Option<&Projection>) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let load = match self.store.status() {
            LoadStatus::Loading => Span::styled("Loading...", Style::default().fg(self.theme.warning)),
            LoadStatus::Failed => {
                Span::styled("Error loading games.", Style::default().fg(self.theme.danger))
            }
            status => Span::styled(
                format!("Catalog {} (remote page {})", status.label(), self.remote_page),
                Style::default().fg(self.theme.muted),
            ),
        };
        let mut first = vec![load];
        if let Some(projection) = projection {
            first.push(Span::raw(format!(
                "  Page {} of {}  ({} matches)",
                projection.current_page, projection.total_pages, projection.total_matches
            )));
        }
        let help = match (self.screen, self.state.mode) {
            (Screen::Browse, Mode::Search) | (Screen::Browse, Mode::Year) => {
                "Enter apply · Esc clear"
            }
            (Screen::Browse, Mode::Browse) => {
                "/ search · c category · y year · ←/→ page · s save · Enter details · Tab library · r reload · [ ] remote page · i sign in/out · q quit"
            }
            (Screen::Library, _) => "x remove · Enter details · Tab back · q quit",
            (Screen::Detail, _) => "j/k scroll · Esc back · q quit",
        };
        let status = if self.state.status.is_empty() {
            help.to_string()
        } else {
            format!("{} · {}", self.state.status, help)
        };
        let paragraph = Paragraph::new(vec![Line::from(first), Line::from(status)])
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

/// Append `ch` to a year being typed; only digits, at most four.
fn push_year_digit(year: &mut String, ch: char) -> bool {
    if !ch.is_ascii_digit() || year.len() >= YEAR_DIGITS {
        return false;
    }
    year.push(ch);
    true
}

struct UiState {
    cursor: usize,
    library_cursor: usize,
    detail_scroll: u16,
    status: String,
    mode: Mode,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            cursor: 0,
            library_cursor: 0,
            detail_scroll: 0,
            status: "Ready".to_string(),
            mode: Mode::Browse,
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn move_cursor(&mut self, delta: isize, len: usize) {
        self.cursor = step(self.cursor, delta, len);
    }

    fn move_library_cursor(&mut self, delta: isize, len: usize) {
        self.library_cursor = step(self.library_cursor, delta, len);
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let idx = current as isize + delta;
    idx.clamp(0, len as isize - 1) as usize
}
