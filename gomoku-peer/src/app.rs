use std::net::SocketAddr;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use gomoku_core::{BOARD_SIZE, GameSnapshot, PeerAddr, Session, SessionPhase, Stone};
use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget},
};
use tracing::{debug, info};

use crate::config::PeerConfig;

/// Longest address the join prompt accepts.
const MAX_ADDRESS_LEN: usize = 64;

pub enum UiEvent {
    Key(KeyEvent),
    Resize(u16, u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuMode {
    #[default]
    Choose,
    EnterAddress,
}

#[derive(Debug)]
pub struct App {
    pub session: Session,
    pub menu_mode: MenuMode,
    pub address: String,
    pub cursor: (usize, usize),
    /// One-line hint shown under the status panel.
    pub notice: Option<String>,
    pub exit: bool,
    bind_address: String,
    port: u16,
    hosted_on: Option<SocketAddr>,
}

impl App {
    pub fn new(config: &PeerConfig) -> Self {
        let mut session = Session::new();
        if let Some(timeout) = config.connect_timeout() {
            session = session.with_connect_timeout(timeout);
        }
        Self {
            session,
            menu_mode: MenuMode::Choose,
            address: String::new(),
            cursor: Self::center(),
            notice: None,
            exit: false,
            bind_address: config.network.bind_address.clone(),
            port: config.network.port,
            hosted_on: None,
        }
    }

    fn center() -> (usize, usize) {
        (BOARD_SIZE / 2, BOARD_SIZE / 2)
    }

    // ── Actions ──────────────────────────────────────────────────

    pub async fn start_host(&mut self) {
        match self
            .session
            .host_on((self.bind_address.as_str(), self.port))
            .await
        {
            Ok(local) => {
                self.hosted_on = Some(local);
                self.notice = None;
            }
            Err(e) => self.notice = Some(format!("Could not host: {e}")),
        }
    }

    pub fn start_join(&mut self, address: &str) {
        let target = match PeerAddr::parse_with_default(address, self.port) {
            Ok(target) => target,
            Err(e) => {
                self.notice = Some(format!("Bad address: {e}"));
                return;
            }
        };
        match self.session.join(target) {
            Ok(()) => {
                self.menu_mode = MenuMode::Choose;
                self.notice = None;
            }
            Err(e) => self.notice = Some(format!("Could not join: {e}")),
        }
    }

    async fn place_at_cursor(&mut self) {
        let (x, y) = self.cursor;
        match self.session.on_local_click(x as i32, y as i32).await {
            Ok(()) => self.notice = None,
            Err(e) => {
                debug!(x, y, error = %e, "move not played");
                self.notice = Some(e.to_string());
            }
        }
    }

    async fn request_new_game(&mut self) {
        match self.session.on_new_game_requested().await {
            Ok(()) => {
                self.notice = None;
                self.cursor = Self::center();
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    fn move_cursor(&mut self, dx: isize, dy: isize) {
        let last = BOARD_SIZE - 1;
        let (x, y) = self.cursor;
        self.cursor = (
            x.saturating_add_signed(dx).min(last),
            y.saturating_add_signed(dy).min(last),
        );
    }

    /// Bring the session up to date. Called every UI tick.
    pub fn tick(&mut self) {
        let before = self.session.phase();
        self.session.refresh();
        let after = self.session.phase();
        if before == after {
            return;
        }

        info!(from = %before, to = %after, "phase changed");
        match after {
            SessionPhase::Active if before.is_connecting() => {
                self.cursor = Self::center();
                self.notice = None;
            }
            SessionPhase::Menu => {
                self.hosted_on = None;
                self.notice = self.session.last_error().map(str::to_owned);
            }
            _ => {}
        }
    }

    // ── Input ────────────────────────────────────────────────────

    pub async fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Key(key) if key.kind == KeyEventKind::Press => self.on_key(key).await,
            // Ratatui picks up the new size on the next draw.
            UiEvent::Key(_) | UiEvent::Resize(..) => {}
        }
    }

    pub async fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.exit = true;
            return;
        }
        match self.session.phase() {
            SessionPhase::Menu => self.on_menu_key(key).await,
            SessionPhase::Hosting | SessionPhase::Joining => self.on_waiting_key(key),
            SessionPhase::Active => self.on_board_key(key).await,
            SessionPhase::Finished => self.on_finished_key(key).await,
        }
        self.tick();
    }

    async fn on_menu_key(&mut self, key: KeyEvent) {
        match self.menu_mode {
            MenuMode::Choose => match key.code {
                KeyCode::Char('h') | KeyCode::Char('H') => self.start_host().await,
                KeyCode::Char('j') | KeyCode::Char('J') => {
                    self.menu_mode = MenuMode::EnterAddress;
                    self.notice = None;
                }
                KeyCode::Char('q') | KeyCode::Esc => self.exit = true,
                _ => {}
            },
            MenuMode::EnterAddress => match key.code {
                KeyCode::Char(c) if self.address.len() < MAX_ADDRESS_LEN => self.address.push(c),
                KeyCode::Backspace => {
                    self.address.pop();
                }
                KeyCode::Esc => self.menu_mode = MenuMode::Choose,
                KeyCode::Enter => {
                    let address = self.address.trim().to_owned();
                    self.start_join(&address);
                }
                _ => {}
            },
        }
    }

    fn on_waiting_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.session.cancel();
                self.hosted_on = None;
            }
            KeyCode::Char('q') => self.exit = true,
            _ => {}
        }
    }

    async fn on_board_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left => self.move_cursor(-1, 0),
            KeyCode::Right => self.move_cursor(1, 0),
            KeyCode::Up => self.move_cursor(0, -1),
            KeyCode::Down => self.move_cursor(0, 1),
            KeyCode::Enter | KeyCode::Char(' ') => self.place_at_cursor().await,
            KeyCode::Char('n') | KeyCode::Char('N') => self.request_new_game().await,
            KeyCode::Esc => self.session.disconnect(),
            KeyCode::Char('q') => self.exit = true,
            _ => {}
        }
    }

    async fn on_finished_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('n') | KeyCode::Char('N') => self.request_new_game().await,
            KeyCode::Enter | KeyCode::Esc => {
                if let Err(e) = self.session.play_again() {
                    self.notice = Some(e.to_string());
                }
            }
            KeyCode::Char('q') => self.exit = true,
            _ => {}
        }
    }

    // ── Rendering ────────────────────────────────────────────────

    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let buf = frame.buffer_mut();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_title(layout[0], buf);
        match self.session.phase() {
            SessionPhase::Menu => self.render_menu(layout[1], buf),
            SessionPhase::Hosting | SessionPhase::Joining => self.render_waiting(layout[1], buf),
            SessionPhase::Active | SessionPhase::Finished => self.render_game(layout[1], buf),
        }
        self.render_key_bar(layout[2], buf);
    }

    fn render_title(&self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![Span::styled(
            " Gomoku ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )];
        if let Some(role) = self.session.role() {
            spans.push(Span::styled(
                format!("· {role} "),
                Style::default().fg(Color::Gray),
            ));
        }
        spans.push(Span::styled(
            format!("· {}", self.session.connection_status()),
            Style::default().fg(Color::DarkGray),
        ));
        Paragraph::new(Line::from(spans))
            .block(Block::bordered().border_style(Style::default().fg(Color::DarkGray)))
            .render(area, buf);
    }

    fn render_menu(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(Span::styled(
                " Menu ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ))
            .border_set(border::THICK)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("[H] Host", Style::default().fg(Color::Green)),
                Span::raw(format!(" - wait for an opponent on port {}", self.port)),
            ]),
            Line::from(vec![
                Span::styled("[J] Join", Style::default().fg(Color::Yellow)),
                Span::raw(" - connect to a host"),
            ]),
            Line::from(""),
        ];
        if self.menu_mode == MenuMode::EnterAddress {
            lines.push(Line::from(vec![
                Span::styled("Address: ", Style::default().fg(Color::Gray)),
                Span::styled(
                    format!("{}_", self.address),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
            ]));
        }
        if let Some(notice) = &self.notice {
            lines.push(Line::from(Span::styled(
                notice.as_str(),
                Style::default().fg(Color::Red),
            )));
        }
        Paragraph::new(lines).render(inner, buf);
    }

    fn render_waiting(&self, area: Rect, buf: &mut Buffer) {
        let title = match self.session.phase() {
            SessionPhase::Hosting => " Hosting ",
            _ => " Joining ",
        };
        let block = Block::bordered()
            .title(Span::styled(
                title,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ))
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = vec![
            Line::from(""),
            Line::from(self.session.connection_status().to_string()),
        ];
        if let Some(local) = self.hosted_on {
            lines.push(Line::from(Span::styled(
                format!("Opponent joins with port {}", local.port()),
                Style::default().fg(Color::Gray),
            )));
        }
        Paragraph::new(lines).centered().render(inner, buf);
    }

    fn render_game(&self, area: Rect, buf: &mut Buffer) {
        let Some(snapshot) = self.session.snapshot() else {
            return;
        };
        let board_width = (BOARD_SIZE as u16) * 3 + 5;
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(board_width), Constraint::Min(0)])
            .split(area);

        self.render_board(&snapshot, layout[0], buf);
        self.render_status(&snapshot, layout[1], buf);
        if self.session.phase() == SessionPhase::Finished {
            self.render_result(&snapshot, area, buf);
        }
    }

    fn render_board(&self, snapshot: &GameSnapshot, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(Span::styled(
                " Board ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ))
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        let axis = Style::default().fg(Color::DarkGray);
        let mut header = vec![Span::raw("   ")];
        header.extend((0..BOARD_SIZE).map(|x| Span::styled(format!("{x:>2} "), axis)));
        let mut lines = vec![Line::from(header)];

        for (y, row) in snapshot.board.rows().enumerate() {
            let mut spans = vec![Span::styled(format!("{y:>2} "), axis)];
            for (x, cell) in row.iter().enumerate() {
                let (symbol, mut style) = match cell {
                    Some(Stone::Black) => (" ● ", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
                    Some(Stone::White) => (" ○ ", Style::default().fg(Color::White)),
                    None => (" · ", Style::default().fg(Color::DarkGray)),
                };
                if snapshot.last_move == Some((x, y)) {
                    style = style.fg(Color::Yellow);
                }
                if self.cursor == (x, y) {
                    style = style.bg(Color::DarkGray);
                }
                spans.push(Span::styled(symbol, style));
            }
            lines.push(Line::from(spans));
        }
        Paragraph::new(lines).render(inner, buf);
    }

    fn render_status(&self, snapshot: &GameSnapshot, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .border_style(Style::default().fg(Color::DarkGray))
            .padding(ratatui::widgets::Padding::uniform(1));
        let inner = block.inner(area);
        block.render(area, buf);

        let label = Style::default().fg(Color::Gray);
        let (turn_text, turn_color) = if snapshot.is_over() {
            ("Round over", Color::Magenta)
        } else if snapshot.is_local_turn() {
            ("Your move", Color::Green)
        } else {
            ("Opponent's move", Color::Yellow)
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Role   : ", label),
                Span::styled(snapshot.role.to_string(), Style::default().fg(Color::Cyan)),
            ]),
            Line::from(vec![
                Span::styled("Stone  : ", label),
                Span::styled(snapshot.role.stone().to_string(), Style::default().fg(Color::Cyan)),
            ]),
            Line::from(vec![
                Span::styled("Turn   : ", label),
                Span::styled(turn_text, Style::default().fg(turn_color).add_modifier(Modifier::BOLD)),
            ]),
            Line::from(vec![
                Span::styled("Stones : ", label),
                Span::raw(snapshot.board.stone_count().to_string()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                self.session.connection_status().to_string(),
                Style::default().fg(Color::DarkGray),
            )),
        ];
        if let Some(up) = self.session.connection_status().connected_duration() {
            let secs = up.as_secs();
            lines.push(Line::from(vec![
                Span::styled("Uptime : ", label),
                Span::raw(format!("{}m {:02}s", secs / 60, secs % 60)),
            ]));
        }
        if let Some(notice) = &self.notice {
            lines.push(Line::from(Span::styled(
                notice.as_str(),
                Style::default().fg(Color::Red),
            )));
        }
        Paragraph::new(lines).render(inner, buf);
    }

    fn render_result(&self, snapshot: &GameSnapshot, area: Rect, buf: &mut Buffer) {
        let (headline, color) = match snapshot.local_won() {
            Some(true) => ("You win!", Color::Green),
            Some(false) => ("You lose", Color::Red),
            None => ("Draw", Color::Yellow),
        };
        let popup = centered_rect(area, 30, 7);
        Clear.render(popup, buf);
        let block = Block::bordered()
            .border_set(border::THICK)
            .border_style(Style::default().fg(color));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let mut lines = vec![
            Line::from(Span::styled(
                headline,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("[N] Rematch  [Enter] Menu"),
        ];
        if let Some(error) = self.session.last_error() {
            lines.push(Line::from(Span::styled(error, Style::default().fg(Color::DarkGray))));
        }
        Paragraph::new(lines).centered().render(inner, buf);
    }

    fn render_key_bar(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(Span::styled(
                " Keys ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ))
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        let keys: &[&str] = match (self.session.phase(), self.menu_mode) {
            (SessionPhase::Menu, MenuMode::Choose) => &["[H] Host", "[J] Join", "[Q] Quit"],
            (SessionPhase::Menu, MenuMode::EnterAddress) => &["[Enter] Connect", "[Esc] Back"],
            (SessionPhase::Hosting | SessionPhase::Joining, _) => &["[Esc] Cancel", "[Q] Quit"],
            (SessionPhase::Active, _) => &[
                "[Arrows] Move",
                "[Enter/Space] Place",
                "[N] New game",
                "[Esc] Leave",
                "[Q] Quit",
            ],
            (SessionPhase::Finished, _) => &["[N] Rematch", "[Enter] Menu", "[Q] Quit"],
        };
        let spans: Vec<Span> = keys
            .iter()
            .map(|k| Span::styled(format!("{k}  "), Style::default().fg(Color::Gray)))
            .collect();
        Paragraph::new(Line::from(spans)).render(inner, buf);
    }
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use gomoku_core::ConnectionStatus;
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;

    fn new_app() -> App {
        let mut config = PeerConfig::default();
        config.network.bind_address = "127.0.0.1".into();
        config.network.port = 0;
        App::new(&config)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn rendered(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn cursor_stays_on_board() {
        let mut app = new_app();
        assert_eq!(app.cursor, (7, 7));

        app.cursor = (0, 0);
        app.move_cursor(-1, -1);
        assert_eq!(app.cursor, (0, 0));

        app.cursor = (BOARD_SIZE - 1, BOARD_SIZE - 1);
        app.move_cursor(1, 1);
        assert_eq!(app.cursor, (14, 14));

        app.move_cursor(-1, 0);
        assert_eq!(app.cursor, (13, 14));
    }

    #[tokio::test]
    async fn address_prompt_editing() {
        let mut app = new_app();
        app.on_key(press(KeyCode::Char('j'))).await;
        assert_eq!(app.menu_mode, MenuMode::EnterAddress);

        for c in "127.0.0.1:9x".chars() {
            app.on_key(press(KeyCode::Char(c))).await;
        }
        app.on_key(press(KeyCode::Backspace)).await;
        assert_eq!(app.address, "127.0.0.1:9");
        // 'q' is typed, not a quit, while entering an address.
        app.on_key(press(KeyCode::Char('q'))).await;
        assert!(!app.exit);
        assert_eq!(app.address, "127.0.0.1:9q");

        app.on_key(press(KeyCode::Esc)).await;
        assert_eq!(app.menu_mode, MenuMode::Choose);
        assert_eq!(app.session.phase(), SessionPhase::Menu);
    }

    #[tokio::test]
    async fn bad_address_stays_in_menu() {
        let mut app = new_app();
        app.start_join("host:notaport");
        assert_eq!(app.session.phase(), SessionPhase::Menu);
        assert!(app.notice.as_deref().unwrap().starts_with("Bad address"));
    }

    #[tokio::test]
    async fn join_without_port_uses_configured_port() {
        let mut config = PeerConfig::default();
        config.network.port = 6000;
        let mut app = App::new(&config);

        app.start_join("127.0.0.1");
        assert_eq!(app.session.phase(), SessionPhase::Joining);
        assert_eq!(
            app.session.connection_status(),
            ConnectionStatus::Connecting {
                target: "127.0.0.1:6000".into()
            }
        );
        app.session.cancel();
    }

    #[tokio::test]
    async fn quit_keys() {
        let mut app = new_app();
        app.on_key(press(KeyCode::Char('q'))).await;
        assert!(app.exit);

        let mut app = new_app();
        app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
            .await;
        assert!(app.exit);
    }

    #[tokio::test]
    async fn host_then_cancel() {
        let mut app = new_app();
        app.on_key(press(KeyCode::Char('h'))).await;
        assert_eq!(app.session.phase(), SessionPhase::Hosting);
        assert!(app.hosted_on.is_some());
        assert!(rendered(&app).contains("Waiting for opponent"));

        app.on_key(press(KeyCode::Esc)).await;
        assert_eq!(app.session.phase(), SessionPhase::Menu);
        assert!(app.hosted_on.is_none());
    }

    #[tokio::test]
    async fn two_apps_play_a_move() {
        let mut host = new_app();
        host.start_host().await;
        let port = host.hosted_on.unwrap().port();

        let mut guest = new_app();
        guest.start_join(&format!("127.0.0.1:{port}"));
        guest.session.wait_connected().await.unwrap();
        host.session.wait_connected().await.unwrap();
        host.tick();
        guest.tick();
        assert_eq!(host.session.phase(), SessionPhase::Active);

        host.on_key(press(KeyCode::Left)).await;
        host.on_key(press(KeyCode::Enter)).await;
        assert_eq!(host.session.board().get(6, 7), Some(Stone::Black));
        assert!(host.notice.is_none());

        // Host has to wait for the guest now.
        host.on_key(press(KeyCode::Char(' '))).await;
        assert!(host.notice.is_some());

        let screen = rendered(&host);
        assert!(screen.contains("Board"));
        assert!(screen.contains("Opponent's move"));
        assert!(screen.contains("Uptime"));
    }

    #[test]
    fn menu_renders_choices() {
        let screen = rendered(&new_app());
        assert!(screen.contains("[H] Host"));
        assert!(screen.contains("[J] Join"));
        assert!(screen.contains("Gomoku"));
    }
}
