//! App — component-based event loop for the guide.
//!
//! - `App` owns every component and the `AppState` they read.
//! - Terminal input, tracker snapshots and finished tracker calls arrive as
//!   `AppMessage`s over a single mpsc channel.
//! - Components return `Vec<Action>`; the App applies them. Tracker calls are
//!   spawned so a slow schedule service never blocks drawing.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use ott_proto::clock::Clock;
use ott_proto::live_channels::{LiveChannelsHandle, LiveSnapshot};
use ott_proto::messages::user_message;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::{
        channel_grid::ChannelGrid, help_overlay::HelpOverlay, now_playing::NowPlaying,
        schedule_list::ScheduleList,
    },
    focus::FocusRing,
    widgets::{
        status_bar,
        toast::{Severity, ToastManager},
    },
};

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    LiveUpdated(LiveSnapshot),
    /// Outcome of a manual refresh; the error is a message code.
    RefreshDone(Result<(), &'static str>),
    CommandFailed(&'static str),
}

const NOW_PLAYING_HEIGHT: u16 = 7;

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    pub state: AppState,

    now_playing: NowPlaying,
    channel_grid: ChannelGrid,
    schedule: ScheduleList,
    help_overlay: HelpOverlay,

    focus: FocusRing,
    toast: ToastManager,

    live: LiveChannelsHandle,
    clock: Arc<dyn Clock>,
    /// Set once `run` has created the message channel.
    tx: Option<mpsc::Sender<AppMessage>>,
    should_quit: bool,
}

impl App {
    pub fn new(
        live: LiveChannelsHandle,
        clock: Arc<dyn Clock>,
        card_width: u16,
        http_addr: Option<String>,
    ) -> Self {
        let mut state = AppState::new(live.snapshot(), clock.now());
        state.card_width = card_width;
        state.http_addr = http_addr;
        Self {
            state,
            now_playing: NowPlaying::new(),
            channel_grid: ChannelGrid::new(),
            schedule: ScheduleList::new(),
            help_overlay: HelpOverlay::new(),
            focus: FocusRing::new(vec![ComponentId::ChannelGrid, ComponentId::Schedule]),
            toast: ToastManager::new(),
            live,
            clock,
            tx: None,
            should_quit: false,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        debug!("run(): terminal ready, size={:?}", terminal.size());

        let result = self.event_loop(&mut terminal).await;

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<AppMessage>(256);
        self.tx = Some(tx.clone());

        // ── Background task: terminal events ─────────────────────────────────
        // Polls so the thread notices the app has gone away.
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || {
            while !event_tx.is_closed() {
                match event::poll(Duration::from_millis(250)) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(_) => break,
                }
                match event::read() {
                    Ok(ev) => {
                        if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        // ── Background task: tracker snapshots ───────────────────────────────
        let mut snapshots = self.live.subscribe();
        let live_tx = tx.clone();
        tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                let snapshot = snapshots.borrow_and_update().clone();
                if live_tx.send(AppMessage::LiveUpdated(snapshot)).await.is_err() {
                    break;
                }
            }
        });
        self.handle_message(AppMessage::LiveUpdated(self.live.snapshot()));

        // ── Periodic timers ───────────────────────────────────────────────────
        // Clock + progress bars.
        let mut ui_tick = tokio::time::interval(Duration::from_secs(1));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Toast expiry + spinner animation.
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!("[ui] started");
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg);
                }

                _ = ui_tick.tick() => {
                    self.state.now = self.clock.now();
                    let tick_actions: Vec<Action> = {
                        let s = &self.state;
                        let mut all = Vec::new();
                        all.extend(self.channel_grid.tick(s));
                        all.extend(self.schedule.tick(s));
                        all
                    };
                    for action in tick_actions {
                        self.dispatch(action);
                    }
                    needs_redraw = true;
                }

                _ = toast_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }
            }
        }

        info!("[ui] quit");
        Ok(())
    }

    /// Returns whether a redraw is needed.
    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                if key.kind == KeyEventKind::Release {
                    return false;
                }
                for action in self.handle_key(key) {
                    self.dispatch(action);
                }
                true
            }
            AppMessage::Event(Event::Resize(..)) => true,
            AppMessage::Event(_) => false,
            AppMessage::LiveUpdated(snapshot) => {
                self.state.live = snapshot;
                self.dispatch(Action::LiveUpdated);
                true
            }
            AppMessage::RefreshDone(Ok(())) => {
                self.toast.resolve_spinner(Severity::Success, "guide updated");
                true
            }
            AppMessage::RefreshDone(Err(code)) => {
                self.toast.resolve_spinner(Severity::Error, user_message(code));
                true
            }
            AppMessage::CommandFailed(code) => {
                self.toast.error(user_message(code));
                true
            }
        }
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if self.help_overlay.visible {
            return self.help_overlay.handle_key(key, &self.state);
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return vec![Action::Quit],
            KeyCode::Char('q') => return vec![Action::Quit],
            KeyCode::Char('?') => return vec![Action::ToggleHelp],
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            KeyCode::Char('1') => return vec![Action::FocusPane(ComponentId::ChannelGrid)],
            KeyCode::Char('2') => return vec![Action::FocusPane(ComponentId::Schedule)],
            KeyCode::Char('r') => return vec![Action::Refresh],
            KeyCode::Char('a') => return vec![Action::ToggleAutoUpdate],
            KeyCode::Char('l') => return vec![Action::GoLive],
            _ => {}
        }

        let s = &self.state;
        match self.focus.current() {
            Some(ComponentId::ChannelGrid) => self.channel_grid.handle_key(key, s),
            Some(ComponentId::Schedule) => self.schedule.handle_key(key, s),
            _ => vec![],
        }
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.now_playing.on_action(&action, s));
            out.extend(self.channel_grid.on_action(&action, s));
            out.extend(self.schedule.on_action(&action, s));
            out.extend(self.help_overlay.on_action(&action, s));
            out
        };

        self.apply_action(action);

        // One level deep.
        for a in secondary {
            self.apply_action(a);
        }
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => self.focus.set(id),
            Action::SelectChannel(channel_id) => self.spawn_select(channel_id, None),
            Action::PinProgram {
                channel_id,
                program_id,
            } => self.spawn_select(channel_id, Some(program_id)),
            Action::GoLive => {
                if let Some(channel_id) = self.state.live.channel_id() {
                    self.spawn_select(channel_id.to_string(), None);
                }
            }
            Action::Refresh => self.spawn_refresh(),
            Action::ToggleAutoUpdate => {
                let enabled = !self.state.live.auto_update;
                self.toast.info(if enabled {
                    "auto update on"
                } else {
                    "auto update off"
                });
                let live = self.live.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = live.set_auto_update(enabled).await {
                        report(tx, AppMessage::CommandFailed(e.code())).await;
                    }
                });
            }
            Action::Notify(code) => self.toast.push(user_message(code), Severity::Warning),
            Action::Quit => self.should_quit = true,
            // Handled by the components themselves.
            Action::LiveUpdated | Action::ToggleHelp => {}
        }
    }

    fn spawn_select(&self, channel_id: String, program_id: Option<String>) {
        debug!("[ui] select {} / {:?}", channel_id, program_id);
        let live = self.live.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let code = match live.set_active_channel(channel_id, program_id).await {
                Ok(true) => return,
                Ok(false) => "unknown_channel",
                Err(e) => e.code(),
            };
            report(tx, AppMessage::CommandFailed(code)).await;
        });
    }

    fn spawn_refresh(&mut self) {
        self.toast.spinner("refreshing guide…");
        let live = self.live.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = live.refresh().await.map_err(|e| e.code());
            report(tx, AppMessage::RefreshDone(result)).await;
        });
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header, body, status] = Layout::vertical([
            Constraint::Length(NOW_PLAYING_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);
        let [grid, schedule] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(body);

        let s = &self.state;
        let grid_focused = self.focus.is_focused(self.channel_grid.id());
        let schedule_focused = self.focus.is_focused(self.schedule.id());
        self.now_playing.draw(frame, header, false, s);
        self.channel_grid.draw(frame, grid, grid_focused, s);
        self.schedule.draw(frame, schedule, schedule_focused, s);
        status_bar::draw_status_bar(frame, status, s);

        self.help_overlay.draw(frame, area, true, s);
        self.toast.draw(frame, area);
    }
}

async fn report(tx: Option<mpsc::Sender<AppMessage>>, msg: AppMessage) {
    if let Some(tx) = tx {
        let _ = tx.send(msg).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, Utc};
    use futures_util::future::BoxFuture;
    use ott_proto::clock::AnchoredClock;
    use ott_proto::error::ScheduleError;
    use ott_proto::live_channels::{LiveChannels, LiveOptions};
    use ott_proto::models::{Channel, PlaylistItem};
    use ott_proto::schedule::ScheduleService;

    struct EmptyService;

    impl ScheduleService for EmptyService {
        fn get_schedules(
            &self,
            _playlist: Vec<PlaylistItem>,
        ) -> BoxFuture<'static, Result<Vec<Channel>, ScheduleError>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    fn app() -> App {
        let now = DateTime::parse_from_rfc3339("2022-07-15T10:45:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let clock: Arc<dyn Clock> = Arc::new(AnchoredClock::new(now));
        let live = LiveChannels::spawn(
            Arc::new(EmptyService),
            Vec::new(),
            LiveOptions::default(),
            Arc::clone(&clock),
        );
        App::new(live, clock, 28, None)
    }

    fn press(app: &mut App, code: KeyCode) {
        let key = KeyEvent::new(code, KeyModifiers::NONE);
        app.handle_message(AppMessage::Event(Event::Key(key)));
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);

        let mut app = self::app();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        app.handle_message(AppMessage::Event(Event::Key(key)));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_focus_keys() {
        let mut app = app();
        assert!(app.focus.is_focused(ComponentId::ChannelGrid));
        press(&mut app, KeyCode::Tab);
        assert!(app.focus.is_focused(ComponentId::Schedule));
        press(&mut app, KeyCode::Char('1'));
        assert!(app.focus.is_focused(ComponentId::ChannelGrid));
        press(&mut app, KeyCode::BackTab);
        assert!(app.focus.is_focused(ComponentId::Schedule));
    }

    #[tokio::test]
    async fn test_help_overlay_captures_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.help_overlay.visible);

        // 'q' closes the overlay instead of quitting.
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.help_overlay.visible);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_refresh_result_resolves_spinner() {
        let mut app = app();
        app.toast.spinner("refreshing guide…");
        app.handle_message(AppMessage::RefreshDone(Err("network_error")));
        assert!(!app.toast.is_empty());
    }
}
