//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs, Wrap},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use tracdash_core::{
    ConnectionConfig, CoreError, DeviceId, Formatter, ReportOutcome, Route, Session,
    TripReportParams,
};

use crate::action::{Action, ConfirmAction, Notification, NotificationLevel, TripReportResult};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;

/// How long a toast stays up.
const TOAST_TTL: Duration = Duration::from_secs(3);

/// Connection status as seen by the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Knobs set from the command line.
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Device and position re-poll interval.
    pub refresh_interval: Duration,
    /// Where spreadsheet exports are written.
    pub download_dir: PathBuf,
}

/// Top-level application state and event loop.
pub struct App {
    active_screen: ScreenId,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    connection_status: ConnectionStatus,
    help_visible: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Taken by the data bridge on start.
    connection: Option<ConnectionConfig>,
    options: AppOptions,
    session: Option<Session>,
    /// Default until the session's preferences arrive.
    formatter: Formatter,
    data_cancel: CancellationToken,
    /// Pending confirmation dialog (blocks other input while active).
    pending_confirm: Option<ConfirmAction>,
    /// Active toast with its display timestamp.
    notification: Option<(Notification, Instant)>,
}

impl App {
    pub fn new(connection: ConnectionConfig, options: AppOptions) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screens: HashMap<ScreenId, Box<dyn Component>> = create_screens().into_iter().collect();

        Self {
            active_screen: ScreenId::default(),
            screens,
            running: true,
            connection_status: ConnectionStatus::default(),
            help_visible: false,
            action_tx,
            action_rx,
            connection: Some(connection),
            options,
            session: None,
            formatter: Formatter::default(),
            data_cancel: CancellationToken::new(),
            pending_confirm: None,
            notification: None,
        }
    }

    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    /// Run the main event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_screens()?;

        if let Some(config) = self.connection.take() {
            let cancel = self.data_cancel.clone();
            let tx = self.action_tx.clone();
            let interval = self.options.refresh_interval;
            tokio::spawn(async move {
                crate::data_bridge::spawn_data_bridge(config, interval, tx, cancel).await;
            });
        }

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(action) = self.handle_mouse_event(mouse)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Global keys are handled here; the rest go to the active screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.pending_confirm.is_some() {
            return Ok(match key.code {
                KeyCode::Char('y' | 'Y') => Some(Action::ConfirmYes),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(Action::ConfirmNo),
                _ => None,
            });
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        let Some(screen) = self.screens.get_mut(&self.active_screen) else {
            return Ok(None);
        };
        if screen.captures_input() {
            return screen.handle_key_event(key);
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='9')) => {
                let n = c.to_digit(10).and_then(|d| u8::try_from(d).ok());
                if let Some(target) = n.and_then(ScreenId::from_number) {
                    return Ok(Some(Action::SwitchScreen(target)));
                }
            }
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }
            _ => {}
        }

        screen.handle_key_event(key)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if self.pending_confirm.is_some() || self.help_visible {
            return Ok(None);
        }
        match self.screens.get_mut(&self.active_screen) {
            Some(screen) => screen.handle_mouse_event(mouse),
            None => Ok(None),
        }
    }

    /// Forward to one screen, queueing any follow-up.
    fn forward(&mut self, id: ScreenId, action: &Action) -> Result<()> {
        if let Some(screen) = self.screens.get_mut(&id) {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Render | Action::Resize(..) => {}

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(false);
                    }
                    self.active_screen = *target;
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(true);
                    }
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() > TOAST_TTL)
                {
                    self.notification = None;
                }
                self.forward(self.active_screen, action)?;
            }

            // ── Connection ───────────────────────────────────────────
            Action::Connecting => self.connection_status = ConnectionStatus::Connecting,

            Action::Connected(session) => {
                self.connection_status = ConnectionStatus::Connected;
                self.formatter = session.formatter().clone();
                self.session = Some(session.clone());
                self.broadcast(action)?;
            }

            Action::Disconnected(reason) => {
                self.connection_status = ConnectionStatus::Disconnected;
                self.notify(Notification::error(reason.clone()));
            }

            Action::DevicesUpdated(_) | Action::PositionsUpdated(_) => self.broadcast(action)?,

            // ── Status card ──────────────────────────────────────────
            Action::SelectDevice(selected) => {
                self.forward(ScreenId::Devices, action)?;
                match selected {
                    Some(id) => self.poll_status(*id),
                    None => {
                        if let Some(ref session) = self.session {
                            session.cancel_status();
                        }
                    }
                }
            }

            Action::StatusPolled(poll) => {
                let errors: Vec<String> = poll.errors().iter().map(ToString::to_string).collect();
                if !errors.is_empty() {
                    self.notify(Notification::warning(errors.join("; ")));
                }
                self.forward(ScreenId::Devices, action)?;
            }

            Action::SendCapability(id, capability) => {
                let id = *id;
                let capability = *capability;
                let label = self.formatter.t(capability.label_key());
                self.spawn(move |session| async move {
                    match session.send(id, capability).await {
                        Ok(()) => {
                            let poll = session.refresh_status(id).await;
                            let mut actions = vec![Action::Notify(Notification::success(label))];
                            actions.extend(poll.map(Action::StatusPolled));
                            actions
                        }
                        Err(e) => vec![failed("command", &e)],
                    }
                });
            }

            Action::CreateGeofence(id) => {
                let id = *id;
                let base = self.base_url();
                self.spawn(move |session| async move {
                    match session.create_geofence(id).await {
                        Ok(route) => vec![Action::Notify(Notification::success(format!(
                            "Geofence created: {}",
                            route_text(base.as_ref(), route)
                        )))],
                        Err(e) => vec![failed("geofence", &e)],
                    }
                });
            }

            Action::RequestRemove(id) => {
                let name = self.device_name(*id);
                self.action_tx
                    .send(Action::ShowConfirm(ConfirmAction::RemoveDevice { id: *id, name }))?;
            }

            Action::OpenRoute(route) => {
                let text = route_text(self.base_url().as_ref(), *route);
                self.notify(Notification::info(text));
            }

            Action::OpenLink { title, url } => {
                self.notify(Notification::info(format!("{title}: {url}")));
            }

            // ── Trip report ──────────────────────────────────────────
            Action::RunTripReport(params) => self.run_trip_report(params.clone()),

            Action::TripReportFinished(result) => {
                match result {
                    TripReportResult::Rows(rows) => {
                        debug!(rows = rows.len(), "trip report loaded");
                    }
                    TripReportResult::Saved(path) => {
                        self.notify(Notification::success(format!("Saved {}", path.display())));
                    }
                    TripReportResult::Empty => {
                        self.notify(Notification::info("Report requested"));
                    }
                    TripReportResult::Failed(message) => {
                        self.notify(Notification::error(message.clone()));
                    }
                }
                self.forward(ScreenId::Trips, action)?;
            }

            // ── Confirm dialog ───────────────────────────────────────
            Action::ShowConfirm(confirm) => self.pending_confirm = Some(confirm.clone()),

            Action::ConfirmYes => {
                if let Some(confirm) = self.pending_confirm.take() {
                    self.execute_confirm(confirm);
                }
            }

            Action::ConfirmNo => self.pending_confirm = None,

            Action::Notify(notification) => self.notify(notification.clone()),
        }
        Ok(())
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some((notification, Instant::now()));
    }

    fn base_url(&self) -> Option<Url> {
        self.session.as_ref().map(|s| s.base_url().clone())
    }

    fn device_name(&self, id: DeviceId) -> String {
        self.session
            .as_ref()
            .and_then(|s| s.store().device(id))
            .map_or_else(|| id.to_string(), |d| d.name.clone())
    }

    // ── Background work ──────────────────────────────────────────────

    /// Run `task` against the session and dispatch whatever it returns.
    fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Vec<Action>> + Send + 'static,
    {
        let Some(session) = self.session.clone() else {
            let _ = self
                .action_tx
                .send(Action::Notify(Notification::error("Not connected")));
            return;
        };
        let tx = self.action_tx.clone();
        let fut = task(session);
        tokio::spawn(async move {
            for action in fut.await {
                let _ = tx.send(action);
            }
        });
    }

    fn poll_status(&self, id: DeviceId) {
        self.spawn(move |session| async move {
            session
                .poll_status(id)
                .await
                .map(Action::StatusPolled)
                .into_iter()
                .collect::<Vec<_>>()
        });
    }

    fn run_trip_report(&self, params: TripReportParams) {
        let download_dir = self.options.download_dir.clone();
        let tx = self.action_tx.clone();
        let Some(session) = self.session.clone() else {
            let _ = tx.send(Action::TripReportFinished(TripReportResult::Failed(
                "Not connected".into(),
            )));
            return;
        };
        tokio::spawn(async move {
            let result = match session.trip_report(&params).await {
                Ok(ReportOutcome::Rows(rows)) => TripReportResult::Rows(Arc::new(rows)),
                Ok(ReportOutcome::Download(file)) => match file.save_in(&download_dir) {
                    Ok(path) => TripReportResult::Saved(path),
                    Err(e) => TripReportResult::Failed(e.to_string()),
                },
                Ok(ReportOutcome::Nothing) => TripReportResult::Empty,
                Err(e) => {
                    warn!(error = %e, "trip report failed");
                    TripReportResult::Failed(e.to_string())
                }
            };
            let _ = tx.send(Action::TripReportFinished(result));
        });
    }

    fn execute_confirm(&self, confirm: ConfirmAction) {
        match confirm {
            ConfirmAction::RemoveDevice { id, name } => {
                self.spawn(move |session| async move {
                    match session.remove_device(id).await {
                        Ok(()) => vec![
                            Action::SelectDevice(None),
                            Action::Notify(Notification::success(format!("Removed {name}"))),
                        ],
                        Err(e) => vec![failed("remove", &e)],
                    }
                });
            }
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::vertical([
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Tab bar
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, layout[0]);
        }
        self.render_tab_bar(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        if let Some((ref notification, _)) = self.notification {
            render_notification(frame, area, notification);
        }
        if let Some(ref confirm) = self.pending_confirm {
            render_confirm_dialog(frame, area, confirm);
        }
        if self.help_visible {
            render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(
                    format!(" {} {} ", id.number(), self.formatter.t(id.label_key())),
                    style,
                ))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );
        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let indicator = match self.connection_status {
            ConnectionStatus::Connected => {
                Span::styled("● connected", Style::default().fg(theme::SUCCESS_GREEN))
            }
            ConnectionStatus::Disconnected => {
                Span::styled("○ disconnected", Style::default().fg(theme::ERROR_RED))
            }
            ConnectionStatus::Connecting => {
                Span::styled("◐ connecting", Style::default().fg(theme::ELECTRIC_YELLOW))
            }
        };

        let mut spans = vec![Span::raw(" "), indicator];
        if let Some(ref session) = self.session {
            spans.push(Span::styled(
                format!("  {}", session.user().name),
                Style::default().fg(theme::NEON_CYAN),
            ));
        }
        if let Some(screen) = self.screens.get(&self.active_screen) {
            let hints = screen.hints();
            if !hints.is_empty() {
                spans.push(Span::styled(format!(" │ {hints}"), theme::key_hint()));
            }
        }
        spans.push(Span::styled(" │ ? help  q quit", theme::key_hint()));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Absolute page URL when the server is known, else the bare path.
fn route_text(base: Option<&Url>, route: Route) -> String {
    base.and_then(|b| route.url(b).ok())
        .map_or_else(|| route.path(), |u| u.to_string())
}

fn failed(what: &str, error: &CoreError) -> Action {
    warn!(error = %error, "{what} failed");
    Action::Notify(Notification::error(error.to_string()))
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn help_line(key: &'static str, text: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
        Span::styled(text, theme::key_hint()),
    ])
}

fn help_section(title: &'static str) -> [Line<'static>; 2] {
    [
        Line::from(Span::styled(format!("  {title}"), Style::default().fg(theme::NEON_CYAN))),
        Line::from(Span::styled(format!("  {}", "─".repeat(title.len())), theme::key_hint())),
    ]
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_area = centered(area, 62, 30);
    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let mut lines = vec![Line::from("")];
    lines.extend(help_section("Navigation"));
    lines.extend([
        help_line("1-2 Tab", "Switch screen"),
        help_line("j/k ↑/↓", "Move up/down"),
        help_line("g/G", "Top / bottom"),
        help_line("Ctrl+d/u", "Page down / up"),
    ]);
    lines.push(Line::from(""));
    lines.extend(help_section("Status card"));
    lines.extend([
        help_line("Enter", "Open card for the device"),
        help_line("a", "Add device (admin)"),
        help_line("H/J/K/L", "Move card (or drag it)"),
        help_line("0", "Reset card position"),
        help_line("m", "More: geofence, links, share"),
        help_line("v o b", "Live mode / light / buzzer"),
        help_line("r c e x", "Replay / command / edit / remove"),
        help_line("d i", "Details / image"),
        help_line("Esc", "Close card"),
    ]);
    lines.push(Line::from(""));
    lines.extend(help_section("Trips"));
    lines.extend([
        help_line("f", "Edit filter"),
        help_line("s e", "Show / export"),
        help_line("c", "Choose columns"),
    ]);
    lines.push(Line::from(""));
    lines.extend([help_line("?", "This help"), help_line("q", "Quit")]);

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_confirm_dialog(frame: &mut Frame, area: Rect, confirm: &ConfirmAction) {
    let dialog_area = centered(area, 50, 6);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .title(" Confirm ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::ELECTRIC_YELLOW))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let text = vec![
        Line::from(Span::styled(
            format!("  {confirm}"),
            Style::default().fg(theme::DIM_WHITE),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y ", theme::key_hint_key()),
            Span::styled("confirm    ", theme::key_hint()),
            Span::styled("n ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]),
    ];
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), inner);
}

/// Toast in the bottom-right corner, above the status bar.
fn render_notification(frame: &mut Frame, area: Rect, notification: &Notification) {
    let message_width = u16::try_from(notification.message.chars().count()).unwrap_or(u16::MAX);
    let width = message_width
        .saturating_add(6)
        .clamp(20, 72)
        .min(area.width);
    let lines = message_width.div_ceil(width.saturating_sub(6).max(1)).clamp(1, 4);
    let height = (lines + 2).min(area.height);

    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 2);
    let toast_area = Rect::new(area.x + x, area.y + y, width, height);

    let (border_color, icon) = match notification.level {
        NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
        NotificationLevel::Error => (theme::ERROR_RED, "✗"),
        NotificationLevel::Warning => (theme::ELECTRIC_YELLOW, "!"),
        NotificationLevel::Info => (theme::NEON_CYAN, "·"),
    };

    frame.render_widget(Clear, toast_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(toast_area);
    frame.render_widget(block, toast_area);

    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
        Span::styled(notification.message.as_str(), Style::default().fg(theme::DIM_WHITE)),
    ]);
    frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn route_text_prefers_absolute_url() {
        let base = Url::parse("https://gps.example.com/").ok();
        assert_eq!(
            route_text(base.as_ref(), Route::DeviceSettings(DeviceId(5))),
            "https://gps.example.com/settings/device/5"
        );
        assert_eq!(route_text(None, Route::Replay), "/replay");
    }

    #[test]
    fn centered_rect_fits_small_areas() {
        assert_eq!(centered(Rect::new(0, 0, 100, 40), 50, 6), Rect::new(25, 17, 50, 6));
        assert_eq!(centered(Rect::new(0, 0, 30, 4), 50, 6), Rect::new(0, 0, 30, 4));
    }
}
