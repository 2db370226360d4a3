//! Devices screen: device table with a movable status card for the
//! selected device.

use std::cell::Cell as StdCell;
use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use tracdash_core::{
    CardAction, CollectionFab, Device, DeviceId, Formatter, MenuEntry, Position, Session,
    StatusCard, StatusPoll,
};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::status_card;

/// Cells moved per H/J/K/L press.
const MOVE_STEP: (i32, i32) = (4, 2);

const ADD_DEVICE: CollectionFab = CollectionFab::new("/settings/device");

pub struct DevicesScreen {
    focused: bool,
    session: Option<Session>,
    formatter: Formatter,
    /// Sorted by name.
    devices: Vec<Arc<Device>>,
    positions: HashMap<DeviceId, Arc<Position>>,
    table_state: TableState,
    /// Device the card is open for.
    selected: Option<DeviceId>,
    status: Option<StatusPoll>,
    card: Option<StatusCard>,
    /// Open "more" menu and its highlighted entry.
    menu: Option<usize>,
    card_offset: (i32, i32),
    /// Last mouse position while dragging the card.
    drag: Option<(u16, u16)>,
    last_card: StdCell<Rect>,
}

impl DevicesScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            session: None,
            formatter: Formatter::default(),
            devices: Vec::new(),
            positions: HashMap::new(),
            table_state: TableState::default(),
            selected: None,
            status: None,
            card: None,
            menu: None,
            card_offset: (0, 0),
            drag: None,
            last_card: StdCell::new(Rect::default()),
        }
    }

    fn selected_index(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    fn highlighted(&self) -> Option<&Arc<Device>> {
        self.devices.get(self.selected_index())
    }

    /// Move the highlight; an open card follows it.
    fn move_selection(&mut self, delta: isize) -> Option<Action> {
        if self.devices.is_empty() {
            return None;
        }
        let last = self.devices.len() - 1;
        let next = self.selected_index().saturating_add_signed(delta).min(last);
        self.table_state.select(Some(next));
        self.follow_highlight()
    }

    fn follow_highlight(&self) -> Option<Action> {
        let id = self.highlighted()?.id;
        (self.selected.is_some() && self.selected != Some(id))
            .then_some(Action::SelectDevice(Some(id)))
    }

    fn rebuild_card(&mut self) {
        self.card = match (&self.session, self.selected) {
            (Some(session), Some(id)) => session.status_card(id, self.status.as_ref(), false),
            _ => None,
        };
        if self.card.as_ref().is_none_or(|c| c.menu.is_empty()) {
            self.menu = None;
        }
    }

    fn set_devices(&mut self, devices: &[Arc<Device>]) -> Option<Action> {
        let highlighted = self.highlighted().map(|d| d.id);
        let mut sorted = devices.to_vec();
        sorted.sort_by_key(|d| d.name.to_lowercase());
        self.devices = sorted;

        let index = highlighted
            .and_then(|id| self.devices.iter().position(|d| d.id == id))
            .unwrap_or(0)
            .min(self.devices.len().saturating_sub(1));
        self.table_state.select((!self.devices.is_empty()).then_some(index));

        // The card's device is gone (e.g. just removed).
        if let Some(id) = self.selected {
            if !self.devices.iter().any(|d| d.id == id) {
                return Some(Action::SelectDevice(None));
            }
        }
        self.rebuild_card();
        None
    }

    fn card_key(&mut self, card: &StatusCard, key: KeyEvent) -> Option<Action> {
        let KeyCode::Char(c) = key.code else {
            return None;
        };
        match c {
            'H' => self.nudge(-MOVE_STEP.0, 0),
            'L' => self.nudge(MOVE_STEP.0, 0),
            'K' => self.nudge(0, -MOVE_STEP.1),
            'J' => self.nudge(0, MOVE_STEP.1),
            '0' => self.card_offset = (0, 0),
            'd' => return card.details.map(Action::OpenRoute),
            'i' => return self.image_link(card.device_id),
            _ => {}
        }

        let action = status_card::action_for_key(card, c)?;
        if !card.is_enabled(action) {
            return None;
        }
        match action {
            CardAction::More => {
                self.menu = Some(0);
                None
            }
            CardAction::Capability(capability) => {
                Some(Action::SendCapability(card.device_id, capability))
            }
            CardAction::Remove => Some(Action::RequestRemove(card.device_id)),
            CardAction::Replay | CardAction::SendCommand | CardAction::Edit => {
                card.route_for(action).map(Action::OpenRoute)
            }
        }
    }

    fn image_link(&self, id: DeviceId) -> Option<Action> {
        let session = self.session.as_ref()?;
        let device = self.devices.iter().find(|d| d.id == id)?;
        let url = session.device_image_url(device)?;
        Some(Action::OpenLink {
            title: device.name.clone(),
            url: url.to_string(),
        })
    }

    fn nudge(&mut self, dx: i32, dy: i32) {
        self.card_offset.0 += dx;
        self.card_offset.1 += dy;
    }

    fn menu_key(&mut self, key: KeyEvent) -> Option<Action> {
        let card = self.card.as_ref()?;
        let index = self.menu?;
        let last = card.menu.len().saturating_sub(1);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.menu = Some((index + 1).min(last)),
            KeyCode::Char('k') | KeyCode::Up => self.menu = Some(index.saturating_sub(1)),
            KeyCode::Esc | KeyCode::Char('m') => self.menu = None,
            KeyCode::Enter => {
                let action = match card.menu.get(index)? {
                    MenuEntry::CreateGeofence => Action::CreateGeofence(card.device_id),
                    MenuEntry::Link { title, url } => Action::OpenLink {
                        title: title.clone(),
                        url: url.clone(),
                    },
                    MenuEntry::Share(route) => Action::OpenRoute(*route),
                };
                self.menu = None;
                return Some(action);
            }
            _ => {}
        }
        None
    }

    fn device_row(&self, device: &Device, is_selected: bool) -> Row<'static> {
        let fmt = &self.formatter;
        let position = self.positions.get(&device.id);
        let prefix = if is_selected { "▸" } else { " " };
        let dot = if self.selected == Some(device.id) { "◆" } else { "●" };

        let last_update = device
            .last_update
            .as_ref()
            .map_or_else(|| "─".to_owned(), |t| fmt.datetime(t));
        let speed = position.map_or_else(|| "─".to_owned(), |p| fmt.speed(p.speed));
        let location = position.map_or_else(
            || "─".to_owned(),
            |p| {
                p.address
                    .clone()
                    .unwrap_or_else(|| format!("{:.5}, {:.5}", p.latitude, p.longitude))
            },
        );

        let name_style = if is_selected {
            Style::default().fg(theme::NEON_CYAN).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme::NEON_CYAN)
        };
        let row_style = if is_selected {
            theme::table_selected()
        } else {
            theme::table_row()
        };

        Row::new(vec![
            Cell::from(format!("{prefix}{dot}"))
                .style(Style::default().fg(theme::status_color(device.status))),
            Cell::from(device.name.clone()).style(name_style),
            Cell::from(device.unique_id.clone()),
            Cell::from(device.status.to_string()),
            Cell::from(last_update),
            Cell::from(speed).style(Style::default().fg(theme::CORAL)),
            Cell::from(location),
        ])
        .style(row_style)
    }
}

impl Component for DevicesScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.menu.is_some() {
            return Ok(self.menu_key(key));
        }

        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('g') => self.move_selection(isize::MIN),
            KeyCode::Char('G') => self.move_selection(isize::MAX),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(10)
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(-10)
            }
            KeyCode::Enter => self.highlighted().map(|d| Action::SelectDevice(Some(d.id))),
            KeyCode::Char('a') if self.card.is_none() => self
                .session
                .as_ref()
                .and_then(|s| ADD_DEVICE.target(s.permissions()))
                .map(Action::OpenRoute),
            KeyCode::Esc if self.selected.is_some() => Some(Action::SelectDevice(None)),
            _ => match self.card.clone() {
                Some(card) => self.card_key(&card, key),
                None => None,
            },
        };
        Ok(action)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if self.card.is_some() => {
                let rect = self.last_card.get();
                let on_card = mouse.column >= rect.x
                    && mouse.column < rect.x + rect.width
                    && mouse.row >= rect.y
                    && mouse.row < rect.y + rect.height;
                self.drag = on_card.then_some((mouse.column, mouse.row));
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((x, y)) = self.drag {
                    self.nudge(
                        i32::from(mouse.column) - i32::from(x),
                        i32::from(mouse.row) - i32::from(y),
                    );
                    self.drag = Some((mouse.column, mouse.row));
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.drag = None,
            MouseEventKind::ScrollDown => return Ok(self.move_selection(1)),
            MouseEventKind::ScrollUp => return Ok(self.move_selection(-1)),
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Connected(session) => {
                self.formatter = session.formatter().clone();
                self.session = Some(session.clone());
                self.rebuild_card();
            }
            Action::DevicesUpdated(devices) => return Ok(self.set_devices(devices)),
            Action::PositionsUpdated(positions) => {
                self.positions = positions.iter().map(|p| (p.device_id, Arc::clone(p))).collect();
                self.rebuild_card();
            }
            Action::SelectDevice(selected) => {
                if *selected != self.selected {
                    self.status = None;
                    self.menu = None;
                }
                self.selected = *selected;
                let index = selected.and_then(|id| self.devices.iter().position(|d| d.id == id));
                if index.is_some() {
                    self.table_state.select(index);
                }
                self.rebuild_card();
            }
            Action::StatusPolled(poll) if Some(poll.device_id) == self.selected => {
                self.status = Some(poll.clone());
                self.rebuild_card();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" {} ({}) ", self.formatter.t("deviceTitle"), self.devices.len());
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.devices.is_empty() {
            let empty = format!("  {}", self.formatter.t("sharedNoData"));
            frame.render_widget(Paragraph::new(Span::styled(empty, theme::key_hint())), inner);
            return;
        }

        let fmt = &self.formatter;
        let header = Row::new(vec![
            Cell::from(""),
            Cell::from(fmt.t("sharedName")),
            Cell::from(fmt.t("deviceIdentifier")),
            Cell::from(fmt.t("deviceStatus")),
            Cell::from(fmt.t("deviceLastUpdate")),
            Cell::from(fmt.t("positionSpeed")),
            Cell::from(fmt.t("positionAddress")),
        ])
        .style(theme::table_header());

        let selected_index = self.selected_index();
        let rows: Vec<Row> = self
            .devices
            .iter()
            .enumerate()
            .map(|(i, d)| self.device_row(d, i == selected_index))
            .collect();

        let widths = [
            Constraint::Length(3),
            Constraint::Min(14),
            Constraint::Length(16),
            Constraint::Length(8),
            Constraint::Length(17),
            Constraint::Length(10),
            Constraint::Fill(1),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());

        let mut state = self.table_state.clone();
        frame.render_stateful_widget(table, inner, &mut state);

        if let Some(ref card) = self.card {
            let height = status_card::card_height(card);
            let rect =
                status_card::card_rect(inner, self.card_offset, status_card::CARD_WIDTH, height);
            self.last_card.set(rect);
            status_card::render_card(frame, rect, card, fmt, self.status.is_none());
            if let Some(index) = self.menu {
                status_card::render_menu(frame, inner, rect, card, index, fmt);
            }
        }
    }

    fn captures_input(&self) -> bool {
        self.menu.is_some()
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn hints(&self) -> &'static str {
        if self.menu.is_some() {
            "j/k move  Enter open  Esc close"
        } else if self.card.is_some() {
            "j/k device  m more  v live  o light  b buzzer  x remove  Esc close"
        } else {
            "j/k move  Enter status card  a add"
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tracdash_core::DeviceStatus;

    fn device(id: i64, name: &str) -> Arc<Device> {
        Arc::new(Device {
            id: DeviceId(id),
            name: name.into(),
            unique_id: format!("U{id}"),
            status: DeviceStatus::Online,
            disabled: false,
            last_update: None,
            position_id: None,
            phone: None,
            model: None,
            category: None,
            attributes: serde_json::Map::new(),
        })
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn devices_sorted_by_name_and_highlight_kept() {
        let mut screen = DevicesScreen::new();
        screen.set_devices(&[device(1, "zulu"), device(2, "Alpha")]);
        assert_eq!(screen.highlighted().map(|d| d.id), Some(DeviceId(2)));

        screen.move_selection(1);
        screen.set_devices(&[device(3, "beta"), device(1, "zulu"), device(2, "Alpha")]);
        assert_eq!(screen.highlighted().map(|d| d.id), Some(DeviceId(1)));
    }

    #[test]
    fn open_card_follows_highlight() {
        let mut screen = DevicesScreen::new();
        screen.set_devices(&[device(1, "a"), device(2, "b")]);
        assert!(screen.move_selection(1).is_none());

        screen.update(&Action::SelectDevice(Some(DeviceId(2)))).unwrap();
        let follow = screen.handle_key_event(key('k')).unwrap();
        assert!(matches!(follow, Some(Action::SelectDevice(Some(DeviceId(1))))));
    }

    #[test]
    fn removed_device_closes_card() {
        let mut screen = DevicesScreen::new();
        screen.set_devices(&[device(1, "a"), device(2, "b")]);
        screen.update(&Action::SelectDevice(Some(DeviceId(2)))).unwrap();
        let follow = screen.set_devices(&[device(1, "a")]);
        assert!(matches!(follow, Some(Action::SelectDevice(None))));
    }

    #[test]
    fn stale_status_poll_is_ignored() {
        let mut screen = DevicesScreen::new();
        screen.update(&Action::SelectDevice(Some(DeviceId(2)))).unwrap();
        screen
            .update(&Action::StatusPolled(StatusPoll::disabled(DeviceId(1))))
            .unwrap();
        assert!(screen.status.is_none());
        screen
            .update(&Action::StatusPolled(StatusPoll::disabled(DeviceId(2))))
            .unwrap();
        assert!(screen.status.is_some());
    }
}
