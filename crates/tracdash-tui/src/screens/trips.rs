//! Trip report screen: filter form, result table and column chooser.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState,
};

use tracdash_core::{
    ColumnVisibility, Device, Formatter, ReportFormat, TRIP_COLUMNS, TripReportParams, TripRow,
};

use crate::action::{Action, Notification, TripReportResult};
use crate::component::Component;
use crate::period::{ReportPeriod, parse_time};
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterField {
    Device,
    Period,
    From,
    To,
    Mail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Table,
    Filter,
    Columns,
}

pub struct TripsScreen {
    focused: bool,
    formatter: Formatter,
    /// Sorted by name.
    devices: Vec<Arc<Device>>,
    device_idx: usize,
    period: ReportPeriod,
    from_input: String,
    to_input: String,
    mail: bool,
    field: FilterField,
    focus: Focus,
    columns: ColumnVisibility,
    column_cursor: usize,
    rows: Arc<Vec<TripRow>>,
    table_state: TableState,
    loading: bool,
    throbber_state: throbber_widgets_tui::ThrobberState,
    error: Option<String>,
}

impl TripsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            formatter: Formatter::default(),
            devices: Vec::new(),
            device_idx: 0,
            period: ReportPeriod::default(),
            from_input: String::new(),
            to_input: String::new(),
            mail: false,
            field: FilterField::Device,
            focus: Focus::Table,
            columns: ColumnVisibility::default(),
            column_cursor: 0,
            rows: Arc::new(Vec::new()),
            table_state: TableState::default(),
            loading: false,
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
            error: None,
        }
    }

    /// Form fields in order; From/To only for a custom period.
    fn fields(&self) -> Vec<FilterField> {
        let mut fields = vec![FilterField::Device, FilterField::Period];
        if self.period == ReportPeriod::Custom {
            fields.extend([FilterField::From, FilterField::To]);
        }
        fields.push(FilterField::Mail);
        fields
    }

    fn focus_step(&mut self, forward: bool) {
        let fields = self.fields();
        let idx = fields.iter().position(|&f| f == self.field).unwrap_or(0);
        let next = if forward {
            (idx + 1) % fields.len()
        } else {
            (idx + fields.len() - 1) % fields.len()
        };
        self.field = fields[next];
    }

    fn cycle(&mut self, forward: bool) {
        match self.field {
            FilterField::Device if !self.devices.is_empty() => {
                let len = self.devices.len();
                self.device_idx = if forward {
                    (self.device_idx + 1) % len
                } else {
                    (self.device_idx + len - 1) % len
                };
            }
            FilterField::Period => {
                self.period = if forward {
                    self.period.next()
                } else {
                    self.period.prev()
                };
            }
            _ => {}
        }
    }

    fn input_mut(&mut self) -> Option<&mut String> {
        match self.field {
            FilterField::From => Some(&mut self.from_input),
            FilterField::To => Some(&mut self.to_input),
            _ => None,
        }
    }

    /// Validate the form against the clock `now`.
    fn build_params_at<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        format: ReportFormat,
    ) -> std::result::Result<TripReportParams, String> {
        let device = self
            .devices
            .get(self.device_idx)
            .ok_or_else(|| "Select a device first".to_owned())?;

        let (from, to) = match self.period.range(now) {
            Some(range) => range,
            None => {
                let from = parse_time(&self.from_input)
                    .ok_or_else(|| format!("Invalid From time: {:?}", self.from_input))?;
                let to = parse_time(&self.to_input)
                    .ok_or_else(|| format!("Invalid To time: {:?}", self.to_input))?;
                (from, to)
            }
        };
        if from >= to {
            return Err("From must be before To".to_owned());
        }

        Ok(TripReportParams {
            device_id: device.id.0,
            from,
            to,
            mail: self.mail,
            format,
        })
    }

    fn run(&mut self, format: ReportFormat) -> Option<Action> {
        if self.loading {
            return None;
        }
        match self.build_params_at(&Local::now(), format) {
            Ok(params) => {
                self.loading = true;
                self.error = None;
                self.focus = Focus::Table;
                Some(Action::RunTripReport(params))
            }
            Err(message) => {
                self.error = Some(message.clone());
                Some(Action::Notify(Notification::warning(message)))
            }
        }
    }

    fn set_devices(&mut self, devices: &[Arc<Device>]) {
        let current = self.devices.get(self.device_idx).map(|d| d.id);
        let mut sorted = devices.to_vec();
        sorted.sort_by_key(|d| d.name.to_lowercase());
        self.devices = sorted;
        self.device_idx = current
            .and_then(|id| self.devices.iter().position(|d| d.id == id))
            .unwrap_or(0);
    }

    fn scroll(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() - 1;
        let current = self.table_state.selected().unwrap_or(0);
        self.table_state
            .select(Some(current.saturating_add_signed(delta).min(last)));
    }

    fn table_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Char('f') => self.focus = Focus::Filter,
            KeyCode::Char('c') => self.focus = Focus::Columns,
            KeyCode::Enter | KeyCode::Char('s') => return self.run(ReportFormat::Json),
            KeyCode::Char('e') => return self.run(ReportFormat::Excel),
            KeyCode::Char('j') | KeyCode::Down => self.scroll(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll(-1),
            KeyCode::Char('g') => self.scroll(isize::MIN),
            KeyCode::Char('G') => self.scroll(isize::MAX),
            _ => {}
        }
        None
    }

    fn filter_key(&mut self, key: KeyEvent) -> Option<Action> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.focus = Focus::Table,
            KeyCode::Tab | KeyCode::Down => self.focus_step(true),
            KeyCode::BackTab | KeyCode::Up => self.focus_step(false),
            KeyCode::Right => self.cycle(true),
            KeyCode::Left => self.cycle(false),
            KeyCode::Enter => return self.run(ReportFormat::Json),
            KeyCode::Char('e') if ctrl => return self.run(ReportFormat::Excel),
            KeyCode::Char(' ') if self.field == FilterField::Mail => self.mail = !self.mail,
            KeyCode::Char(c) if !ctrl => {
                if let Some(input) = self.input_mut() {
                    input.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(input) = self.input_mut() {
                    input.pop();
                }
            }
            _ => {}
        }
        None
    }

    fn columns_key(&mut self, key: KeyEvent) {
        let last = TRIP_COLUMNS.len().saturating_sub(1);
        match key.code {
            KeyCode::Esc | KeyCode::Char('c') => self.focus = Focus::Table,
            KeyCode::Char('j') | KeyCode::Down => {
                self.column_cursor = (self.column_cursor + 1).min(last);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.column_cursor = self.column_cursor.saturating_sub(1);
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(column) = TRIP_COLUMNS.get(self.column_cursor) {
                    self.columns.toggle(column.field);
                }
            }
            _ => {}
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_filter(&self, frame: &mut Frame, area: Rect) {
        let fmt = &self.formatter;
        let active = self.focus == Focus::Filter;
        let block = Block::default()
            .title(format!(" {} ", fmt.t("reportTitle")))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if active {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let device = self
            .devices
            .get(self.device_idx)
            .map_or_else(|| "─".to_owned(), |d| d.name.clone());

        let lines: Vec<Line> = self
            .fields()
            .into_iter()
            .map(|field| {
                let (label, value, editable) = match field {
                    FilterField::Device => {
                        (fmt.t("sharedDevice"), format!("‹ {device} ›"), false)
                    }
                    FilterField::Period => (
                        fmt.t("reportPeriod"),
                        format!("‹ {} ›", fmt.t(self.period.label_key())),
                        false,
                    ),
                    FilterField::From => (fmt.t("reportFrom"), self.from_input.clone(), true),
                    FilterField::To => (fmt.t("reportTo"), self.to_input.clone(), true),
                    FilterField::Mail => (
                        fmt.t("reportEmail"),
                        if self.mail { "[x]" } else { "[ ]" }.to_owned(),
                        false,
                    ),
                };
                let selected = active && field == self.field;
                let label_style = if selected {
                    Style::default().fg(theme::NEON_CYAN)
                } else {
                    Style::default().fg(theme::DIM_WHITE)
                };
                let value = if selected && editable {
                    format!("{value}\u{2588}")
                } else {
                    value
                };
                Line::from(vec![
                    Span::styled(if selected { " ▸ " } else { "   " }, label_style),
                    Span::styled(format!("{label:<14}"), label_style),
                    Span::styled(value, Style::default().fg(theme::ELECTRIC_YELLOW)),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let fmt = &self.formatter;
        let block = Block::default()
            .title(format!(" {} ({}) ", fmt.t("reportTrips"), self.rows.len()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused && self.focus == Focus::Table {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.loading {
            let throbber = throbber_widgets_tui::Throbber::default()
                .label(format!("  {}", fmt.t("sharedLoading")))
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, inner, &mut self.throbber_state.clone());
            return;
        }

        if self.rows.is_empty() {
            let message = self
                .error
                .clone()
                .unwrap_or_else(|| format!("  {}", fmt.t("sharedNoData")));
            let style = if self.error.is_some() {
                Style::default().fg(theme::ERROR_RED)
            } else {
                theme::key_hint()
            };
            frame.render_widget(Paragraph::new(Span::styled(message, style)), inner);
            return;
        }

        let visible: Vec<_> = self.columns.visible_columns().collect();
        let header = Row::new(visible.iter().map(|c| Cell::from(c.label(fmt))))
            .style(theme::table_header());
        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|row| {
                Row::new(visible.iter().map(|c| Cell::from(c.render(row, fmt))))
                    .style(theme::table_row())
            })
            .collect();
        let widths = vec![Constraint::Fill(1); visible.len()];

        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());
        let mut state = self.table_state.clone();
        frame.render_stateful_widget(table, inner, &mut state);
    }

    fn render_columns(&self, frame: &mut Frame, area: Rect) {
        let height = u16::try_from(TRIP_COLUMNS.len())
            .unwrap_or(u16::MAX)
            .saturating_add(2)
            .min(area.height);
        let width = 36.min(area.width);
        let rect = Rect::new(
            area.x + (area.width - width) / 2,
            area.y + (area.height - height) / 2,
            width,
            height,
        );
        frame.render_widget(Clear, rect);

        let block = Block::default()
            .title(format!(" {} ", self.formatter.t("reportColumns")))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        let lines: Vec<Line> = TRIP_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let mark = if self.columns.is_visible(column.field) { "[x]" } else { "[ ]" };
                let text = format!(" {mark} {}", column.label(&self.formatter));
                if i == self.column_cursor {
                    let style = theme::table_selected().add_modifier(Modifier::BOLD);
                    Line::from(Span::styled(text, style))
                } else {
                    Line::from(Span::styled(text, theme::table_row()))
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Component for TripsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        Ok(match self.focus {
            Focus::Table => self.table_key(key),
            Focus::Filter => self.filter_key(key),
            Focus::Columns => {
                self.columns_key(key);
                None
            }
        })
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Connected(session) => self.formatter = session.formatter().clone(),
            Action::DevicesUpdated(devices) => self.set_devices(devices),
            Action::Tick if self.loading => self.throbber_state.calc_next(),
            Action::TripReportFinished(result) => {
                self.loading = false;
                match result {
                    TripReportResult::Rows(rows) => {
                        self.rows = Arc::clone(rows);
                        self.table_state.select((!rows.is_empty()).then_some(0));
                    }
                    TripReportResult::Failed(message) => self.error = Some(message.clone()),
                    TripReportResult::Saved(_) | TripReportResult::Empty => {}
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let filter_height = u16::try_from(self.fields().len()).unwrap_or(5) + 2;
        let layout =
            Layout::vertical([Constraint::Length(filter_height), Constraint::Min(3)]).split(area);
        self.render_filter(frame, layout[0]);
        self.render_table(frame, layout[1]);
        if self.focus == Focus::Columns {
            self.render_columns(frame, area);
        }
    }

    fn captures_input(&self) -> bool {
        self.focus != Focus::Table
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn hints(&self) -> &'static str {
        match self.focus {
            Focus::Table => "f filter  s show  e export  c columns  j/k scroll",
            Focus::Filter => "Tab field  ←/→ change  Space email  Enter show  ^E export",
            Focus::Columns => "j/k move  Space toggle  Esc close",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use pretty_assertions::assert_eq;
    use tracdash_core::{DeviceId, DeviceStatus};

    fn device(id: i64, name: &str) -> Arc<Device> {
        Arc::new(Device {
            id: DeviceId(id),
            name: name.into(),
            unique_id: format!("U{id}"),
            status: DeviceStatus::Offline,
            disabled: false,
            last_update: None,
            position_id: None,
            phone: None,
            model: None,
            category: None,
            attributes: serde_json::Map::new(),
        })
    }

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-14T15:00:00+00:00").unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn params_need_a_device() {
        let screen = TripsScreen::new();
        assert!(screen.build_params_at(&now(), ReportFormat::Json).is_err());
    }

    #[test]
    fn preset_period_fills_range() {
        let mut screen = TripsScreen::new();
        screen.set_devices(&[device(7, "van")]);
        screen.mail = true;
        let params = screen.build_params_at(&now(), ReportFormat::Excel).unwrap();
        assert_eq!(params.device_id, 7);
        assert_eq!(params.from, Utc.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap());
        assert_eq!(params.to, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
        assert!(params.mail);
        assert_eq!(params.format, ReportFormat::Excel);
    }

    #[test]
    fn custom_period_is_validated() {
        let mut screen = TripsScreen::new();
        screen.set_devices(&[device(1, "van")]);
        screen.period = ReportPeriod::Custom;

        screen.from_input = "nope".into();
        assert!(screen.build_params_at(&now(), ReportFormat::Json).is_err());

        screen.from_input = "2024-03-02T00:00:00Z".into();
        screen.to_input = "2024-03-01T00:00:00Z".into();
        assert_eq!(
            screen.build_params_at(&now(), ReportFormat::Json).unwrap_err(),
            "From must be before To"
        );

        screen.to_input = "2024-03-03T00:00:00Z".into();
        assert!(screen.build_params_at(&now(), ReportFormat::Json).is_ok());
    }

    #[test]
    fn custom_inputs_appear_only_for_custom_period() {
        let mut screen = TripsScreen::new();
        assert!(!screen.fields().contains(&FilterField::From));

        screen.focus = Focus::Filter;
        screen.field = FilterField::Period;
        screen.handle_key_event(key(KeyCode::Left)).unwrap();
        assert_eq!(screen.period, ReportPeriod::Custom);
        assert!(screen.fields().contains(&FilterField::From));

        screen.handle_key_event(key(KeyCode::Tab)).unwrap();
        for c in "2024".chars() {
            screen.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
        assert_eq!(screen.from_input, "2024");
    }

    #[test]
    fn column_chooser_toggles_visibility() {
        let mut screen = TripsScreen::new();
        let first = TRIP_COLUMNS[0].field;
        let before = screen.columns.is_visible(first);

        screen.handle_key_event(key(KeyCode::Char('c'))).unwrap();
        assert!(screen.captures_input());
        screen.handle_key_event(key(KeyCode::Char(' '))).unwrap();
        assert_eq!(screen.columns.is_visible(first), !before);

        screen.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert!(!screen.captures_input());
    }

    #[test]
    fn finished_report_stops_loading() {
        let mut screen = TripsScreen::new();
        screen.loading = true;
        screen
            .update(&Action::TripReportFinished(TripReportResult::Failed("boom".into())))
            .unwrap();
        assert!(!screen.loading);
        assert_eq!(screen.error.as_deref(), Some("boom"));
    }
}
