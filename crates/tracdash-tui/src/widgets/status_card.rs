//! Floating status card: details table, toolbar and the "more" menu.
//!
//! Placement is an offset from the bottom-right corner of the host area,
//! clamped so the card never leaves it.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use tracdash_core::{CardAction, Capability, Formatter, MenuEntry, StatusCard};

use crate::theme;

pub const CARD_WIDTH: u16 = 48;
const TOOLBAR_HEIGHT: u16 = 3;

/// Key that triggers a toolbar action.
pub fn action_key(action: CardAction) -> char {
    match action {
        CardAction::More => 'm',
        CardAction::Capability(Capability::LiveMode) => 'v',
        CardAction::Capability(Capability::Light) => 'o',
        CardAction::Capability(Capability::Buzzer) => 'b',
        CardAction::Replay => 'r',
        CardAction::SendCommand => 'c',
        CardAction::Edit => 'e',
        CardAction::Remove => 'x',
    }
}

/// The toolbar action bound to `key`, if the card shows it.
pub fn action_for_key(card: &StatusCard, key: char) -> Option<CardAction> {
    card.toolbar
        .iter()
        .map(|b| b.action)
        .find(|&a| action_key(a) == key)
}

pub fn menu_label(entry: &MenuEntry, fmt: &Formatter) -> String {
    match entry {
        MenuEntry::CreateGeofence => fmt.t("sharedCreateGeofence"),
        MenuEntry::Link { title, .. } => title.clone(),
        MenuEntry::Share(_) => fmt.t("deviceShare"),
    }
}

/// Rows, optional details/image hint lines, toolbar and borders.
pub fn card_height(card: &StatusCard) -> u16 {
    let rows = u16::try_from(card.rows.len().max(1)).unwrap_or(u16::MAX);
    let hints = u16::from(card.details.is_some() || card.image.is_some());
    rows.saturating_add(hints)
        .saturating_add(TOOLBAR_HEIGHT + 3)
}

/// Where a `width` x `height` card lands inside `area` after moving it
/// `offset` cells from its home in the bottom-right corner.
pub fn card_rect(area: Rect, offset: (i32, i32), width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    let min_x = i32::from(area.x);
    let min_y = i32::from(area.y);
    let max_x = min_x + i32::from(area.width - width);
    let max_y = min_y + i32::from(area.height - height);

    let x = (max_x - 1 + offset.0).clamp(min_x, max_x.max(min_x));
    let y = (max_y + offset.1).clamp(min_y, max_y.max(min_y));

    Rect::new(
        u16::try_from(x).unwrap_or(area.x),
        u16::try_from(y).unwrap_or(area.y),
        width,
        height,
    )
}

pub fn render_card(
    frame: &mut Frame,
    rect: Rect,
    card: &StatusCard,
    fmt: &Formatter,
    loading: bool,
) {
    frame.render_widget(Clear, rect);

    let block = Block::default()
        .title(Line::from(vec![
            Span::raw(" "),
            Span::styled(card.title.clone(), theme::title_style()),
            Span::raw(" "),
        ]))
        .title_bottom(Line::from(Span::styled(" H/J/K/L move  Esc close ", theme::key_hint())))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let has_hints = card.details.is_some() || card.image.is_some();
    let chunks = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(u16::from(has_hints)),
        Constraint::Length(1),
        Constraint::Length(TOOLBAR_HEIGHT),
    ])
    .split(inner);

    if card.rows.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {}", fmt.t("sharedNoData")), theme::key_hint())),
            chunks[0],
        );
    } else {
        let rows: Vec<Row> = card
            .rows
            .iter()
            .map(|r| {
                Row::new(vec![
                    Cell::from(r.label.clone()).style(Style::default().fg(theme::DIM_WHITE)),
                    Cell::from(r.value.clone()).style(Style::default().fg(theme::NEON_CYAN)),
                ])
            })
            .collect();
        let table = Table::new(rows, [Constraint::Percentage(40), Constraint::Percentage(60)])
            .column_spacing(1);
        frame.render_widget(table, chunks[0]);
    }

    if has_hints {
        let mut spans = Vec::new();
        if card.details.is_some() {
            spans.push(Span::styled(" d ", theme::key_hint_key()));
            spans.push(Span::styled(fmt.t("sharedShowDetails"), theme::key_hint()));
        }
        if let Some(ref image) = card.image {
            spans.push(Span::styled("  i ", theme::key_hint_key()));
            spans.push(Span::styled(image.clone(), theme::key_hint()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), chunks[1]);
    }

    let separator = if loading {
        format!(" {}", fmt.t("sharedLoading"))
    } else {
        "─".repeat(usize::from(chunks[2].width))
    };
    frame.render_widget(
        Paragraph::new(Span::styled(separator, theme::key_hint())),
        chunks[2],
    );

    let mut spans = Vec::new();
    for button in &card.toolbar {
        let style = if button.enabled {
            theme::button_enabled()
        } else {
            theme::button_disabled()
        };
        let key_style = if button.enabled {
            theme::key_hint_key()
        } else {
            style
        };
        spans.push(Span::styled(format!("{} ", action_key(button.action)), key_style));
        spans.push(Span::styled(fmt.t(button.action.label_key()), style));
        spans.push(Span::raw("  "));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).wrap(Wrap { trim: true }),
        chunks[3],
    );
}

/// The "more" menu, drawn above the card (or below when there is no room).
pub fn render_menu(
    frame: &mut Frame,
    area: Rect,
    card_rect: Rect,
    card: &StatusCard,
    selected: usize,
    fmt: &Formatter,
) {
    let labels: Vec<String> = card.menu.iter().map(|e| menu_label(e, fmt)).collect();
    let width = labels
        .iter()
        .map(|l| u16::try_from(l.len()).unwrap_or(u16::MAX))
        .max()
        .unwrap_or(10)
        .saturating_add(6)
        .min(area.width);
    let height = u16::try_from(labels.len())
        .unwrap_or(u16::MAX)
        .saturating_add(2)
        .min(area.height);

    let y = if card_rect.y.saturating_sub(area.y) >= height {
        card_rect.y - height
    } else {
        (card_rect.y + card_rect.height).min(area.y + area.height.saturating_sub(height))
    };
    let rect = Rect::new(card_rect.x, y, width, height);

    frame.render_widget(Clear, rect);
    let block = Block::default()
        .title(Span::styled(format!(" {} ", fmt.t("sharedExtra")), theme::title_style()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::CORAL))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let lines: Vec<Line> = labels
        .into_iter()
        .enumerate()
        .map(|(i, label)| {
            if i == selected {
                Line::from(Span::styled(
                    format!("▸ {label}"),
                    theme::table_selected().add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::styled(format!("  {label}"), theme::table_row()))
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tracdash_core::{DeviceId, ToolbarButton};

    fn card(actions: &[CardAction]) -> StatusCard {
        StatusCard {
            device_id: DeviceId(1),
            title: "Van".into(),
            image: None,
            rows: Vec::new(),
            details: None,
            toolbar: actions
                .iter()
                .map(|&action| ToolbarButton {
                    action,
                    enabled: true,
                })
                .collect(),
            menu: Vec::new(),
        }
    }

    #[test]
    fn card_starts_bottom_right_and_stays_inside() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(card_rect(area, (0, 0), 40, 10), Rect::new(59, 30, 40, 10));
        assert_eq!(card_rect(area, (-500, -500), 40, 10), Rect::new(0, 0, 40, 10));
        assert_eq!(card_rect(area, (500, 500), 40, 10), Rect::new(60, 30, 40, 10));
    }

    #[test]
    fn card_shrinks_to_small_areas() {
        let area = Rect::new(2, 1, 30, 8);
        assert_eq!(card_rect(area, (0, 0), 48, 12), Rect::new(2, 1, 30, 8));
    }

    #[test]
    fn keys_map_only_to_shown_actions() {
        let c = card(&[
            CardAction::More,
            CardAction::Capability(Capability::Buzzer),
            CardAction::Edit,
        ]);
        assert_eq!(action_for_key(&c, 'b'), Some(CardAction::Capability(Capability::Buzzer)));
        assert_eq!(action_for_key(&c, 'x'), None);
        assert_eq!(action_for_key(&c, 'm'), Some(CardAction::More));
    }

    #[test]
    fn height_counts_rows_and_toolbar() {
        let mut c = card(&[]);
        assert_eq!(card_height(&c), 1 + TOOLBAR_HEIGHT + 3);
        c.image = Some("van.png".into());
        assert_eq!(card_height(&c), 2 + TOOLBAR_HEIGHT + 3);
    }
}
