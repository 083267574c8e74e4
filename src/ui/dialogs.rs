use crossterm::event::{KeyCode, KeyEvent};
use unicode_width::UnicodeWidthStr;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::app::{App, Dialog, DialogKind, BUTTON_YES};
use super::input::AppAction;
use super::theme::Theme;

fn is_confirm(kind: DialogKind) -> bool {
    matches!(kind, DialogKind::ConfirmDelete | DialogKind::ConfirmOverwrite)
}

/// Keys while a dialog is open. Confirm dialogs answer yes/no; input dialogs
/// edit a single line and submit on Enter.
pub fn handle_key(app: &mut App, key: KeyEvent) -> AppAction {
    let Some(kind) = app.dialog.as_ref().map(|d| d.kind) else {
        return AppAction::Continue;
    };
    if is_confirm(kind) {
        handle_confirm_key(app, key)
    } else {
        handle_input_key(app, key)
    }
}

fn handle_confirm_key(app: &mut App, key: KeyEvent) -> AppAction {
    match key.code {
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => app.confirm_pending(false),
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_pending(true),
        KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
            if let Some(dialog) = app.dialog.as_mut() {
                dialog.selected_button = 1 - dialog.selected_button;
            }
        }
        KeyCode::Enter => {
            let accept = app
                .dialog
                .as_ref()
                .map(|d| d.selected_button == BUTTON_YES)
                .unwrap_or(false);
            app.confirm_pending(accept);
        }
        _ => {}
    }
    AppAction::Continue
}

fn handle_input_key(app: &mut App, key: KeyEvent) -> AppAction {
    match key.code {
        KeyCode::Esc => app.dialog = None,
        KeyCode::Enter => {
            if let Some(job) = app.submit_input() {
                return AppAction::RunExternal(job);
            }
        }
        KeyCode::Backspace => {
            if let Some(dialog) = app.dialog.as_mut() {
                dialog.input.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(dialog) = app.dialog.as_mut() {
                dialog.input.push(c);
            }
        }
        _ => {}
    }
    AppAction::Continue
}

pub fn draw(frame: &mut Frame, dialog: &Dialog, area: Rect, theme: &Theme) {
    let width = area.width.saturating_sub(6).min(64).max(24);
    let popup = centered(area, width, 6);
    if popup.height < 6 || popup.width < 10 {
        return;
    }

    let title = match dialog.kind {
        DialogKind::ConfirmDelete => " Delete ",
        DialogKind::ConfirmOverwrite => " Overwrite ",
        DialogKind::MkdirName => " Create Directory ",
        DialogKind::RenameName => " Rename ",
        DialogKind::CommandLine => " Command ",
    };

    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(theme.border_style(true));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    frame.render_widget(
        Paragraph::new(dialog.message.as_str()).style(theme.normal_style()),
        Rect::new(inner.x + 1, inner.y, inner.width.saturating_sub(2), 1),
    );

    if is_confirm(dialog.kind) {
        draw_buttons(frame, dialog, inner, theme);
    } else {
        draw_input(frame, dialog, inner, theme);
    }
}

fn draw_buttons(frame: &mut Frame, dialog: &Dialog, inner: Rect, theme: &Theme) {
    let style_for = |button: usize| {
        if dialog.selected_button == button {
            theme.selected_style()
        } else {
            theme.normal_style()
        }
    };
    let line = Line::from(vec![
        Span::styled("[ Yes ]", style_for(0)),
        Span::raw("   "),
        Span::styled("[ No ]", style_for(1)),
    ]);
    frame.render_widget(
        Paragraph::new(line).alignment(ratatui::layout::Alignment::Center),
        Rect::new(inner.x, inner.y + 2, inner.width, 1),
    );
}

fn draw_input(frame: &mut Frame, dialog: &Dialog, inner: Rect, theme: &Theme) {
    let input_area = Rect::new(inner.x + 1, inner.y + 2, inner.width.saturating_sub(2), 1);
    // Keep the tail visible when the input outgrows the box.
    let visible: String = dialog
        .input
        .chars()
        .rev()
        .take(input_area.width.saturating_sub(1) as usize)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    frame.render_widget(
        Paragraph::new(visible.as_str()).style(theme.info_style()),
        input_area,
    );
    frame.set_cursor_position((input_area.x + visible.width() as u16, input_area.y));
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
