pub mod app;
pub mod dialogs;
pub mod input;
pub mod panel;
pub mod theme;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use app::{App, OpKind, OpStatus, PanelSide, Snapshot};
use theme::Theme;

use crate::utils::format::format_size;

/// Listing rows available per panel for the given terminal height; the event
/// loop feeds this back into the session before handling input.
pub fn viewport_height(terminal_height: u16) -> usize {
    panel::listing_height(terminal_height.saturating_sub(1))
}

pub fn draw(frame: &mut Frame, app: &App, theme: &Theme) {
    let snapshot = app.snapshot();
    let area = frame.area();
    if area.height < 4 {
        return;
    }

    let panels_area = Rect::new(area.x, area.y, area.width, area.height - 1);
    let status_area = Rect::new(area.x, area.y + area.height - 1, area.width, 1);

    let columns =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(panels_area);

    panel::draw(
        frame,
        snapshot.left,
        columns[0],
        snapshot.active == PanelSide::Left,
        theme,
    );
    panel::draw(
        frame,
        snapshot.right,
        columns[1],
        snapshot.active == PanelSide::Right,
        theme,
    );

    frame.render_widget(status_line(&snapshot, theme), status_area);

    if let Some(dialog) = snapshot.dialog {
        dialogs::draw(frame, dialog, area, theme);
    }
}

/// Bottom line: transient message, then a running operation, then details of
/// the highlighted entry.
fn status_line(snapshot: &Snapshot<'_>, theme: &Theme) -> Paragraph<'static> {
    if let Some(message) = snapshot.message {
        return Paragraph::new(Line::from(Span::styled(
            message.to_string(),
            theme.warning_style(),
        )));
    }

    if let Some(op) = snapshot.operation {
        if op.status == OpStatus::Running {
            let verb = match op.kind {
                OpKind::Copy => "Copying",
                OpKind::Move => "Moving",
                OpKind::Delete => "Deleting",
                OpKind::Mkdir => "Creating",
                OpKind::Rename => "Renaming",
                OpKind::View => "Viewing",
                OpKind::Edit => "Editing",
                OpKind::Command => "Running",
            };
            return Paragraph::new(Line::from(Span::styled(
                format!("{}...", verb),
                theme.info_style(),
            )));
        }
    }

    let active = match snapshot.active {
        PanelSide::Left => snapshot.left,
        PanelSide::Right => snapshot.right,
    };
    let text = match active.selected_entry() {
        Some(entry) if !entry.is_parent() => {
            let size = if entry.is_directory {
                "<DIR>".to_string()
            } else {
                format_size(entry.size)
            };
            format!(
                "{}  {}  {}",
                entry.name,
                size,
                entry.modified.format("%Y-%m-%d %H:%M")
            )
        }
        _ => String::new(),
    };
    Paragraph::new(Line::from(Span::styled(text, theme.dim_style())))
}
