use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::app::PanelState;
use super::theme::Theme;
use crate::services::listing::FileItem;
use crate::utils::format::format_size;

/// Rows available for listing entries inside a panel of the given height:
/// two border rows, one header, one footer.
pub fn listing_height(panel_height: u16) -> usize {
    panel_height.saturating_sub(4) as usize
}

/// Draw one panel. Scroll state is owned by [`PanelState`] and has already
/// been recomputed for this frame; drawing never mutates it.
pub fn draw(frame: &mut Frame, panel: &PanelState, area: Rect, is_active: bool, theme: &Theme) {
    let inner_width = area.width.saturating_sub(2) as usize;

    let path_str = panel.path.display().to_string();
    let display_path = if inner_width > 4 && path_str.len() > inner_width.saturating_sub(4) {
        let suffix_len = inner_width.saturating_sub(7);
        let start = path_str.len().saturating_sub(suffix_len);
        // Never slice inside a UTF-8 sequence
        let safe_start = path_str
            .char_indices()
            .map(|(i, _)| i)
            .find(|&i| i >= start)
            .unwrap_or(path_str.len());
        format!("...{}", &path_str[safe_start..])
    } else {
        path_str
    };

    let block = Block::default()
        .title(format!(" {} ", display_path))
        .title_style(if is_active {
            theme.header_style()
        } else {
            theme.normal_style()
        })
        .borders(Borders::ALL)
        .border_style(theme.border_style(is_active));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 3 || inner.width < 10 {
        return;
    }

    // Column widths; very narrow panels keep only the name
    let min_columns: u16 = 10 + 12 + 4;
    let (name_col, size_col, date_col) = if inner.width > min_columns {
        ((inner.width - min_columns) as usize, 10_usize, 12_usize)
    } else {
        (inner.width.saturating_sub(2) as usize, 0_usize, 0_usize)
    };

    let header = header_line(name_col, size_col, date_col, theme);
    frame.render_widget(
        Paragraph::new(header),
        Rect::new(inner.x, inner.y, inner.width, 1),
    );

    let visible_height = (inner.height - 2) as usize;

    if let Some(error) = &panel.last_error {
        frame.render_widget(
            Paragraph::new(error.to_string()).style(theme.error_style()),
            Rect::new(inner.x + 1, inner.y + 1, inner.width.saturating_sub(2), 1),
        );
    } else {
        let rows = panel
            .files
            .iter()
            .enumerate()
            .skip(panel.scroll_offset)
            .take(visible_height);
        for (row, (index, file)) in rows.enumerate() {
            let under_cursor = index == panel.cursor;
            let line = entry_line(file, name_col, size_col, date_col, under_cursor, theme);
            let paragraph = if under_cursor && is_active {
                Paragraph::new(line).style(theme.selected_style())
            } else {
                Paragraph::new(line)
            };
            frame.render_widget(
                paragraph,
                Rect::new(inner.x, inner.y + 1 + row as u16, inner.width, 1),
            );
        }
    }

    if panel.files.len() > visible_height {
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"));
        let mut scrollbar_state =
            ScrollbarState::new(panel.files.len()).position(panel.cursor);
        let scrollbar_area = Rect::new(
            inner.x + inner.width - 1,
            inner.y + 1,
            1,
            visible_height as u16,
        );
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }

    let dir_count = panel
        .files
        .iter()
        .filter(|f| f.is_directory && !f.is_parent())
        .count();
    let file_count = panel.files.iter().filter(|f| !f.is_directory).count();
    let total_size: u64 = panel
        .files
        .iter()
        .filter(|f| !f.is_directory)
        .map(|f| f.size)
        .sum();
    let footer = Line::from(Span::styled(
        format!(
            "{} dirs, {} files, {}",
            dir_count,
            file_count,
            format_size(total_size)
        ),
        theme.dim_style(),
    ));
    frame.render_widget(
        Paragraph::new(footer).alignment(ratatui::layout::Alignment::Center),
        Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1),
    );
}

fn header_line(name_width: usize, size_width: usize, date_width: usize, theme: &Theme) -> Line<'static> {
    if name_width == 0 {
        return Line::from(Span::styled("", theme.header_style()));
    }
    let name_col = format!(" {:width$}", "Name", width = name_width.saturating_sub(1));
    let size_col = if size_width > 2 {
        format!("{:>width$}  ", "Size", width = size_width.saturating_sub(2))
    } else {
        String::new()
    };
    let date_col = if date_width > 2 {
        format!("{:>width$}  ", "Modified", width = date_width.saturating_sub(2))
    } else {
        String::new()
    };
    Line::from(vec![
        Span::styled(name_col, theme.header_style()),
        Span::styled(size_col, theme.header_style()),
        Span::styled(date_col, theme.header_style()),
    ])
}

/// Truncate to a display width, accounting for wide characters
fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if current_width + char_width > max_width {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result
}

fn pad_to_width(s: &str, target_width: usize) -> String {
    let current_width = s.width();
    if current_width >= target_width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(target_width - current_width))
    }
}

fn entry_line(
    file: &FileItem,
    name_width: usize,
    size_width: usize,
    date_width: usize,
    under_cursor: bool,
    theme: &Theme,
) -> Line<'static> {
    let decorated = if file.is_directory && !file.is_parent() {
        format!("{}/", file.name)
    } else {
        file.name.clone()
    };

    let effective_width = name_width.saturating_sub(1);
    let display_name = if effective_width < 4 {
        String::new()
    } else if decorated.width() > effective_width {
        let keep = effective_width.saturating_sub(3);
        format!("{}...", truncate_to_width(&decorated, keep))
    } else {
        decorated
    };
    let name_col = pad_to_width(&format!(" {}", display_name), name_width);

    let size_str = if file.is_directory {
        "<DIR>".to_string()
    } else {
        format_size(file.size)
    };
    let size_col = if size_width > 2 {
        format!("{:>width$}  ", size_str, width = size_width.saturating_sub(2))
    } else {
        String::new()
    };

    let date_str = if file.is_parent() {
        String::new()
    } else {
        file.modified.format("%m-%d %H:%M").to_string()
    };
    let date_col = if date_width > 2 {
        format!("{:>width$}  ", date_str, width = date_width.saturating_sub(2))
    } else {
        String::new()
    };

    let name_style = if under_cursor {
        theme.selected_style()
    } else if file.is_directory {
        theme.directory_style()
    } else {
        theme.normal_style()
    };
    let other_style = if under_cursor {
        theme.selected_style()
    } else {
        theme.dim_style()
    };

    Line::from(vec![
        Span::styled(name_col, name_style),
        Span::styled(size_col, other_style),
        Span::styled(date_col, other_style),
    ])
}
