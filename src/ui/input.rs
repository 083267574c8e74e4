use crossterm::event::{KeyCode, KeyEvent};

use super::app::{App, ExternalJob};
use super::dialogs;

/// What the event loop must do after a key has been handled.
pub enum AppAction {
    Continue,
    Quit,
    /// Suspend the TUI, run the job, then call [`App::finish_external`].
    RunExternal(ExternalJob),
}

/// Semantic intents the session reacts to. The key table below is the only
/// place physical keys appear; everything downstream works on intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Quit,
    TogglePanel,
    CursorUp,
    CursorDown,
    PageUp,
    PageDown,
    CursorHome,
    CursorEnd,
    Activate,
    Ascend,
    View,
    Edit,
    Copy,
    Move,
    Delete,
    Mkdir,
    Rename,
    CommandLine,
}

pub fn map_key(key: KeyEvent) -> Option<Intent> {
    match key.code {
        KeyCode::Char('q') | KeyCode::F(10) | KeyCode::Esc => Some(Intent::Quit),
        KeyCode::Tab => Some(Intent::TogglePanel),
        KeyCode::Up => Some(Intent::CursorUp),
        KeyCode::Down => Some(Intent::CursorDown),
        KeyCode::PageUp => Some(Intent::PageUp),
        KeyCode::PageDown => Some(Intent::PageDown),
        KeyCode::Home => Some(Intent::CursorHome),
        KeyCode::End => Some(Intent::CursorEnd),
        KeyCode::Enter => Some(Intent::Activate),
        KeyCode::Backspace => Some(Intent::Ascend),
        KeyCode::F(3) | KeyCode::Char('v') => Some(Intent::View),
        KeyCode::F(4) | KeyCode::Char('e') => Some(Intent::Edit),
        KeyCode::F(5) | KeyCode::Char('c') => Some(Intent::Copy),
        KeyCode::F(6) | KeyCode::Char('m') => Some(Intent::Move),
        KeyCode::F(7) | KeyCode::Char('d') => Some(Intent::Mkdir),
        KeyCode::F(8) | KeyCode::Delete => Some(Intent::Delete),
        KeyCode::Char('r') => Some(Intent::Rename),
        KeyCode::Char(':') => Some(Intent::CommandLine),
        _ => None,
    }
}

/// Route a key event: an open dialog captures everything, otherwise the key
/// is mapped to an intent and dispatched.
pub fn handle_key(app: &mut App, key: KeyEvent) -> AppAction {
    if app.dialog.is_some() {
        return dialogs::handle_key(app, key);
    }
    match map_key(key) {
        Some(intent) => handle_intent(app, intent),
        None => AppAction::Continue,
    }
}

pub fn handle_intent(app: &mut App, intent: Intent) -> AppAction {
    let page = app.viewport_height.max(1) as isize;
    match intent {
        Intent::Quit => return AppAction::Quit,
        Intent::TogglePanel => app.switch_panel(),
        Intent::CursorUp => app.active_panel_mut().move_cursor(-1),
        Intent::CursorDown => app.active_panel_mut().move_cursor(1),
        Intent::PageUp => app.active_panel_mut().move_cursor(-page),
        Intent::PageDown => app.active_panel_mut().move_cursor(page),
        Intent::CursorHome => app.active_panel_mut().cursor_to_start(),
        Intent::CursorEnd => app.active_panel_mut().cursor_to_end(),
        Intent::Activate => {
            if let Some(job) = app.activate_selected() {
                return AppAction::RunExternal(job);
            }
        }
        Intent::Ascend => app.ascend_active(),
        Intent::View => {
            if let Some(job) = app.request_view() {
                return AppAction::RunExternal(job);
            }
        }
        Intent::Edit => {
            if let Some(job) = app.request_edit() {
                return AppAction::RunExternal(job);
            }
        }
        Intent::Copy => app.request_copy(),
        Intent::Move => app.request_move(),
        Intent::Delete => app.request_delete(),
        Intent::Mkdir => app.request_mkdir(),
        Intent::Rename => app.request_rename(),
        Intent::CommandLine => app.request_command_line(),
    }
    AppAction::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn navigation_keys_map_to_cursor_intents() {
        assert_eq!(map_key(key(KeyCode::Up)), Some(Intent::CursorUp));
        assert_eq!(map_key(key(KeyCode::Down)), Some(Intent::CursorDown));
        assert_eq!(map_key(key(KeyCode::PageUp)), Some(Intent::PageUp));
        assert_eq!(map_key(key(KeyCode::PageDown)), Some(Intent::PageDown));
        assert_eq!(map_key(key(KeyCode::Home)), Some(Intent::CursorHome));
        assert_eq!(map_key(key(KeyCode::End)), Some(Intent::CursorEnd));
    }

    #[test]
    fn function_keys_map_to_operations() {
        assert_eq!(map_key(key(KeyCode::F(3))), Some(Intent::View));
        assert_eq!(map_key(key(KeyCode::F(4))), Some(Intent::Edit));
        assert_eq!(map_key(key(KeyCode::F(5))), Some(Intent::Copy));
        assert_eq!(map_key(key(KeyCode::F(6))), Some(Intent::Move));
        assert_eq!(map_key(key(KeyCode::F(7))), Some(Intent::Mkdir));
        assert_eq!(map_key(key(KeyCode::F(8))), Some(Intent::Delete));
        assert_eq!(map_key(key(KeyCode::Char(':'))), Some(Intent::CommandLine));
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert_eq!(map_key(key(KeyCode::Char('z'))), None);
        assert_eq!(map_key(key(KeyCode::F(12))), None);
    }
}
