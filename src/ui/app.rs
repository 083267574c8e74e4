use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::error::{FsError, FsResult};
use crate::services::config::Config;
use crate::services::external;
use crate::services::file_ops;
use crate::services::listing::{self, FileItem};

/// Walk up from `target` to the nearest readable directory, then try
/// `fallback`, then `/`. Keeps an invalid startup path from aborting the
/// session.
pub fn valid_start_path(target: &Path, fallback: &Path) -> PathBuf {
    let mut current = target.to_path_buf();
    loop {
        if fs::read_dir(&current).is_ok() {
            return current;
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => break,
        }
    }
    if fs::read_dir(fallback).is_ok() {
        return fallback.to_path_buf();
    }
    PathBuf::from("/")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelSide {
    Left,
    Right,
}

impl PanelSide {
    pub fn other(self) -> Self {
        match self {
            PanelSide::Left => PanelSide::Right,
            PanelSide::Right => PanelSide::Left,
        }
    }
}

/// Completions delivered from background threads to the event loop.
#[derive(Debug)]
pub enum AppEvent {
    ListingReady {
        side: PanelSide,
        token: u64,
        path: PathBuf,
        result: FsResult<Vec<FileItem>>,
    },
    OperationDone {
        result: FsResult<()>,
        affected: Vec<PathBuf>,
    },
}

/// Navigation state of one panel.
///
/// Listing reads run on background threads; every request carries a token and
/// the panel's path at request time. A completion is applied only when both
/// still match, so a slow read for an abandoned path can never overwrite a
/// newer navigation. While a read is in flight the previous listing stays on
/// screen; a failed read clears it.
#[derive(Debug)]
pub struct PanelState {
    pub side: PanelSide,
    pub path: PathBuf,
    pub files: Vec<FileItem>,
    pub cursor: usize,
    pub scroll_offset: usize,
    pub last_error: Option<FsError>,
    pub pending_focus: Option<String>,
    read_token: u64,
}

impl PanelState {
    pub fn new(side: PanelSide, path: PathBuf) -> Self {
        Self {
            side,
            path,
            files: Vec::new(),
            cursor: 0,
            scroll_offset: 0,
            last_error: None,
            pending_focus: None,
            read_token: 0,
        }
    }

    /// Issue a fresh background read of the current path.
    pub fn request_listing(&mut self, tx: &Sender<AppEvent>) {
        self.read_token += 1;
        let side = self.side;
        let token = self.read_token;
        let path = self.path.clone();
        let tx = tx.clone();
        thread::spawn(move || {
            let result = listing::read(&path);
            let _ = tx.send(AppEvent::ListingReady {
                side,
                token,
                path,
                result,
            });
        });
    }

    /// Navigate to `new_path`: cursor and scroll reset, a read is issued.
    pub fn set_path(&mut self, new_path: PathBuf, tx: &Sender<AppEvent>) {
        self.path = new_path;
        self.cursor = 0;
        self.scroll_offset = 0;
        self.request_listing(tx);
    }

    /// Re-read the current path, keeping the cursor where possible.
    pub fn refresh(&mut self, tx: &Sender<AppEvent>) {
        self.request_listing(tx);
    }

    /// Apply a completed read. Stale completions (superseded token or path)
    /// are dropped silently.
    pub fn on_listing_ready(
        &mut self,
        token: u64,
        path: &Path,
        result: FsResult<Vec<FileItem>>,
    ) {
        if token != self.read_token || path != self.path {
            return;
        }
        match result {
            Ok(files) => {
                self.files = files;
                self.last_error = None;
                if let Some(focus) = self.pending_focus.take() {
                    if let Some(idx) = self.files.iter().position(|f| f.name == focus) {
                        self.cursor = idx;
                    }
                }
                if self.cursor >= self.files.len() {
                    self.cursor = self.files.len().saturating_sub(1);
                }
            }
            Err(e) => {
                self.files.clear();
                self.cursor = 0;
                self.scroll_offset = 0;
                self.last_error = Some(e);
            }
        }
    }

    /// Sole cursor mutation point; covers line, page, home and end moves.
    pub fn move_cursor(&mut self, delta: isize) {
        if self.files.is_empty() {
            return;
        }
        let max = (self.files.len() - 1) as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, max) as usize;
    }

    pub fn cursor_to_start(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_to_end(&mut self) {
        if !self.files.is_empty() {
            self.cursor = self.files.len() - 1;
        }
    }

    /// Keep the cursor inside the viewport with minimal scrolling.
    pub fn recompute_scroll(&mut self, viewport_height: usize) {
        if viewport_height == 0 {
            return;
        }
        let max_scroll = self.files.len().saturating_sub(viewport_height);
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + viewport_height {
            self.scroll_offset = self.cursor - viewport_height + 1;
        }
    }

    pub fn selected_entry(&self) -> Option<&FileItem> {
        self.files.get(self.cursor)
    }

    /// Go to the parent directory, leaving the cursor on the directory we
    /// came from once its listing arrives.
    pub fn ascend(&mut self, tx: &Sender<AppEvent>) {
        let Some(parent) = self.path.parent().map(Path::to_path_buf) else {
            return;
        };
        if let Some(name) = self.path.file_name() {
            self.pending_focus = Some(name.to_string_lossy().to_string());
        }
        self.set_path(parent, tx);
    }

    pub fn descend_into(&mut self, name: &str, tx: &Sender<AppEvent>) {
        let child = self.path.join(name);
        self.set_path(child, tx);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Copy,
    Move,
    Delete,
    Mkdir,
    Rename,
    View,
    Edit,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStatus {
    AwaitingConfirmation,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// One pending or in-flight file operation. At most one exists, and only one
/// may be `Running` at a time; a second start attempt is rejected as busy.
#[derive(Debug, Clone)]
pub struct FileOperation {
    pub kind: OpKind,
    pub source: Option<PathBuf>,
    pub dest: Option<PathBuf>,
    pub status: OpStatus,
    pub replace: bool,
    pub origin: PanelSide,
    pub error: Option<FsError>,
}

impl FileOperation {
    /// Directories whose listings the operation may have changed.
    fn affected_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for path in [self.source.as_deref(), self.dest.as_deref()]
            .into_iter()
            .flatten()
        {
            if let Some(parent) = path.parent() {
                let parent = parent.to_path_buf();
                if !dirs.contains(&parent) {
                    dirs.push(parent);
                }
            }
        }
        dirs
    }

    fn summary(&self) -> String {
        let name = self
            .source
            .as_deref()
            .or(self.dest.as_deref())
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match self.kind {
            OpKind::Copy => format!("Copied {}", name),
            OpKind::Move => format!("Moved {}", name),
            OpKind::Delete => format!("Deleted {}", name),
            OpKind::Mkdir => format!("Created {}", name),
            OpKind::Rename => format!("Renamed to {}", name),
            OpKind::View | OpKind::Edit | OpKind::Command => String::new(),
        }
    }
}

/// Execute the filesystem half of an operation. View/Edit/Command never come
/// through here; they run via terminal handoff.
fn run_operation(op: &FileOperation) -> FsResult<()> {
    match (op.kind, op.source.as_deref(), op.dest.as_deref()) {
        (OpKind::Copy, Some(src), Some(dest)) => file_ops::copy_entry(src, dest, op.replace),
        (OpKind::Move, Some(src), Some(dest)) => file_ops::move_entry(src, dest, op.replace),
        (OpKind::Delete, Some(src), None) => file_ops::delete_entry(src),
        (OpKind::Mkdir, None, Some(dest)) => file_ops::create_directory(dest),
        (OpKind::Rename, Some(src), Some(dest)) => file_ops::rename_entry(src, dest),
        _ => Err(FsError::Io("malformed operation".to_string())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    ConfirmDelete,
    ConfirmOverwrite,
    MkdirName,
    RenameName,
    CommandLine,
}

pub const BUTTON_YES: usize = 0;
pub const BUTTON_NO: usize = 1;

#[derive(Debug, Clone)]
pub struct Dialog {
    pub kind: DialogKind,
    pub input: String,
    pub message: String,
    pub selected_button: usize,
}

/// A program that needs the real terminal: viewer, editor, or a shell
/// command line. The event loop suspends the TUI, runs it, and reports the
/// result back through [`App::finish_external`].
#[derive(Debug, Clone)]
pub struct ExternalJob {
    pub command: String,
    pub cwd: PathBuf,
    pub shell: String,
}

/// Composition root: both panels, the active-panel flag, the single pending
/// operation slot, and the completion channel. Every mutation happens in a
/// key handler or in [`App::poll_events`]; nothing else touches the panels.
pub struct App {
    pub left: PanelState,
    pub right: PanelState,
    pub active: PanelSide,
    pub operation: Option<FileOperation>,
    pub dialog: Option<Dialog>,
    pub message: Option<String>,
    pub message_timer: u8,
    pub viewport_height: usize,
    pub config: Config,
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

/// Immutable render view handed to the drawing layer.
pub struct Snapshot<'a> {
    pub left: &'a PanelState,
    pub right: &'a PanelState,
    pub active: PanelSide,
    pub dialog: Option<&'a Dialog>,
    pub operation: Option<&'a FileOperation>,
    pub message: Option<&'a str>,
}

impl App {
    pub fn new(left_path: PathBuf, right_path: PathBuf, config: Config) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut left = PanelState::new(PanelSide::Left, left_path);
        let mut right = PanelState::new(PanelSide::Right, right_path);
        left.request_listing(&tx);
        right.request_listing(&tx);
        Self {
            left,
            right,
            active: PanelSide::Left,
            operation: None,
            dialog: None,
            message: None,
            message_timer: 0,
            viewport_height: 0,
            config,
            tx,
            rx,
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            left: &self.left,
            right: &self.right,
            active: self.active,
            dialog: self.dialog.as_ref(),
            operation: self.operation.as_ref(),
            message: self.message.as_deref(),
        }
    }

    pub fn panel(&self, side: PanelSide) -> &PanelState {
        match side {
            PanelSide::Left => &self.left,
            PanelSide::Right => &self.right,
        }
    }

    pub fn panel_mut(&mut self, side: PanelSide) -> &mut PanelState {
        match side {
            PanelSide::Left => &mut self.left,
            PanelSide::Right => &mut self.right,
        }
    }

    pub fn active_panel(&self) -> &PanelState {
        self.panel(self.active)
    }

    pub fn active_panel_mut(&mut self) -> &mut PanelState {
        self.panel_mut(self.active)
    }

    /// The inactive panel, target of copy and move.
    pub fn target_panel(&self) -> &PanelState {
        self.panel(self.active.other())
    }

    pub fn switch_panel(&mut self) {
        self.active = self.active.other();
    }

    pub fn show_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_timer = 40; // ~2 seconds at the 50ms poll cadence
    }

    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message = None;
            }
        }
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height;
    }

    /// Re-establish the scroll invariant on both panels. Called once per
    /// frame, after input and completions, before drawing.
    pub fn ensure_visible(&mut self) {
        let height = self.viewport_height;
        self.left.recompute_scroll(height);
        self.right.recompute_scroll(height);
    }

    /// Drain pending background completions. Stale listing results are
    /// dropped inside [`PanelState::on_listing_ready`].
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                AppEvent::ListingReady {
                    side,
                    token,
                    path,
                    result,
                } => {
                    self.panel_mut(side).on_listing_ready(token, &path, result);
                }
                AppEvent::OperationDone { result, affected } => {
                    self.finish_operation(result, &affected);
                }
            }
        }
    }

    pub fn operation_running(&self) -> bool {
        matches!(
            self.operation.as_ref().map(|op| op.status),
            Some(OpStatus::Running)
        )
    }

    fn reject_if_running(&mut self) -> bool {
        if self.operation_running() {
            self.show_message(FsError::Busy.to_string());
            return true;
        }
        false
    }

    // --- navigation -----------------------------------------------------

    /// Activate the highlighted entry: enter directories, view files.
    pub fn activate_selected(&mut self) -> Option<ExternalJob> {
        let Some(entry) = self.active_panel().selected_entry() else {
            return None;
        };
        if entry.is_parent() {
            self.ascend_active();
            None
        } else if entry.is_directory {
            let name = entry.name.clone();
            let tx = self.tx.clone();
            self.active_panel_mut().descend_into(&name, &tx);
            None
        } else {
            self.request_view()
        }
    }

    pub fn ascend_active(&mut self) {
        let tx = self.tx.clone();
        self.active_panel_mut().ascend(&tx);
    }

    // --- operations -----------------------------------------------------

    pub fn request_copy(&mut self) {
        self.request_transfer(OpKind::Copy);
    }

    pub fn request_move(&mut self) {
        self.request_transfer(OpKind::Move);
    }

    fn request_transfer(&mut self, kind: OpKind) {
        if self.reject_if_running() {
            return;
        }
        let Some(name) = self.operable_name() else {
            return;
        };
        let source = self.active_panel().path.join(&name);
        let dest = self.target_panel().path.join(&name);
        let collision = dest.symlink_metadata().is_ok();

        self.operation = Some(FileOperation {
            kind,
            source: Some(source),
            dest: Some(dest),
            status: OpStatus::AwaitingConfirmation,
            replace: false,
            origin: self.active,
            error: None,
        });

        if collision {
            self.dialog = Some(Dialog {
                kind: DialogKind::ConfirmOverwrite,
                input: String::new(),
                message: format!(
                    "{} exists in {}. Overwrite?",
                    name,
                    self.target_panel().path.display()
                ),
                selected_button: BUTTON_NO,
            });
        } else {
            // No collision, no confirmation step.
            self.start_operation(false);
        }
    }

    pub fn request_delete(&mut self) {
        if self.reject_if_running() {
            return;
        }
        let Some(name) = self.operable_name() else {
            return;
        };
        let source = self.active_panel().path.join(&name);
        self.operation = Some(FileOperation {
            kind: OpKind::Delete,
            source: Some(source),
            dest: None,
            status: OpStatus::AwaitingConfirmation,
            replace: false,
            origin: self.active,
            error: None,
        });
        self.dialog = Some(Dialog {
            kind: DialogKind::ConfirmDelete,
            input: String::new(),
            message: format!("Delete {}?", name),
            selected_button: BUTTON_NO,
        });
    }

    pub fn request_mkdir(&mut self) {
        if self.reject_if_running() {
            return;
        }
        self.dialog = Some(Dialog {
            kind: DialogKind::MkdirName,
            input: String::new(),
            message: "Directory name:".to_string(),
            selected_button: BUTTON_YES,
        });
    }

    pub fn request_rename(&mut self) {
        if self.reject_if_running() {
            return;
        }
        let Some(name) = self.operable_name() else {
            return;
        };
        self.dialog = Some(Dialog {
            kind: DialogKind::RenameName,
            input: name,
            message: "New name:".to_string(),
            selected_button: BUTTON_YES,
        });
    }

    pub fn request_command_line(&mut self) {
        if self.reject_if_running() {
            return;
        }
        self.dialog = Some(Dialog {
            kind: DialogKind::CommandLine,
            input: String::new(),
            message: "Shell command:".to_string(),
            selected_button: BUTTON_YES,
        });
    }

    pub fn request_view(&mut self) -> Option<ExternalJob> {
        let program = self.config.viewer_command();
        self.request_open(OpKind::View, &program)
    }

    pub fn request_edit(&mut self) -> Option<ExternalJob> {
        let program = self.config.editor_command();
        self.request_open(OpKind::Edit, &program)
    }

    fn request_open(&mut self, kind: OpKind, program: &str) -> Option<ExternalJob> {
        if self.reject_if_running() {
            return None;
        }
        let panel = self.active_panel();
        let Some(entry) = panel.selected_entry() else {
            return None;
        };
        if entry.is_directory {
            self.show_message("Select a file, not a directory");
            return None;
        }
        let file = panel.path.join(&entry.name);
        let cwd = panel.path.clone();
        self.operation = Some(FileOperation {
            kind,
            source: Some(file.clone()),
            dest: None,
            status: OpStatus::Running,
            replace: false,
            origin: self.active,
            error: None,
        });
        Some(ExternalJob {
            command: external::open_command(program, &file),
            cwd,
            shell: self.config.shell_command(),
        })
    }

    /// Resolve a confirmation dialog. Declining cancels the pending
    /// operation without touching the filesystem.
    pub fn confirm_pending(&mut self, accept: bool) {
        let replace = matches!(
            self.dialog.as_ref().map(|d| d.kind),
            Some(DialogKind::ConfirmOverwrite)
        );
        self.dialog = None;
        let Some(op) = self.operation.as_mut() else {
            return;
        };
        if op.status != OpStatus::AwaitingConfirmation {
            return;
        }
        if accept {
            self.start_operation(replace);
        } else {
            op.status = OpStatus::Cancelled;
            self.show_message("Cancelled");
        }
    }

    /// Submit an input dialog (mkdir, rename, command line). Invalid names
    /// keep the dialog open so the user can correct them.
    pub fn submit_input(&mut self) -> Option<ExternalJob> {
        let Some(dialog) = self.dialog.take() else {
            return None;
        };
        match dialog.kind {
            DialogKind::MkdirName => {
                if let Err(e) = file_ops::validate_name(&dialog.input) {
                    self.show_message(e.to_string());
                    self.dialog = Some(dialog);
                    return None;
                }
                let dest = self.active_panel().path.join(dialog.input.trim());
                self.operation = Some(FileOperation {
                    kind: OpKind::Mkdir,
                    source: None,
                    dest: Some(dest),
                    status: OpStatus::AwaitingConfirmation,
                    replace: false,
                    origin: self.active,
                    error: None,
                });
                self.start_operation(false);
                None
            }
            DialogKind::RenameName => {
                if let Err(e) = file_ops::validate_name(&dialog.input) {
                    self.show_message(e.to_string());
                    self.dialog = Some(dialog);
                    return None;
                }
                let Some(old_name) = self.operable_name() else {
                    return None;
                };
                let panel_path = self.active_panel().path.clone();
                self.operation = Some(FileOperation {
                    kind: OpKind::Rename,
                    source: Some(panel_path.join(&old_name)),
                    dest: Some(panel_path.join(dialog.input.trim())),
                    status: OpStatus::AwaitingConfirmation,
                    replace: false,
                    origin: self.active,
                    error: None,
                });
                self.start_operation(false);
                None
            }
            DialogKind::CommandLine => {
                let command = dialog.input.trim().to_string();
                if command.is_empty() {
                    return None;
                }
                self.operation = Some(FileOperation {
                    kind: OpKind::Command,
                    source: None,
                    dest: None,
                    status: OpStatus::Running,
                    replace: false,
                    origin: self.active,
                    error: None,
                });
                Some(ExternalJob {
                    command,
                    cwd: self.active_panel().path.clone(),
                    shell: self.config.shell_command(),
                })
            }
            DialogKind::ConfirmDelete | DialogKind::ConfirmOverwrite => {
                // Confirm dialogs resolve through confirm_pending.
                self.dialog = Some(dialog);
                None
            }
        }
    }

    /// Spawn the filesystem worker for the pending operation.
    fn start_operation(&mut self, replace: bool) {
        let Some(op) = self.operation.as_mut() else {
            return;
        };
        op.replace = replace;
        op.status = OpStatus::Running;

        let job = op.clone();
        let affected = job.affected_dirs();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = run_operation(&job);
            let _ = tx.send(AppEvent::OperationDone { result, affected });
        });
    }

    /// Apply a worker completion: final status, error surfacing, and a
    /// refresh of every panel whose directory the operation may have touched.
    fn finish_operation(&mut self, result: FsResult<()>, affected: &[PathBuf]) {
        let Some(op) = self.operation.as_mut() else {
            return;
        };
        let message;
        let mut panel_error = None;
        match result {
            Ok(()) => {
                op.status = OpStatus::Succeeded;
                message = op.summary();
            }
            Err(e) => {
                op.status = OpStatus::Failed;
                op.error = Some(e.clone());
                message = e.to_string();
                panel_error = Some((op.origin, e));
            }
        }
        if let Some((side, e)) = panel_error {
            self.panel_mut(side).last_error = Some(e);
        }
        self.show_message(message);
        self.refresh_affected(affected);
    }

    /// Report the exit of an external viewer/editor/command back into the
    /// operation slot and refresh the owning panel.
    pub fn finish_external(&mut self, result: FsResult<()>) {
        let Some(op) = self.operation.as_mut() else {
            return;
        };
        let origin = op.origin;
        let failure = match result {
            Ok(()) => {
                op.status = OpStatus::Succeeded;
                None
            }
            Err(e) => {
                op.status = OpStatus::Failed;
                op.error = Some(e.clone());
                Some(e)
            }
        };
        if let Some(e) = failure {
            self.panel_mut(origin).last_error = Some(e.clone());
            self.show_message(e.to_string());
        }
        let tx = self.tx.clone();
        self.panel_mut(origin).refresh(&tx);
    }

    /// Refresh each panel whose current path is an ancestor of (or equal to)
    /// one of the affected directories.
    fn refresh_affected(&mut self, affected: &[PathBuf]) {
        let tx = self.tx.clone();
        for side in [PanelSide::Left, PanelSide::Right] {
            let panel = self.panel_mut(side);
            if affected.iter().any(|dir| dir.starts_with(&panel.path)) {
                panel.refresh(&tx);
            }
        }
    }

    /// Name of the highlighted entry, unless it is the ".." sentinel.
    fn operable_name(&mut self) -> Option<String> {
        match self.active_panel().selected_entry() {
            Some(entry) if !entry.is_parent() => Some(entry.name.clone()),
            _ => {
                self.show_message("No file selected");
                None
            }
        }
    }

    #[cfg(test)]
    pub fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn wait_until(app: &mut App, mut cond: impl FnMut(&App) -> bool) {
        for _ in 0..400 {
            app.poll_events();
            if cond(app) {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("condition not reached within timeout");
    }

    fn item(name: &str, is_directory: bool) -> FileItem {
        FileItem {
            name: name.to_string(),
            is_directory,
            size: 0,
            modified: chrono::Local::now(),
        }
    }

    fn ready_app(dir: &Path) -> App {
        let mut app = App::new(dir.to_path_buf(), dir.to_path_buf(), Config::default());
        wait_until(&mut app, |a| {
            !a.left.files.is_empty() && !a.right.files.is_empty()
        });
        app
    }

    impl App {
        fn move_to_name(&mut self, name: &str) {
            let idx = self
                .active_panel()
                .files
                .iter()
                .position(|f| f.name == name)
                .unwrap();
            self.active_panel_mut().cursor = idx;
        }
    }

    #[test]
    fn cursor_never_leaves_listing_bounds() {
        let mut panel = PanelState::new(PanelSide::Left, PathBuf::from("/x"));
        panel.files = vec![item("..", true), item("a", false), item("b", false)];

        panel.move_cursor(-10);
        assert_eq!(panel.cursor, 0);
        panel.move_cursor(100);
        assert_eq!(panel.cursor, 2);
        panel.move_cursor(-1);
        assert_eq!(panel.cursor, 1);

        panel.files.clear();
        panel.cursor = 0;
        panel.move_cursor(5);
        assert_eq!(panel.cursor, 0);
    }

    #[test]
    fn scroll_keeps_cursor_inside_viewport() {
        let mut panel = PanelState::new(PanelSide::Left, PathBuf::from("/x"));
        panel.files = (0..50).map(|i| item(&format!("f{i:02}"), false)).collect();

        for target in [0usize, 7, 49, 3, 20, 48, 0] {
            panel.cursor = target;
            panel.recompute_scroll(10);
            assert!(panel.scroll_offset <= panel.cursor);
            assert!(panel.cursor < panel.scroll_offset + 10);
        }
    }

    #[test]
    fn stale_listing_completion_is_dropped() {
        let tmp = TempDir::new().unwrap();
        let dir_a = tmp.path().join("a");
        let dir_b = tmp.path().join("b");
        fs::create_dir(&dir_a).unwrap();
        fs::create_dir(&dir_b).unwrap();

        let (tx, _rx) = mpsc::channel();
        let mut panel = PanelState::new(PanelSide::Left, dir_a.clone());
        panel.set_path(dir_a.clone(), &tx);
        let token_a = panel.read_token;
        panel.set_path(dir_b.clone(), &tx);
        let token_b = panel.read_token;

        // B's read completes first, then A's stale result arrives late.
        panel.on_listing_ready(token_b, &dir_b, Ok(vec![item("..", true), item("in-b", false)]));
        panel.on_listing_ready(token_a, &dir_a, Ok(vec![item("..", true), item("in-a", false)]));

        assert_eq!(panel.path, dir_b);
        assert_eq!(panel.files[1].name, "in-b");
    }

    #[test]
    fn failed_read_clears_listing_and_sets_error() {
        let (tx, _rx) = mpsc::channel();
        let mut panel = PanelState::new(PanelSide::Left, PathBuf::from("/x"));
        panel.files = vec![item("..", true), item("old", false)];
        panel.cursor = 1;
        panel.set_path(PathBuf::from("/locked"), &tx);
        let token = panel.read_token;

        panel.on_listing_ready(
            token,
            Path::new("/locked"),
            Err(FsError::PermissionDenied("/locked".to_string())),
        );
        assert!(panel.files.is_empty());
        assert_eq!(panel.cursor, 0);
        assert!(matches!(panel.last_error, Some(FsError::PermissionDenied(_))));
    }

    #[test]
    fn error_clears_on_next_successful_read() {
        let (tx, _rx) = mpsc::channel();
        let mut panel = PanelState::new(PanelSide::Left, PathBuf::from("/x"));
        panel.last_error = Some(FsError::PermissionDenied("/x".to_string()));
        panel.set_path(PathBuf::from("/y"), &tx);
        let token = panel.read_token;
        panel.on_listing_ready(token, Path::new("/y"), Ok(vec![item("..", true)]));
        assert!(panel.last_error.is_none());
    }

    #[test]
    fn toggling_twice_restores_active_panel_and_state() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("file.txt"), b"x").unwrap();
        let mut app = ready_app(tmp.path());

        let path = app.left.path.clone();
        let cursor = app.left.cursor;
        assert_eq!(app.active, PanelSide::Left);
        app.switch_panel();
        assert_eq!(app.active, PanelSide::Right);
        app.switch_panel();
        assert_eq!(app.active, PanelSide::Left);
        assert_eq!(app.left.path, path);
        assert_eq!(app.left.cursor, cursor);
    }

    #[test]
    fn activating_a_directory_descends_and_rereads() {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        fs::create_dir(&docs).unwrap();
        fs::write(docs.join("inner.txt"), b"x").unwrap();
        fs::write(tmp.path().join("notes.txt"), b"x").unwrap();
        let mut app = ready_app(tmp.path());

        // listing: [.., docs, notes.txt]
        app.active_panel_mut().move_cursor(1);
        assert_eq!(app.active_panel().selected_entry().unwrap().name, "docs");
        let job = app.activate_selected();
        assert!(job.is_none());
        assert_eq!(app.active_panel().path, docs);
        assert_eq!(app.active_panel().cursor, 0);

        wait_until(&mut app, |a| {
            a.left.files.iter().any(|f| f.name == "inner.txt")
        });
    }

    #[test]
    fn ascending_focuses_the_directory_we_left() {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("docs");
        fs::create_dir(&docs).unwrap();
        let mut app = App::new(docs.clone(), tmp.path().to_path_buf(), Config::default());
        wait_until(&mut app, |a| !a.left.files.is_empty());

        app.ascend_active();
        assert_eq!(app.left.path, tmp.path());
        wait_until(&mut app, |a| {
            a.left.path == tmp.path() && a.left.files.iter().any(|f| f.name == "docs")
        });
        assert_eq!(app.left.selected_entry().unwrap().name, "docs");
    }

    #[test]
    fn busy_engine_rejects_new_operations() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("file.txt"), b"x").unwrap();
        let mut app = ready_app(tmp.path());

        app.operation = Some(FileOperation {
            kind: OpKind::Copy,
            source: Some(tmp.path().join("file.txt")),
            dest: Some(tmp.path().join("elsewhere")),
            status: OpStatus::Running,
            replace: false,
            origin: PanelSide::Left,
            error: None,
        });

        app.move_to_name("file.txt");
        app.request_delete();
        let op = app.operation.as_ref().unwrap();
        assert_eq!(op.kind, OpKind::Copy);
        assert_eq!(op.status, OpStatus::Running);
        assert_eq!(app.message.as_deref(), Some("another operation is in progress"));
        assert!(app.dialog.is_none());
    }

    #[test]
    fn declined_delete_cancels_without_touching_the_filesystem() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("notes.txt");
        fs::write(&file, b"keep me").unwrap();
        let mut app = ready_app(tmp.path());

        app.move_to_name("notes.txt");
        app.request_delete();
        let op = app.operation.as_ref().unwrap();
        assert_eq!(op.status, OpStatus::AwaitingConfirmation);
        assert!(app.dialog.is_some());

        app.confirm_pending(false);
        assert_eq!(app.operation.as_ref().unwrap().status, OpStatus::Cancelled);
        assert!(file.exists());
    }

    #[test]
    fn confirmed_delete_runs_and_refreshes_both_panels() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("notes.txt");
        fs::write(&file, b"bye").unwrap();
        let mut app = ready_app(tmp.path());

        app.move_to_name("notes.txt");
        app.request_delete();
        app.confirm_pending(true);

        wait_until(&mut app, |a| {
            a.operation.as_ref().map(|o| o.status) == Some(OpStatus::Succeeded)
        });
        assert!(!file.exists());
        wait_until(&mut app, |a| {
            !a.left.files.iter().any(|f| f.name == "notes.txt")
                && !a.right.files.iter().any(|f| f.name == "notes.txt")
        });
    }

    #[test]
    fn copy_without_collision_needs_no_confirmation() {
        let tmp = TempDir::new().unwrap();
        let src_dir = tmp.path().join("src");
        let dst_dir = tmp.path().join("dst");
        fs::create_dir(&src_dir).unwrap();
        fs::create_dir(&dst_dir).unwrap();
        fs::write(src_dir.join("a.txt"), b"data").unwrap();

        let mut app = App::new(src_dir.clone(), dst_dir.clone(), Config::default());
        wait_until(&mut app, |a| a.left.files.len() == 2 && !a.right.files.is_empty());

        app.move_to_name("a.txt");
        app.request_copy();
        assert!(app.dialog.is_none());
        wait_until(&mut app, |a| {
            a.operation.as_ref().map(|o| o.status) == Some(OpStatus::Succeeded)
        });
        assert!(dst_dir.join("a.txt").exists());
        wait_until(&mut app, |a| a.right.files.iter().any(|f| f.name == "a.txt"));
    }

    #[test]
    fn copy_onto_existing_name_asks_before_overwriting() {
        let tmp = TempDir::new().unwrap();
        let src_dir = tmp.path().join("src");
        let dst_dir = tmp.path().join("dst");
        fs::create_dir(&src_dir).unwrap();
        fs::create_dir(&dst_dir).unwrap();
        fs::write(src_dir.join("a.txt"), b"new").unwrap();
        fs::write(dst_dir.join("a.txt"), b"old").unwrap();

        let mut app = App::new(src_dir.clone(), dst_dir.clone(), Config::default());
        wait_until(&mut app, |a| a.left.files.len() == 2);

        app.move_to_name("a.txt");
        app.request_copy();
        assert_eq!(
            app.dialog.as_ref().map(|d| d.kind),
            Some(DialogKind::ConfirmOverwrite)
        );

        app.confirm_pending(true);
        wait_until(&mut app, |a| {
            a.operation.as_ref().map(|o| o.status) == Some(OpStatus::Succeeded)
        });
        assert_eq!(fs::read(dst_dir.join("a.txt")).unwrap(), b"new");
    }

    #[test]
    fn mkdir_flows_through_the_input_dialog() {
        let tmp = TempDir::new().unwrap();
        let mut app = ready_app(tmp.path());

        app.request_mkdir();
        let Some(dialog) = app.dialog.as_mut() else {
            panic!("mkdir dialog missing");
        };
        dialog.input = "new-dir".to_string();
        let job = app.submit_input();
        assert!(job.is_none());

        wait_until(&mut app, |a| {
            a.operation.as_ref().map(|o| o.status) == Some(OpStatus::Succeeded)
        });
        assert!(tmp.path().join("new-dir").is_dir());
        wait_until(&mut app, |a| a.left.files.iter().any(|f| f.name == "new-dir"));
    }

    #[test]
    fn invalid_mkdir_name_keeps_the_dialog_open() {
        let tmp = TempDir::new().unwrap();
        let mut app = ready_app(tmp.path());

        app.request_mkdir();
        if let Some(dialog) = app.dialog.as_mut() {
            dialog.input = "a/b".to_string();
        }
        let job = app.submit_input();
        assert!(job.is_none());
        assert!(app.dialog.is_some());
        assert!(app.operation.is_none());
    }

    #[test]
    fn command_line_submission_yields_an_external_job() {
        let tmp = TempDir::new().unwrap();
        let mut app = ready_app(tmp.path());

        app.request_command_line();
        if let Some(dialog) = app.dialog.as_mut() {
            dialog.input = "ls -la".to_string();
        }
        let job = app.submit_input().unwrap();
        assert_eq!(job.command, "ls -la");
        assert_eq!(job.cwd, app.active_panel().path);
        assert!(app.operation_running());

        app.finish_external(Ok(()));
        assert_eq!(app.operation.as_ref().unwrap().status, OpStatus::Succeeded);
    }

    #[test]
    fn failed_external_command_surfaces_on_the_origin_panel() {
        let tmp = TempDir::new().unwrap();
        let mut app = ready_app(tmp.path());

        app.request_command_line();
        if let Some(dialog) = app.dialog.as_mut() {
            dialog.input = "false".to_string();
        }
        let _job = app.submit_input().unwrap();
        app.finish_external(Err(FsError::ExternalProcessFailed {
            command: "false".to_string(),
            status: 1,
        }));
        assert!(matches!(
            app.left.last_error,
            Some(FsError::ExternalProcessFailed { .. })
        ));
        assert_eq!(app.operation.as_ref().unwrap().status, OpStatus::Failed);
    }

    #[test]
    fn permission_denied_read_populates_panel_error() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let tmp = TempDir::new().unwrap();
            let locked = tmp.path().join("locked");
            fs::create_dir(&locked).unwrap();
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
            if fs::read_dir(&locked).is_ok() {
                // Privileged processes ignore mode bits; nothing to assert.
                return;
            }

            let mut app = ready_app(tmp.path());
            let tx = app.sender();
            app.left.set_path(locked.clone(), &tx);
            wait_until(&mut app, |a| a.left.last_error.is_some());

            assert!(matches!(app.left.last_error, Some(FsError::PermissionDenied(_))));
            assert!(app.left.files.is_empty());
            assert_eq!(app.left.cursor, 0);

            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    #[test]
    fn start_path_falls_back_to_nearest_readable_ancestor() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("gone/deeper");
        assert_eq!(valid_start_path(&missing, Path::new("/")), tmp.path());

        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));
        assert_eq!(
            valid_start_path(Path::new("/definitely/not/here"), &home),
            PathBuf::from("/")
        );
    }
}
