use std::path::Path;
use std::process::Command;

use crate::error::{FsError, FsResult};

/// Run a shell command line in `cwd` with the terminal handed over to it.
///
/// The caller is responsible for leaving raw mode / the alternate screen
/// before invoking this and restoring them afterwards. Non-zero exit is an
/// error so the UI can surface it; a command killed by a signal reports
/// status -1.
pub fn run_in_dir(command: &str, cwd: &Path, shell: &str) -> FsResult<()> {
    let status = Command::new(shell)
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .status()
        .map_err(|e| FsError::Io(format!("{}: {}", shell, e)))?;

    if status.success() {
        Ok(())
    } else {
        Err(FsError::ExternalProcessFailed {
            command: command.to_string(),
            status: status.code().unwrap_or(-1),
        })
    }
}

/// Build the command line handing `file` to a viewer or editor program.
pub fn open_command(program: &str, file: &Path) -> String {
    format!("{} {}", program, shell_quote(&file.display().to_string()))
}

/// Single-quote a string for POSIX shells.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn zero_exit_is_ok() {
        let tmp = TempDir::new().unwrap();
        run_in_dir("true", tmp.path(), "/bin/sh").unwrap();
    }

    #[test]
    fn nonzero_exit_is_classified() {
        let tmp = TempDir::new().unwrap();
        let err = run_in_dir("exit 3", tmp.path(), "/bin/sh").unwrap_err();
        assert_eq!(
            err,
            FsError::ExternalProcessFailed {
                command: "exit 3".to_string(),
                status: 3,
            }
        );
    }

    #[test]
    fn commands_run_in_the_given_directory() {
        let tmp = TempDir::new().unwrap();
        run_in_dir("touch made-here", tmp.path(), "/bin/sh").unwrap();
        assert!(tmp.path().join("made-here").exists());
    }

    #[test]
    fn quoting_survives_spaces_and_quotes() {
        let path = PathBuf::from("/tmp/it's a file.txt");
        let cmd = open_command("less", &path);
        assert_eq!(cmd, r"less '/tmp/it'\''s a file.txt'");
    }
}
