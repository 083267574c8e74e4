use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// User configuration, read once at startup from
/// `$XDG_CONFIG_HOME/twindir/config.json`. Every field is optional; the
/// environment and built-in defaults fill the gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Program used by the view action (default: `$PAGER`, then `less`).
    pub viewer: Option<String>,
    /// Program used by the edit action (default: `$VISUAL`/`$EDITOR`, then `vi`).
    pub editor: Option<String>,
    /// Shell used for the command line and program handoff
    /// (default: `$SHELL`, then `/bin/sh`).
    pub shell: Option<String>,
}

impl Config {
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("twindir").join("config.json"))
    }

    pub fn viewer_command(&self) -> String {
        self.viewer
            .clone()
            .or_else(|| env::var("PAGER").ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| "less".to_string())
    }

    pub fn editor_command(&self) -> String {
        self.editor
            .clone()
            .or_else(|| env::var("VISUAL").ok().filter(|v| !v.is_empty()))
            .or_else(|| env::var("EDITOR").ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| "vi".to_string())
    }

    pub fn shell_command(&self) -> String {
        self.shell
            .clone()
            .or_else(|| env::var("SHELL").ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| "/bin/sh".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_to_none() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.viewer.is_none());
        assert!(config.editor.is_none());
        assert!(config.shell.is_none());
    }

    #[test]
    fn explicit_config_wins_over_environment() {
        let config = Config {
            viewer: Some("bat".to_string()),
            editor: Some("hx".to_string()),
            shell: Some("/bin/zsh".to_string()),
        };
        assert_eq!(config.viewer_command(), "bat");
        assert_eq!(config.editor_command(), "hx");
        assert_eq!(config.shell_command(), "/bin/zsh");
    }
}
