use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{BOARD_DIR_NAME, CONFIG_FILENAME};
use crate::error::{Result, io_context};
use crate::format::OutputMode;

const CONFIG_TEMPLATE: &str = r#"# Board configuration
# dump-file: board.json
# log-level: info
# log-file: board.log
#
# Columns, checked in order. Labeled columns win over unlabeled ones.
# columns:
#   - name: Inbox
#     default: true
#   - name: Backlog
#     label: backlog
#     sorting: true
#   - name: Ready
#     label: ready
#     sorting: true
#   - name: In Progress
#     label: in progress
#     sorting: true
#   - name: Needs Review
#     label: needs review
#     sorting: true
#   - name: Done
#     closed: true
"#;

const GITIGNORE: &str = "# Board state\n*.json\n*.tmp\n*.log\n";

#[derive(Debug, Serialize)]
struct InitResult {
    board_dir: PathBuf,
    created: bool,
}

/// Execute the init command.
///
/// `dir` names the board directory itself; defaults to `./.board`.
/// Existing files are left untouched.
///
/// # Errors
///
/// Returns an error if the directory or its files cannot be created.
pub fn execute(dir: Option<&Path>, mode: OutputMode) -> Result<()> {
    let board_dir = dir.map_or_else(|| PathBuf::from(BOARD_DIR_NAME), Path::to_path_buf);
    let created = !board_dir.is_dir();
    if created {
        fs::create_dir_all(&board_dir)
            .map_err(|e| io_context("create board directory", &board_dir, e))?;
    }

    let config_path = board_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        fs::write(&config_path, CONFIG_TEMPLATE)
            .map_err(|e| io_context("write config", &config_path, e))?;
    }

    let gitignore_path = board_dir.join(".gitignore");
    if !gitignore_path.exists() {
        fs::write(&gitignore_path, GITIGNORE)
            .map_err(|e| io_context("write .gitignore", &gitignore_path, e))?;
    }

    let result = InitResult { board_dir, created };
    mode.emit(&result, || {
        if result.created {
            format!("Initialized board in {}", result.board_dir.display())
        } else {
            format!("Board already initialized in {}", result.board_dir.display())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLayer;
    use tempfile::TempDir;

    #[test]
    fn creates_board_directory() {
        let temp = TempDir::new().unwrap();
        let board_dir = temp.path().join(".board");
        execute(Some(&board_dir), OutputMode::Quiet).unwrap();

        assert!(board_dir.is_dir());
        assert!(board_dir.join(CONFIG_FILENAME).exists());
        assert!(board_dir.join(".gitignore").exists());
    }

    #[test]
    fn template_parses_as_empty_config() {
        let layer = ConfigLayer::from_yaml_str(CONFIG_TEMPLATE).unwrap();
        assert!(layer.values.is_empty());
        assert!(layer.columns.is_none());
    }

    #[test]
    fn second_run_keeps_config() {
        let temp = TempDir::new().unwrap();
        let board_dir = temp.path().join(".board");
        execute(Some(&board_dir), OutputMode::Quiet).unwrap();
        fs::write(board_dir.join(CONFIG_FILENAME), "log-level: debug\n").unwrap();

        execute(Some(&board_dir), OutputMode::Quiet).unwrap();
        let contents = fs::read_to_string(board_dir.join(CONFIG_FILENAME)).unwrap();
        assert_eq!(contents, "log-level: debug\n");
    }
}
