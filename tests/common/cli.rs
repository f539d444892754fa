use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

#[derive(Debug)]
pub struct BoardRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

pub struct BoardWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub log_dir: PathBuf,
}

impl BoardWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let log_dir = root.join("logs");
        fs::create_dir_all(&log_dir).expect("log dir");
        Self {
            temp_dir,
            root,
            log_dir,
        }
    }

    pub fn board_dir(&self) -> PathBuf {
        self.root.join(".board")
    }

    /// Write an event file under the workspace root.
    pub fn write_events(&self, name: &str, lines: &[String]) -> PathBuf {
        let path = self.root.join(name);
        fs::write(&path, lines.join("\n")).expect("write events");
        path
    }

    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}

pub fn run_board<I, S>(workspace: &BoardWorkspace, args: I, label: &str) -> BoardRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_board_with_env(
        workspace,
        args,
        std::iter::empty::<(String, String)>(),
        label,
    )
}

pub fn run_board_with_env<I, S, E, K, V>(
    workspace: &BoardWorkspace,
    args: I,
    env_vars: E,
    label: &str,
) -> BoardRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("board"));
    cmd.current_dir(&workspace.root);
    cmd.env_remove("BOARD_DIR");
    cmd.env_remove("BOARD_DUMP_FILE");
    cmd.env_remove("BOARD_COLUMNS");
    cmd.env_remove("RUST_LOG");
    cmd.env("HOME", &workspace.root);
    cmd.env("RUST_BACKTRACE", "1");
    cmd.args(args);
    cmd.envs(env_vars);

    let start = Instant::now();
    let output = cmd.output().expect("run board");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let timestamp = SystemTime::now();
    let log_body = format!(
        "label: {label}\nstarted: {:?}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        timestamp,
        duration,
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
        workspace.root.display(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    BoardRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}

/// Parse stdout of a `--json` run.
pub fn parse_json(run: &BoardRun) -> serde_json::Value {
    serde_json::from_str(run.stdout.trim()).unwrap_or_else(|e| {
        panic!("stdout is not JSON ({e}): {}", run.stdout);
    })
}

/// Parse the structured error a failing run printed on stderr.
pub fn parse_error(run: &BoardRun) -> serde_json::Value {
    let start = run.stderr.find('{').expect("structured error on stderr");
    serde_json::from_str(run.stderr[start..].trim()).unwrap_or_else(|e| {
        panic!("stderr is not a structured error ({e}): {}", run.stderr);
    })
}
