use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

/// Isolated config and data directories with sync turned off
pub struct TestEnv {
    root: TempDir,
    extra_env: Vec<(String, String)>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temporary test dir"),
            extra_env: Vec::new(),
        }
    }

    /// Set an extra environment variable for every run
    #[allow(dead_code)]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.extra_env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config").join("config.toml")
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_quotebook"));
        cmd.args(args)
            .current_dir(self.path())
            .env("HOME", self.path())
            .env("QUOTEBOOK_CONFIG", self.config_path())
            .env("QUOTEBOOK_DATA_DIR", self.path().join("data"))
            .env("QUOTEBOOK_SYNC_ENABLED", "false")
            .env_remove("QUOTEBOOK_SYNC_URL")
            .env_remove("QUOTEBOOK_SYNC_INTERVAL")
            .env_remove("QUOTEBOOK_MERGE_POLICY")
            .env_remove("QUOTEBOOK_LOG");
        for (key, value) in &self.extra_env {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("failed to execute quotebook binary")
    }

    /// Run with `input` piped to stdin
    #[allow(dead_code)]
    pub fn run_with_stdin(&self, args: &[&str], input: impl AsRef<[u8]>) -> Output {
        self.run_with_stdin_chunks(args, &[input.as_ref()], Duration::ZERO)
    }

    /// Run with stdin fed one chunk at a time, sleeping `pause` between chunks
    #[allow(dead_code)]
    pub fn run_with_stdin_chunks(
        &self,
        args: &[&str],
        chunks: &[&[u8]],
        pause: Duration,
    ) -> Output {
        let mut child = self.spawn_piped(args);
        let mut stdin = child.stdin.take().expect("stdin is piped");

        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 {
                thread::sleep(pause);
            }
            stdin.write_all(chunk).expect("write to quotebook stdin");
            stdin.flush().expect("flush quotebook stdin");
        }
        drop(stdin);

        child
            .wait_with_output()
            .expect("failed to wait for quotebook binary")
    }

    fn spawn_piped(&self, args: &[&str]) -> Child {
        self.command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn quotebook binary")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{} should succeed\nstdout:\n{}\nstderr:\n{}",
        what,
        stdout(output),
        stderr(output)
    );
}
