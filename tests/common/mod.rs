//! Shared integration-test harness for spawning a `gridclash` server as a
//! child process and talking to it over HTTP.

#![allow(dead_code)]

use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

/// How long to wait for the server to report its listening address.
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// A running `gridclash serve` process on an ephemeral port.
///
/// The child process is killed on drop via `kill_on_drop(true)`.
pub struct GridClashServer {
    child: Child,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl GridClashServer {
    /// Spawns `gridclash serve` bound to `127.0.0.1:0` with `extra` flags.
    ///
    /// Reads stderr until the "HTTP server listening" line to discover the port.
    #[allow(clippy::missing_panics_doc)]
    pub async fn start(extra: &[&str]) -> Self {
        let bin = env!("CARGO_BIN_EXE_gridclash");
        let mut child = Command::new(bin)
            .args(["serve", "--bind", "127.0.0.1:0", "-v", "--color", "never"])
            .args(extra)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .expect("failed to spawn gridclash");

        let stderr = child.stderr.take().expect("stderr not captured");
        let mut reader = BufReader::new(stderr);
        let mut line = String::new();

        let port = tokio::time::timeout(STARTUP_TIMEOUT, async {
            loop {
                line.clear();
                let read = reader
                    .read_line(&mut line)
                    .await
                    .expect("failed to read stderr");
                assert!(read > 0, "server exited before printing listening address");
                if line.contains("HTTP server listening") {
                    if let Some(port) = parse_port(&line) {
                        return port;
                    }
                }
            }
        })
        .await
        .expect("timed out waiting for HTTP server startup");

        // Keep draining stderr so the child never blocks on a full pipe.
        tokio::spawn(async move {
            let mut sink = String::new();
            while reader.read_line(&mut sink).await.is_ok_and(|n| n > 0) {
                sink.clear();
            }
        });

        Self {
            child,
            base_url: format!("http://127.0.0.1:{port}"),
            client: reqwest::Client::new(),
        }
    }

    /// GETs `path` and returns status and body.
    #[allow(clippy::missing_panics_doc)]
    pub async fn get(&self, path: &str) -> (reqwest::StatusCode, String) {
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("request failed");
        let status = resp.status();
        (status, resp.text().await.expect("body not text"))
    }

    /// Kills the server.
    pub async fn shutdown(mut self) {
        let _ = self.child.kill().await;
    }
}

/// Extracts the port from a line containing `127.0.0.1:<port>`.
fn parse_port(line: &str) -> Option<u16> {
    let start = line.find("127.0.0.1:")? + "127.0.0.1:".len();
    let digits: String = line[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Runs `gridclash` with `args` to completion.
#[allow(clippy::missing_panics_doc)]
pub fn run_command(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_gridclash"))
        .args(args)
        .output()
        .expect("failed to run gridclash")
}
