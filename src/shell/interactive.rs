//! Interactive shell backend
//!
//! A single `sh` process is kept alive for the whole session so that state
//! such as the working directory carries over between commands. Commands
//! are queued on an unbounded channel and written to the shell's stdin one
//! at a time by a worker task. After each command the worker writes an
//! `echo` of a per-session marker followed by `$?`; the marker line tells
//! the worker that the command finished and with which exit status.
//!
//! Output of commands submitted without a callback goes straight to the
//! output sink. Output of commands with a callback is collected and handed
//! to the callback instead.
//!
//! Teardown does not queue behind pending commands: a shutdown signal
//! interrupts the command the worker is waiting on, and the process is
//! killed right away.

use async_trait::async_trait;
use std::env;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{ShellBackend, ShellCommand, ShellResult, PRIVILEGE_KEYWORD};
use crate::config::ShellConfig;
use crate::error::{Error, Result};
use crate::output::OutputSink;

/// Grace period between killing the shell and giving up on reaping it
const KILL_WAIT: Duration = Duration::from_secs(2);

/// Long-lived shell process fed through a worker task
pub struct InteractiveShell {
    tx: mpsc::UnboundedSender<ShellCommand>,
    shutdown: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<Result<()>>>>,
    privilege_available: bool,
}

impl InteractiveShell {
    /// Spawn the configured shell and its worker on the current runtime
    pub fn spawn(config: &ShellConfig, output: Arc<dyn OutputSink>) -> Result<Self> {
        let mut child = Command::new(&config.program)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Other(format!(
                    "Failed to start shell '{}': {}",
                    config.program.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Other("Shell stdin is not piped".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Other("Shell stdout is not piped".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            let sink = output.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    sink.on_output(&line);
                }
                trace!("Shell stderr closed");
            });
        }

        info!(
            "Started shell '{}' (pid {:?})",
            config.program.display(),
            child.id()
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let worker = ShellWorker {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            marker: format!("__shellroute_done_{}__", Uuid::new_v4().simple()),
            output,
        };
        let handle = tokio::spawn(worker.run(rx, shutdown_rx));

        Ok(Self {
            tx,
            shutdown,
            worker: Mutex::new(Some(handle)),
            privilege_available: binary_on_path(PRIVILEGE_KEYWORD),
        })
    }
}

#[async_trait]
impl ShellBackend for InteractiveShell {
    fn submit(&self, command: ShellCommand) -> Result<()> {
        let text = command.text.clone();
        self.tx
            .send(command)
            .map_err(|_| Error::ShellSubmitFailed {
                command: text,
                reason: Error::ShellNotRunning.to_string(),
            })
    }

    fn is_privilege_available(&self) -> bool {
        self.privilege_available
    }

    async fn terminate(&self) -> Result<()> {
        self.shutdown.send_replace(true);

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match worker {
            Some(handle) => handle.await.map_err(|e| Error::ShellTeardownFailed {
                reason: e.to_string(),
            })?,
            None => {
                debug!("Shell worker already stopped");
                Ok(())
            }
        }
    }
}

struct ShellWorker {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    marker: String,
    output: Arc<dyn OutputSink>,
}

impl ShellWorker {
    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<ShellCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        loop {
            let command = tokio::select! {
                command = rx.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
                _ = shutdown.changed() => break,
            };

            let text = command.text.clone();
            let outcome = tokio::select! {
                outcome = self.run_command(command) => outcome,
                _ = shutdown.changed() => {
                    debug!("Teardown interrupted '{}'", text);
                    break;
                }
            };

            if let Err(e) = outcome {
                error!("Shell command failed: {}", e);
                self.output.on_output(&e.to_string());
                if matches!(e, Error::ShellNotRunning) {
                    break;
                }
            }
        }

        let result = self.kill().await;
        info!("Shell worker stopped");
        result
    }

    async fn run_command(&mut self, command: ShellCommand) -> Result<()> {
        debug!("Shell <- {:?}", command);
        let script = format!("{}\necho \"{} $?\"\n", command.text, self.marker);
        self.stdin
            .write_all(script.as_bytes())
            .await
            .map_err(|_| Error::ShellNotRunning)?;
        self.stdin.flush().await.map_err(|_| Error::ShellNotRunning)?;

        let collect = command.wants_result();
        let mut collected = Vec::new();
        let exit_code = loop {
            let line = match self.stdout.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return Err(Error::ShellNotRunning),
                Err(e) => return Err(Error::Io(e)),
            };

            let (text, status) = match line.find(&self.marker) {
                Some(index) => {
                    let status = line[index + self.marker.len()..]
                        .trim()
                        .parse::<i32>()
                        .unwrap_or(-1);
                    (&line[..index], Some(status))
                }
                None => (line.as_str(), None),
            };

            if status.is_none() || !text.is_empty() {
                if collect {
                    collected.push(text.to_string());
                } else {
                    self.output.on_output(text);
                }
            }

            if let Some(status) = status {
                break status;
            }
        };

        if let Some(callback) = command.on_result {
            callback(ShellResult {
                code: command.code,
                exit_code,
                output: collected,
            });
        }
        Ok(())
    }

    async fn kill(&mut self) -> Result<()> {
        if let Ok(Some(status)) = self.child.try_wait() {
            debug!("Shell already exited with {}", status);
            return Ok(());
        }

        self.child.start_kill().map_err(|e| Error::ShellTeardownFailed {
            reason: e.to_string(),
        })?;
        match tokio::time::timeout(KILL_WAIT, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!("Shell exited with {}", status);
                Ok(())
            }
            Ok(Err(e)) => Err(Error::ShellTeardownFailed {
                reason: e.to_string(),
            }),
            Err(_) => Err(Error::ShellTeardownFailed {
                reason: "shell did not exit after kill".to_string(),
            }),
        }
    }
}

/// Whether an executable named `name` exists on `$PATH`
fn binary_on_path(name: &str) -> bool {
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| is_file(&dir.join(name))))
        .unwrap_or(false)
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}
