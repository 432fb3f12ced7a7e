//! Timeout-bounded child process execution.
//!
//! Used by the repository fetcher and by delegated analyzers. Output pipes
//! are drained on their own threads so a chatty child cannot deadlock on a
//! full pipe while we poll for exit. The deadline covers the drain too: a
//! descendant that inherited the pipes cannot hold the caller past it.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};

use crate::errors::ProcessError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Captured result of a process that exited on its own.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code as text, or `signal` when the process was killed.
    pub fn status_label(&self) -> String {
        match self.status.code() {
            Some(code) => format!("exit code {code}"),
            None => "signal".to_string(),
        }
    }
}

/// Run `cmd` to completion, killing it once `timeout` elapses.
///
/// stdin is closed; stdout and stderr are captured (lossy UTF-8).
pub fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<ProcessOutput, ProcessError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;

    let (tx, rx) = unbounded();
    let readers = usize::from(drain(child.stdout.take(), Stream::Stdout, &tx))
        + usize::from(drain(child.stderr.take(), Stream::Stderr, &tx));
    drop(tx);
    let deadline = Instant::now() + timeout;

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                let now = Instant::now();
                if now >= deadline {
                    kill(&mut child);
                    // Reader threads are left detached: a grandchild may still
                    // hold the pipes open.
                    return Err(ProcessError::TimedOut {
                        program,
                        after: timeout,
                    });
                }
                thread::sleep(POLL_INTERVAL.min(deadline - now));
            }
            Err(source) => {
                kill(&mut child);
                return Err(ProcessError::Wait { program, source });
            }
        }
    };

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    for _ in 0..readers {
        match rx.recv_deadline(deadline) {
            Ok((Stream::Stdout, buf)) => stdout = buf,
            Ok((Stream::Stderr, buf)) => stderr = buf,
            // The child exited but something it spawned still holds a pipe.
            // The reader threads are abandoned; they end when the pipe closes.
            Err(RecvTimeoutError::Timeout) => {
                return Err(ProcessError::TimedOut {
                    program,
                    after: timeout,
                });
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(ProcessOutput {
        status,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    })
}

/// Read `pipe` to EOF on its own thread and send the bytes on `tx`.
/// Returns whether a reader was started.
fn drain<R: Read + Send + 'static>(pipe: Option<R>, stream: Stream, tx: &Sender<(Stream, Vec<u8>)>) -> bool {
    let Some(mut pipe) = pipe else {
        return false;
    };
    let tx = tx.clone();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send((stream, buf));
    });
    true
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_stdout_and_status() {
        let out = run_with_timeout(&mut sh("echo hello; echo oops >&2"), Duration::from_secs(5))
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn non_zero_exit_is_reported_not_raised() {
        let out = run_with_timeout(&mut sh("exit 3"), Duration::from_secs(5)).unwrap();
        assert!(!out.success());
        assert_eq!(out.status_label(), "exit code 3");
    }

    #[test]
    fn slow_process_is_killed() {
        let start = Instant::now();
        let err = run_with_timeout(&mut sh("sleep 5"), Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, ProcessError::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn descendant_holding_the_pipes_does_not_outlive_the_deadline() {
        let start = Instant::now();
        let err = run_with_timeout(&mut sh("sleep 4 & echo true,true"), Duration::from_millis(200))
            .unwrap_err();
        assert!(matches!(err, ProcessError::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn missing_program_is_not_found() {
        let mut cmd = Command::new("faultscan-no-such-program-7f3a");
        let err = run_with_timeout(&mut cmd, Duration::from_secs(1)).unwrap_err();
        assert!(err.is_not_found());
    }
}
