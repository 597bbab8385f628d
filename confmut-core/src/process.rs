//! Shell process execution with output capture and a hard timeout.
//!
//! Each command runs through `sh -c` as the leader of its own process
//! group. The group is killed when the run ends, whichever way it ends, so
//! a timed-out command cannot leave children behind.

use camino::Utf8Path;
use std::io::{self, Read};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::debug;

/// Environment variable carrying the mutated file path to the command.
pub const FILE_ENV: &str = "CONFMUT_FILE";

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const TRUNCATED: &str = "\n[... truncated]";

/// Substitute every `{}` in `template` with the shell-quoted `path`.
pub fn expand_template(template: &str, path: &Utf8Path) -> String {
    template.replace("{}", &shell_quote(path.as_str()))
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// How a process run ended.
#[derive(Debug)]
pub(crate) enum Termination {
    Exited(i32),
    Signaled(i32),
    TimedOut,
}

impl From<ExitStatus> for Termination {
    fn from(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => Termination::Exited(code),
            (None, Some(signal)) => Termination::Signaled(signal),
            // Neither code nor signal: treat as abnormal.
            (None, None) => Termination::Signaled(0),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Captured {
    pub termination: Termination,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Owns a spawned process group and kills it on drop.
struct GroupGuard {
    child: Child,
    reaped: bool,
}

impl GroupGuard {
    fn kill_group(&self) {
        let pgid = self.child.id() as libc::pid_t;
        // SAFETY: signalling a process group we created; ESRCH is ignored.
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        self.kill_group();
        if !self.reaped {
            let _ = self.child.wait();
        }
    }
}

/// Run `command` through `sh -c`, killing it after `timeout`.
///
/// Returns `Err` only when the shell itself cannot be spawned.
pub(crate) fn run_shell(
    command: &str,
    file: &Utf8Path,
    timeout: Duration,
    output_limit: usize,
) -> io::Result<Captured> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .env(FILE_ENV, file.as_str())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0);

    let start = Instant::now();
    let mut child = cmd.spawn()?;
    let stdout = child.stdout.take().map(|p| capture(p, output_limit));
    let stderr = child.stderr.take().map(|p| capture(p, output_limit));
    let mut guard = GroupGuard {
        child,
        reaped: false,
    };

    let termination = loop {
        if let Some(status) = guard.child.try_wait()? {
            guard.reaped = true;
            break Termination::from(status);
        }
        if start.elapsed() >= timeout {
            debug!(command, ?timeout, "command timed out; killing process group");
            guard.kill_group();
            let _ = guard.child.wait();
            guard.reaped = true;
            break Termination::TimedOut;
        }
        std::thread::sleep(POLL_INTERVAL);
    };
    let elapsed = start.elapsed();
    // Background children still holding the pipes go down with the group.
    drop(guard);

    Ok(Captured {
        termination,
        stdout: join_capture(stdout),
        stderr: join_capture(stderr),
        elapsed,
    })
}

fn capture<R: Read + Send + 'static>(mut pipe: R, limit: usize) -> JoinHandle<(Vec<u8>, bool)> {
    std::thread::spawn(move || {
        let mut kept = Vec::new();
        let _ = (&mut pipe).take(limit as u64).read_to_end(&mut kept);
        // Keep draining so the child never blocks on a full pipe.
        let dropped = io::copy(&mut pipe, &mut io::sink()).unwrap_or(0);
        (kept, dropped > 0)
    })
}

fn join_capture(handle: Option<JoinHandle<(Vec<u8>, bool)>>) -> String {
    let Some((bytes, truncated)) = handle.and_then(|h| h.join().ok()) else {
        return String::new();
    };
    let mut text = String::from_utf8_lossy(&bytes).into_owned();
    if truncated {
        text.push_str(TRUNCATED);
    }
    text
}
