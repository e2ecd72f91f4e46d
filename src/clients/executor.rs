use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// What happened when a process was run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutput {
    Completed { code: Option<i32>, stdout: String, stderr: String },
    TimedOut,
    NotFound,
    SpawnFailed(String),
}

impl ProcessOutput {
    /// True only for a completed run with exit status zero.
    pub const fn success(&self) -> bool {
        matches!(self, Self::Completed { code: Some(0), .. })
    }

    /// Stdout of a successful run.
    pub fn success_stdout(&self) -> Option<&str> {
        match self {
            Self::Completed { code: Some(0), stdout, .. } => Some(stdout),
            _ => None,
        }
    }
}

/// Spawns argument vectors without a shell.
pub trait CommandRunner {
    /// Run `argv` to completion or until `timeout` elapses.
    ///
    /// Never fails: every outcome, including a missing executable, is a
    /// [`ProcessOutput`] variant.
    fn run(&self, argv: &[String], timeout: Duration) -> ProcessOutput;
}

/// Wall-clock limits for child processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Timeouts {
    /// `--version` availability probes.
    pub probe_secs: u64,
    /// list / add / remove / get calls.
    pub mutation_secs: u64,
    /// Interactive editor sessions.
    pub editor_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { probe_secs: 5, mutation_secs: 10, editor_secs: 300 }
    }
}

impl Timeouts {
    pub const fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }

    pub const fn mutation(&self) -> Duration {
        Duration::from_secs(self.mutation_secs)
    }

    pub const fn editor(&self) -> Duration {
        Duration::from_secs(self.editor_secs)
    }
}

/// [`CommandRunner`] backed by `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String], timeout: Duration) -> ProcessOutput {
        let Some((program, args)) = argv.split_first() else {
            return ProcessOutput::SpawnFailed("empty argument vector".to_string());
        };
        debug!("Running {argv:?} (timeout {}s)", timeout.as_secs());

        let mut child = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{program} not found");
                return ProcessOutput::NotFound;
            },
            Err(e) => {
                warn!("Failed to spawn {program}: {e}");
                return ProcessOutput::SpawnFailed(e.to_string());
            },
        };

        // Drain pipes concurrently so a chatty child cannot block on a full pipe
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Some(status),
                Ok(None) if Instant::now() >= deadline => break None,
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    warn!("Failed to wait for {program}: {e}");
                    break None;
                },
            }
        };

        let Some(status) = status else {
            if let Err(e) = child.kill() {
                debug!("Failed to kill {program}: {e}");
            }
            let _ = child.wait();
            warn!("{program} timed out after {}s", timeout.as_secs());
            return ProcessOutput::TimedOut;
        };

        ProcessOutput::Completed {
            code: status.code(),
            stdout: stdout.map(join_drain).unwrap_or_default(),
            stderr: stderr.map(join_drain).unwrap_or_default(),
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_drain(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

/// Run `argv` attached to the terminal, e.g. an editor.
///
/// Returns true if the process exited successfully before `timeout`.
pub fn run_interactive(argv: &[String], timeout: Duration) -> bool {
    let Some((program, args)) = argv.split_first() else {
        return false;
    };

    let mut child = match Command::new(program).args(args).spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to launch {program}: {e}");
            return false;
        },
    };

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return status.success(),
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                warn!("{program} timed out after {}s", timeout.as_secs());
                return false;
            },
            Ok(None) => thread::sleep(Duration::from_millis(100)),
            Err(e) => {
                warn!("Failed to wait for {program}: {e}");
                return false;
            },
        }
    }
}
