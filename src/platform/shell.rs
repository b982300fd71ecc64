//! Running scripts through an external interpreter (PowerShell by default).

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{Result, WinOsError};

/// Interpreter looked up when none is configured
pub const DEFAULT_INTERPRETER: &str = "powershell.exe";

/// Flags placed before the script: no prompts, no profile scripts
pub const DEFAULT_FLAGS: [&str; 3] = ["-NonInteractive", "-NoProfile", "-Command"];

/// Upper bound for a single script run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Deadline used when the configured timeout does not fit in an `Instant`
const MAX_WAIT: Duration = Duration::from_secs(u32::MAX as u64);

/// Something that can run a script and return its standard output
pub trait CommandRunner {
    fn execute(&self, script: &str) -> Result<String>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn execute(&self, script: &str) -> Result<String> {
        (**self).execute(script)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn execute(&self, script: &str) -> Result<String> {
        (**self).execute(script)
    }
}

/// A resolved script interpreter.
///
/// The program path is looked up once, when the runner is built; every
/// [`execute`](CommandRunner::execute) reuses it.
#[derive(Debug, Clone)]
pub struct PowerShell {
    program: PathBuf,
    flags: Vec<String>,
    timeout: Duration,
}

impl PowerShell {
    /// Locate `powershell.exe` on the `PATH`
    pub fn locate() -> Result<Self> {
        Self::locate_program(DEFAULT_INTERPRETER)
    }

    /// Locate `program` (a bare name searched on `PATH`, or a path)
    pub fn locate_program(program: &str) -> Result<Self> {
        let path = which::which(program).map_err(|e| WinOsError::InterpreterNotFound {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

        debug!("Using script interpreter {}", path.display());

        Ok(Self {
            program: path,
            flags: DEFAULT_FLAGS.iter().map(|f| f.to_string()).collect(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Replace the flags placed before the script
    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn command(&self, script: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.flags)
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
        }

        cmd
    }

    fn timed_out(&self, script: &str) -> WinOsError {
        warn!("Script timed out after {:?}: {}", self.timeout, script);
        WinOsError::Timeout {
            command: script.to_string(),
            after: self.timeout,
        }
    }

    /// Poll the child until it exits or the deadline passes
    fn wait_until(&self, child: &mut Child, deadline: Instant, script: &str) -> Result<ExitStatus> {
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }

            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(self.timed_out(script));
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Wait for both pipes to close. Processes started by the script may keep
    /// them open after the interpreter exits, so this is bounded by the same deadline.
    fn collect_output(
        &self,
        output: &Receiver<(Stream, Vec<u8>)>,
        deadline: Instant,
        script: &str,
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut stdout = None;
        let mut stderr = None;

        while stdout.is_none() || stderr.is_none() {
            let left = deadline.saturating_duration_since(Instant::now());
            match output.recv_timeout(left) {
                Ok((Stream::Stdout, buf)) => stdout = Some(buf),
                Ok((Stream::Stderr, buf)) => stderr = Some(buf),
                Err(RecvTimeoutError::Timeout) => return Err(self.timed_out(script)),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        Ok((stdout.unwrap_or_default(), stderr.unwrap_or_default()))
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>, stream: Stream, output: Sender<(Stream, Vec<u8>)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = output.send((stream, buf));
    });
}

impl CommandRunner for PowerShell {
    fn execute(&self, script: &str) -> Result<String> {
        debug!("Running script: {}", script);

        let start = Instant::now();
        let deadline = start
            .checked_add(self.timeout)
            .unwrap_or(start + MAX_WAIT);
        let mut child = self
            .command(script)
            .spawn()
            .map_err(|e| WinOsError::ProcessSpawn {
                command: script.to_string(),
                source: e,
            })?;

        // Drain both pipes while waiting so a chatty child cannot block on a full pipe
        let (tx, rx) = mpsc::channel();
        drain(child.stdout.take(), Stream::Stdout, tx.clone());
        drain(child.stderr.take(), Stream::Stderr, tx);

        // On timeout the reader threads are left to finish on their own
        let status = self.wait_until(&mut child, deadline, script)?;
        let (stdout, stderr) = self.collect_output(&rx, deadline, script)?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
            warn!("Script failed ({}): {}", status, script);
            return Err(WinOsError::NonZeroExit {
                command: script.to_string(),
                code: status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}
