use std::io::{self, Read};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use wait_timeout::ChildExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    Success,
    Failure(i32),
    Timeout,
    Signal(i32),
}

#[derive(Error, Debug)]
pub enum CheckerError {
    #[error("Couldn't start {path:?}")]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0:?} timed out")]
    TimedOut(PathBuf),
    #[error("{path:?} exited with status {code}")]
    Exited { path: PathBuf, code: i32 },
    #[error("{path:?} was killed by {}", describe_signal(.signal))]
    Signaled { path: PathBuf, signal: i32 },
    #[error("Lost contact with {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Everything the checker printed on stdout, plus how it ended.
#[derive(Debug)]
pub struct CheckerOutput {
    pub path: PathBuf,
    pub lines: Vec<String>,
    pub result: ProcessResult,
}

impl CheckerOutput {
    pub fn ensure_success(&self) -> Result<(), CheckerError> {
        let path = self.path.clone();
        match self.result {
            ProcessResult::Success => Ok(()),
            ProcessResult::Failure(code) => Err(CheckerError::Exited { path, code }),
            ProcessResult::Timeout => Err(CheckerError::TimedOut(path)),
            ProcessResult::Signal(signal) => Err(CheckerError::Signaled { path, signal }),
        }
    }
}

pub fn signal_name(signal: i32) -> String {
    match signal {
        libc::SIGSEGV => "SIGSEGV".to_string(),
        libc::SIGABRT => "SIGABRT".to_string(),
        libc::SIGFPE => "SIGFPE".to_string(),
        libc::SIGBUS => "SIGBUS".to_string(),
        libc::SIGKILL => "SIGKILL".to_string(),
        libc::SIGTERM => "SIGTERM".to_string(),
        other => format!("signal {other}"),
    }
}

fn describe_signal(signal: &i32) -> String {
    signal_name(*signal)
}

fn classify(status: ExitStatus) -> ProcessResult {
    if status.success() {
        return ProcessResult::Success;
    }

    match (status.code(), status.signal()) {
        (Some(code), _) => ProcessResult::Failure(code),
        (None, Some(signal)) => ProcessResult::Signal(signal),
        // Not reachable on unix, every status has one or the other
        (None, None) => ProcessResult::Failure(-1),
    }
}

/// Splits on `\n` only, so a `\r` the checker prints is echoed back as-is.
/// The empty piece after a final newline is not a line.
fn split_lines(bytes: &[u8]) -> Vec<String> {
    if bytes.is_empty() {
        return Vec::new();
    }

    let text = String::from_utf8_lossy(bytes);
    let text = text.strip_suffix('\n').unwrap_or(&text);
    text.split('\n').map(str::to_string).collect()
}

/// Kills the checker and everything it started. The checker leads its own
/// process group whenever a limit is set.
fn kill_group(child: &mut Child) -> io::Result<()> {
    let pgid = libc::pid_t::try_from(child.id()).map_err(io::Error::other)?;
    // SAFETY: kill(2) has no memory-safety preconditions
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        let err = io::Error::last_os_error();
        // Group already gone
        if err.raw_os_error() != Some(libc::ESRCH) {
            return Err(err);
        }
    }
    Ok(())
}

fn wait_for(child: &mut Child, limit: Option<Duration>) -> io::Result<ProcessResult> {
    match limit {
        None => child.wait().map(classify),
        Some(limit) => match child.wait_timeout(limit)? {
            Some(status) => Ok(classify(status)),
            None => {
                kill_group(child)?;
                child.wait()?;
                Ok(ProcessResult::Timeout)
            }
        },
    }
}

/// Runs the checker with no arguments and collects its stdout as lines.
///
/// Stdout is drained on a separate thread so a chatty checker can't fill the
/// pipe and stall while we wait on it. The exit status is reported, not
/// judged; callers decide with [`CheckerOutput::ensure_success`].
pub fn run_checker<P>(path: P, limit: Option<Duration>) -> Result<CheckerOutput, CheckerError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref().to_path_buf();

    let mut cmd = Command::new(&path);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    // Grandchildren keep the stdout pipe open, so a timed-out run has to
    // take down the whole group or the reader never sees EOF.
    if limit.is_some() {
        cmd.process_group(0);
    }

    let mut child = cmd
        .spawn()
        .map_err(|source| CheckerError::Launch {
            path: path.clone(),
            source,
        })?;

    let io_err = |source| CheckerError::Io {
        path: path.clone(),
        source,
    };

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| io_err(io::Error::other("stdout was not captured")))?;

    let reader = thread::spawn(move || -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf)?;
        Ok(buf)
    });

    let result = wait_for(&mut child, limit).map_err(io_err)?;

    let bytes = reader
        .join()
        .map_err(|_| io_err(io::Error::other("stdout reader panicked")))?
        .map_err(io_err)?;

    Ok(CheckerOutput {
        path,
        lines: split_lines(&bytes),
        result,
    })
}
