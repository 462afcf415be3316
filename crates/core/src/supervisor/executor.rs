//! Subprocess spawning and output capture for the supervisor.
//!
//! On Unix the child's stdout and stderr share one pipe, so lines reach the
//! reader in the order the tool wrote them. Bytes that are not valid UTF-8
//! are decoded lossily so a stray byte never ends a run's output.

use crate::command::CommandLine;
use std::io;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::Stream;

/// Line stream of a running child.
pub(crate) type OutputLines = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Signals the supervisor can deliver to a running child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Signal {
    /// Ask the tool to shut down (SIGTERM on Unix).
    Terminate,
    /// Kill the tool unconditionally.
    Kill,
}

/// A child process together with its combined output.
pub(crate) struct Spawned {
    pub child: Child,
    pub output: OutputLines,
}

/// Spawn the command with stdin closed and stdout and stderr merged.
///
/// On Unix the child leads a new process group so that signals reach the
/// interpreter and anything it spawned.
///
/// Must be called from within a Tokio runtime.
pub(crate) fn spawn(command: &CommandLine) -> io::Result<Spawned> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args);
    cmd.current_dir(&command.working_dir);
    cmd.stdin(Stdio::null());
    cmd.kill_on_drop(true);

    #[cfg(unix)]
    {
        cmd.process_group(0);

        let (reader, writer) = os_pipe::pipe()?;
        cmd.stdout(writer.try_clone()?);
        cmd.stderr(writer);
        let child = cmd.spawn()?;
        // The command still holds both write ends; the reader only sees EOF
        // once every copy outside the child is closed.
        drop(cmd);

        let receiver = tokio::net::unix::pipe::Receiver::from_owned_fd(reader.into())?;
        Ok(Spawned {
            child,
            output: Box::pin(read_lines(receiver)),
        })
    }

    #[cfg(not(unix))]
    {
        use tokio_stream::StreamExt;

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take().map(read_lines);
        let stderr = child.stderr.take().map(read_lines);
        let output: OutputLines = match (stdout, stderr) {
            (Some(out), Some(err)) => Box::pin(out.merge(err)),
            (Some(out), None) => Box::pin(out),
            (None, Some(err)) => Box::pin(err),
            (None, None) => Box::pin(tokio_stream::empty()),
        };
        Ok(Spawned { child, output })
    }
}

/// Split `reader` into lines, dropping `\n` and `\r\n` terminators.
pub(crate) fn read_lines<R>(reader: R) -> impl Stream<Item = String> + Send
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async_stream::stream! {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                    }
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                    yield String::from_utf8_lossy(&buf).into_owned();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read process output");
                    break;
                }
            }
        }
    }
}

/// Wait for the child to exit while delivering signals sent to it.
pub(crate) async fn wait_for_exit(
    mut child: Child,
    mut signals: UnboundedReceiver<Signal>,
) -> io::Result<ExitStatus> {
    let pid = child.id();
    loop {
        tokio::select! {
            status = child.wait() => return status,
            Some(signal) = signals.recv() => deliver(&mut child, pid, signal),
        }
    }
}

#[cfg(unix)]
fn deliver(child: &mut Child, pid: Option<u32>, signal: Signal) {
    let Some(pid) = pid.and_then(|p| libc::pid_t::try_from(p).ok()) else {
        let _ = child.start_kill();
        return;
    };
    let signo = match signal {
        Signal::Terminate => libc::SIGTERM,
        Signal::Kill => libc::SIGKILL,
    };
    // The child was spawned as a group leader, so its pid is the group id.
    // SAFETY: killpg has no memory-safety preconditions.
    let rc = unsafe { libc::killpg(pid, signo) };
    if rc != 0 {
        tracing::debug!(pid, signo, error = %io::Error::last_os_error(), "killpg failed");
    }
    if signal == Signal::Kill {
        let _ = child.start_kill();
    }
}

#[cfg(not(unix))]
fn deliver(child: &mut Child, _pid: Option<u32>, _signal: Signal) {
    // No graceful termination request without process groups; both
    // signals end the process.
    let _ = child.start_kill();
}
