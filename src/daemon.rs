//! Detaching from the terminal and re-executing on reload

use nix::libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::{dup2, fork, setsid, ForkResult};
use std::fs::OpenOptions;
use std::os::fd::AsRawFd;
use std::os::unix::process::CommandExt;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("fork failed: {0}")]
    Fork(#[source] nix::Error),

    #[error("setsid failed: {0}")]
    Setsid(#[source] nix::Error),

    #[error("failed to open /dev/null: {0}")]
    DevNull(#[source] std::io::Error),

    #[error("failed to redirect stdio: {0}")]
    Redirect(#[source] nix::Error),
}

/// Fork into the background and point stdio at `/dev/null`. The parent
/// exits with status 0.
///
/// The working directory is kept so relative log and pid paths stay valid.
/// Must run before any other thread is started, in particular before the
/// tokio runtime is built.
pub fn daemonize() -> Result<(), DaemonError> {
    // SAFETY: the process is still single threaded at this point
    let forked = unsafe { fork() };
    match forked.map_err(DaemonError::Fork)? {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => {}
    }

    setsid().map_err(DaemonError::Setsid)?;

    let dev_null = OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")
        .map_err(DaemonError::DevNull)?;
    for fd in [STDIN_FILENO, STDOUT_FILENO, STDERR_FILENO] {
        dup2(dev_null.as_raw_fd(), fd).map_err(DaemonError::Redirect)?;
    }

    Ok(())
}

/// Command that starts this binary again with its original arguments
pub fn restart_command() -> std::io::Result<Command> {
    let exe = std::env::current_exe()?;
    let mut command = Command::new(exe);
    command.args(std::env::args_os().skip(1));
    Ok(command)
}

/// Replace this process with a fresh copy of itself
///
/// Only returns on failure. The pid is kept and signal handlers are reset by
/// `exec`, so the new image behaves the same in foreground and daemon mode.
/// Listeners and pid files must be released before calling this.
pub fn reexec() -> std::io::Error {
    match restart_command() {
        Ok(mut command) => command.exec(),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_command_reuses_binary_and_arguments() {
        let command = restart_command().unwrap();

        assert_eq!(command.get_program(), std::env::current_exe().unwrap().as_os_str());
        let args: Vec<_> = command.get_args().map(|arg| arg.to_os_string()).collect();
        let expected: Vec<_> = std::env::args_os().skip(1).collect();
        assert_eq!(args, expected);
    }

    #[test]
    fn test_failed_exec_returns_error() {
        let mut command = Command::new("/nonexistent/ipbeacon");
        let err = command.exec();

        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
