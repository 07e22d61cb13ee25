//! Integration tests for SIGHUP reload of the real binary
//!
//! The collector runs in the foreground so the test owns the process.
//! Reload must keep the same pid, serve again, and still stop on SIGTERM.

#[cfg(test)]
mod reload_tests {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    use std::path::Path;
    use std::process::{Child, Command, ExitStatus, Stdio};
    use std::time::{Duration, Instant};

    const STARTED: &str = "Starting ipbeacon";

    fn free_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn starts_logged(log_path: &Path) -> usize {
        std::fs::read_to_string(log_path)
            .map(|log| log.matches(STARTED).count())
            .unwrap_or(0)
    }

    fn wait_until(what: &str, mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !done() {
            assert!(Instant::now() < deadline, "timed out waiting for {}", what);
            std::thread::sleep(Duration::from_millis(25));
        }
    }

    fn wait_for_exit(child: &mut Child) -> ExitStatus {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(status) = child.try_wait().unwrap() {
                return status;
            }
            if Instant::now() >= deadline {
                child.kill().ok();
                panic!("process ignored SIGTERM");
            }
            std::thread::sleep(Duration::from_millis(25));
        }
    }

    #[test]
    fn test_hangup_restarts_in_place_and_terminate_still_stops() {
        let dir = tempfile::tempdir().unwrap();
        let pid_path = dir.path().join("ipbeacon.pid");
        let log_path = dir.path().join("ipbeacon.log");
        let port = free_port();

        let mut child = Command::new(env!("CARGO_BIN_EXE_ipbeacon"))
            .args(["-m", "server", "-h", "127.0.0.1", "-p", &port.to_string()])
            .arg("-P")
            .arg(&pid_path)
            .arg("-L")
            .arg(&log_path)
            .arg("--foreground")
            .env_remove("RUST_LOG")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();
        let pid = Pid::from_raw(child.id() as i32);
        let serving = || std::net::TcpStream::connect(("127.0.0.1", port)).is_ok();

        wait_until("first start", || starts_logged(&log_path) == 1 && serving());

        kill(pid, Signal::SIGHUP).unwrap();
        wait_until("restart", || starts_logged(&log_path) == 2 && serving());

        // Same process, same pid file owner
        let recorded = std::fs::read_to_string(&pid_path).unwrap();
        assert_eq!(recorded.trim(), child.id().to_string());

        kill(pid, Signal::SIGTERM).unwrap();
        let status = wait_for_exit(&mut child);

        assert!(status.success());
        assert!(!pid_path.exists());
    }
}
