//! OS signals that stop or reload the running role

use tokio::signal::unix::{signal, Signal, SignalKind};

/// Signal that asked the process to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Terminate,
    Interrupt,
    Quit,
    /// SIGHUP: stop, then start again with the same arguments
    Hangup,
}

impl Trigger {
    pub fn is_reload(self) -> bool {
        self == Trigger::Hangup
    }

    pub fn name(self) -> &'static str {
        match self {
            Trigger::Terminate => "SIGTERM",
            Trigger::Interrupt => "SIGINT",
            Trigger::Quit => "SIGQUIT",
            Trigger::Hangup => "SIGHUP",
        }
    }
}

/// Registered handlers for every signal the driver reacts to
pub struct Signals {
    terminate: Signal,
    interrupt: Signal,
    quit: Signal,
    hangup: Signal,
}

impl Signals {
    /// Install the handlers. Must be called inside a tokio runtime.
    pub fn register() -> std::io::Result<Self> {
        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
            quit: signal(SignalKind::quit())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    /// Wait for the first of the registered signals
    pub async fn recv(mut self) -> Trigger {
        let trigger = tokio::select! {
            _ = self.terminate.recv() => Trigger::Terminate,
            _ = self.interrupt.recv() => Trigger::Interrupt,
            _ = self.quit.recv() => Trigger::Quit,
            _ = self.hangup.recv() => Trigger::Hangup,
        };

        log::info!(
            "signal received {}, at: {}",
            trigger.name(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        trigger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_hangup_reloads() {
        assert!(Trigger::Hangup.is_reload());
        assert!(!Trigger::Terminate.is_reload());
        assert!(!Trigger::Interrupt.is_reload());
        assert!(!Trigger::Quit.is_reload());
    }

    #[tokio::test]
    async fn test_hangup_is_delivered() {
        let signals = Signals::register().unwrap();
        let waiter = tokio::spawn(signals.recv());

        nix::sys::signal::raise(nix::sys::signal::Signal::SIGHUP).unwrap();

        let trigger = tokio::time::timeout(std::time::Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(trigger, Trigger::Hangup);
    }
}
