//! Shared run / shutdown / completion contract
//!
//! Both roles start their background work from [`Role::run`], return
//! immediately, and publish a single [`LifecycleToken`] on the completion
//! channel once they have wound down. The driver blocks on that channel.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Published once by a role when it has finished shutting down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleToken {
    pub role: &'static str,
}

pub type CompletionSender = mpsc::Sender<LifecycleToken>;
pub type CompletionReceiver = mpsc::Receiver<LifecycleToken>;

/// Completion channel shared between a role and its driver
pub fn completion_channel() -> (CompletionSender, CompletionReceiver) {
    mpsc::channel(1)
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{role} failed to start: {source}")]
    Start {
        role: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{0} stopped without publishing a completion token")]
    ChannelClosed(&'static str),
}

/// A runnable role (collector or reporter)
#[async_trait]
pub trait Role: Send + Sync {
    /// Short name used in logs and in the completion token
    fn name(&self) -> &'static str;

    /// Start background work and return once it is running
    ///
    /// Setup failures (e.g. bind) are returned here; afterwards the role
    /// reports only through `completion`.
    async fn run(&self, completion: CompletionSender) -> Result<(), LifecycleError>;

    /// Ask the role to stop. Safe to call more than once.
    fn shutdown(&self);
}

/// What ended a supervised run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exit<T> {
    pub token: LifecycleToken,
    /// The trigger that requested shutdown, `None` if the role stopped by itself
    pub trigger: Option<T>,
}

/// Run `role` until `trigger` fires, then shut it down and wait for completion
///
/// Blocks until the role publishes its token; there is no timeout here,
/// roles are responsible for bounding their own teardown.
pub async fn supervise<R, F, T>(role: Arc<R>, trigger: F) -> Result<Exit<T>, LifecycleError>
where
    R: Role + ?Sized + 'static,
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, mut rx) = completion_channel();

    role.run(tx).await?;
    log::info!("{} running", role.name());

    // Filled in before shutdown() so it is visible once the token arrives
    let fired: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));

    let watcher_role = Arc::clone(&role);
    let watcher_fired = Arc::clone(&fired);
    let watcher = tokio::spawn(async move {
        let trigger = trigger.await;
        *watcher_fired.lock() = Some(trigger);
        watcher_role.shutdown();
    });

    let received = rx.recv().await;
    watcher.abort();
    let token = received.ok_or(LifecycleError::ChannelClosed(role.name()))?;
    let trigger = fired.lock().take();

    log::info!("{} finished", token.role);
    Ok(Exit { token, trigger })
}
