// Package shutdown provides the SIGTERM termination handler.

use futures::future::BoxFuture;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};


/// Cleanup run once between the termination signal and the grace sleep.
pub type Continuation = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Lifecycle of the termination handler. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    SignalReceived,
    Draining,
    Terminated,
}

/// Waits for SIGTERM, runs the optional continuation, sleeps the grace
/// period and exits the process with code 0.
pub struct TerminationHandler {
    grace: Duration,
    continuation: Option<Continuation>,
    state: watch::Sender<ShutdownState>,
}

impl TerminationHandler {
    pub fn new(grace: Duration) -> Self {
        let (state, _) = watch::channel(ShutdownState::Running);
        Self {
            grace,
            continuation: None,
            state,
        }
    }

    /// Registers the cleanup to run once the signal arrives.
    pub fn with_continuation<F, Fut>(mut self, continuation: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.continuation = Some(Box::new(move || Box::pin(continuation())));
        self
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Observes the handler state.
    pub fn subscribe(&self) -> watch::Receiver<ShutdownState> {
        self.state.subscribe()
    }

    /// Installs the signal handlers and starts the background task that
    /// terminates the process once SIGTERM arrives.
    ///
    /// Must be called from within a tokio runtime. SIGINT, SIGQUIT and
    /// SIGCONT are swallowed from here on.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        info!(
            component = "termination-handler",
            event = "installed",
            pid = std::process::id(),
            "setting termination handler for process"
        );

        let terminate = signals::install()?;
        Ok(tokio::task::spawn(async move {
            self.drain(terminate).await;
            info!(
                component = "termination-handler",
                event = "exit",
                "exiting"
            );
            std::process::exit(0);
        }))
    }

    /// Runs the shutdown sequence once `signal` resolves. Returns after the
    /// grace period instead of exiting.
    pub async fn drain<S>(self, signal: S)
    where
        S: Future<Output = ()>,
    {
        signal.await;
        self.state.send_replace(ShutdownState::SignalReceived);
        info!(
            component = "termination-handler",
            event = "os_signal",
            signal = "SIGTERM",
            "termination received"
        );

        self.state.send_replace(ShutdownState::Draining);
        if let Some(continuation) = self.continuation {
            debug!(
                component = "termination-handler",
                event = "continuation_started",
                "running termination continuation"
            );
            continuation().await;
        }

        info!(
            component = "termination-handler",
            event = "grace_wait",
            grace = %humantime::format_duration(self.grace),
            "waiting before exit"
        );
        tokio::time::sleep(self.grace).await;
        self.state.send_replace(ShutdownState::Terminated);
    }
}

#[cfg(unix)]
mod signals {
    use std::future::Future;
    use std::io;
    use tokio::signal::unix::{signal, SignalKind};
    use tracing::debug;

    /// Swallows interrupt, quit and continue, and returns a future that
    /// resolves on the first SIGTERM.
    pub(super) fn install() -> io::Result<impl Future<Output = ()> + Send + 'static> {
        for (kind, name) in [
            (SignalKind::interrupt(), "SIGINT"),
            (SignalKind::quit(), "SIGQUIT"),
            (SignalKind::from_raw(libc::SIGCONT), "SIGCONT"),
        ] {
            let mut stream = signal(kind)?;
            tokio::task::spawn(async move {
                while stream.recv().await.is_some() {
                    debug!(
                        component = "termination-handler",
                        event = "signal_ignored",
                        signal = name,
                        "signal ignored"
                    );
                }
            });
        }

        let mut terminate = signal(SignalKind::terminate())?;
        Ok(async move {
            terminate.recv().await;
        })
    }
}

// Windows has no SIGTERM; a console shutdown event plays its part and
// Ctrl-C is swallowed like SIGINT.
#[cfg(windows)]
mod signals {
    use std::future::Future;
    use std::io;
    use tokio::signal::windows;
    use tracing::debug;

    pub(super) fn install() -> io::Result<impl Future<Output = ()> + Send + 'static> {
        let mut interrupt = windows::ctrl_c()?;
        tokio::task::spawn(async move {
            while interrupt.recv().await.is_some() {
                debug!(
                    component = "termination-handler",
                    event = "signal_ignored",
                    signal = "CTRL_C",
                    "signal ignored"
                );
            }
        });

        let mut shutdown = windows::ctrl_shutdown()?;
        Ok(async move {
            shutdown.recv().await;
        })
    }
}

// No termination signal to wait for; the handler never fires.
#[cfg(not(any(unix, windows)))]
mod signals {
    use std::future::Future;
    use std::io;

    pub(super) fn install() -> io::Result<impl Future<Output = ()> + Send + 'static> {
        Ok(std::future::pending())
    }
}
