//! Deferred shutdown / restart.
//!
//! One slot: a request arms a timer task that waits out the grace period and
//! then runs the executor on the blocking pool. While an action is pending
//! further requests are refused.

use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

const WINDOWS_SHUTDOWN: &[&str] = &["/s", "/f", "/t", "1"];
const WINDOWS_RESTART: &[&str] = &["/r", "/f", "/t", "1"];
const UNIX_SHUTDOWN: &[&str] = &["-h", "now"];
const UNIX_RESTART: &[&str] = &[];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Shutdown,
    Restart,
}

impl PowerAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shutdown => "shutdown",
            Self::Restart => "restart",
        }
    }

    /// Program and arguments for the current platform, or `None` if unsupported.
    pub fn command(self) -> Option<(&'static str, &'static [&'static str])> {
        if cfg!(windows) {
            Some(match self {
                Self::Shutdown => ("shutdown", WINDOWS_SHUTDOWN),
                Self::Restart => ("shutdown", WINDOWS_RESTART),
            })
        } else if cfg!(unix) {
            Some(match self {
                Self::Shutdown => ("shutdown", UNIX_SHUTDOWN),
                Self::Restart => ("reboot", UNIX_RESTART),
            })
        } else {
            None
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PowerError {
    #[error("a {0} is already scheduled")]
    AlreadyPending(&'static str),
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}")]
    ExitStatus {
        program: &'static str,
        status: std::process::ExitStatus,
    },
}

/// Performs the OS-level action. Called from a blocking thread.
pub trait PowerExecutor: Send + Sync + 'static {
    fn execute(&self, action: PowerAction) -> Result<(), PowerError>;
}

/// Runs the platform shutdown/reboot command. In dry-run mode it only logs.
#[derive(Debug, Clone, Default)]
pub struct SystemPowerExecutor {
    dry_run: bool,
}

impl SystemPowerExecutor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

impl PowerExecutor for SystemPowerExecutor {
    fn execute(&self, action: PowerAction) -> Result<(), PowerError> {
        let (program, args) = action
            .command()
            .ok_or(PowerError::Unsupported(action.as_str()))?;
        if self.dry_run {
            tracing::warn!(action = action.as_str(), "[dry-run] would run: {program} {}", args.join(" "));
            return Ok(());
        }

        tracing::warn!(action = action.as_str(), "Executing: {program} {}", args.join(" "));
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|source| PowerError::Spawn { program, source })?;
        if !status.success() {
            return Err(PowerError::ExitStatus { program, status });
        }
        Ok(())
    }
}

pub struct PowerScheduler {
    executor: Arc<dyn PowerExecutor>,
    grace: Duration,
    pending: Option<(PowerAction, JoinHandle<()>)>,
}

impl PowerScheduler {
    pub fn new(executor: Arc<dyn PowerExecutor>, grace: Duration) -> Self {
        Self {
            executor,
            grace,
            pending: None,
        }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// The action currently waiting out its grace period, if any.
    pub fn pending(&self) -> Option<PowerAction> {
        match &self.pending {
            Some((action, handle)) if !handle.is_finished() => Some(*action),
            _ => None,
        }
    }

    /// Arm `action`. Never blocks; the action runs after the grace period.
    pub fn request(&mut self, action: PowerAction) -> Result<(), PowerError> {
        if let Some(pending) = self.pending() {
            return Err(PowerError::AlreadyPending(pending.as_str()));
        }

        let executor = Arc::clone(&self.executor);
        let grace = self.grace;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let result = tokio::task::spawn_blocking(move || executor.execute(action)).await;
            match result {
                Ok(Ok(())) => tracing::info!(action = action.as_str(), "Power action issued"),
                Ok(Err(e)) => tracing::error!(action = action.as_str(), "Power action failed: {e}"),
                Err(e) => tracing::error!(action = action.as_str(), "Power action task failed: {e}"),
            }
        });
        tracing::warn!(
            action = action.as_str(),
            grace_secs = grace.as_secs(),
            "Power action scheduled"
        );
        self.pending = Some((action, handle));
        Ok(())
    }

    /// Abort a pending action that has not started yet.
    pub fn cancel(&mut self) -> Option<PowerAction> {
        let (action, handle) = self.pending.take()?;
        if handle.is_finished() {
            return None;
        }
        handle.abort();
        tracing::info!(action = action.as_str(), "Pending power action cancelled");
        Some(action)
    }
}
