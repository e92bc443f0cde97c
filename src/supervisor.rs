//! Child process supervision: restore once, launch the child, then snapshot
//! on each cycle until the child exits. The child is never restarted; a
//! single exit is terminal for the whole agent.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Config;
use crate::remote::RemoteStore;
use crate::snapshot::SnapshotManager;

/// Fixed child invocation: server mode with the output prefix suppressed.
pub const CHILD_BIN: &str = "./core-service";
pub const CHILD_ARGS: &[&str] = &["server", "--no-prefix"];

pub struct Supervisor {
    config: Config,
    store: Option<RemoteStore>,
    manager: SnapshotManager,
    program: PathBuf,
    args: Vec<String>,
}

impl Supervisor {
    pub fn new(config: Config, store: Option<RemoteStore>) -> Self {
        let args = CHILD_ARGS.iter().map(|a| a.to_string()).collect();
        Self::with_command(config, store, PathBuf::from(CHILD_BIN), args)
    }

    /// Supervise an arbitrary command instead of the fixed child binary.
    pub fn with_command(
        config: Config,
        store: Option<RemoteStore>,
        program: PathBuf,
        args: Vec<String>,
    ) -> Self {
        let manager = SnapshotManager::new(config.workspace_dir.clone());
        Self {
            config,
            store,
            manager,
            program,
            args,
        }
    }

    /// Run the supervision loop to completion, returning the child's exit
    /// status. Snapshot failures are logged and skipped; only child exit (or
    /// a failed liveness check) ends the loop.
    pub async fn run(&mut self) -> io::Result<ExitStatus> {
        if let Some(store) = &self.store {
            store.ensure_reachable().await;
            if let Err(err) = self.manager.restore(store).await {
                // Startup continues without restored state.
                warn!(error = %err, "restore failed");
            }
        } else {
            info!("no remote store configured, running standalone");
        }

        let mut child = self.spawn_child()?;
        info!(pid = child.id(), program = %self.program.display(), "child started");

        loop {
            sleep(self.config.cycle).await;

            // Liveness is polled at cycle granularity; a crash mid-sleep is
            // seen here, before any further snapshot work.
            if let Some(status) = child.try_wait()? {
                info!(%status, "child exited, shutting down");
                return Ok(status);
            }

            if let Some(store) = &self.store {
                match self.manager.create(store).await {
                    Ok(outcome) => info!(?outcome, "snapshot cycle complete"),
                    // A missed snapshot is recoverable; a dead supervisor is not.
                    Err(err) => warn!(error = %err, "snapshot cycle failed, skipping"),
                }
            }
        }
    }

    fn spawn_child(&self) -> io::Result<Child> {
        Command::new(&self.program).args(&self.args).spawn()
    }
}
