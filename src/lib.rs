pub mod archive;
pub mod config;
pub mod remote;
pub mod snapshot;
pub mod supervisor;

pub use config::{Config, RemoteConfig};
pub use remote::{RemoteError, RemoteStore};
pub use snapshot::{CreateOutcome, RestoreOutcome, SnapshotError, SnapshotManager};
pub use supervisor::Supervisor;
