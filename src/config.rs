use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Directory under the working directory holding the child's persistent state.
pub const WORKSPACE_DIRNAME: &str = "data";

/// Remote sub-path holding snapshots when `REMOTE_DIR` is unset.
pub const DEFAULT_REMOTE_DIR: &str = "storage";

/// Seconds between snapshot attempts when `CYCLE_PERIOD` is unset.
pub const DEFAULT_CYCLE_SECS: u64 = 600;

/// Connection settings for the remote snapshot store.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base address of the store.
    pub url: String,
    /// Identity for basic authentication.
    pub user: String,
    /// Secret paired with the identity.
    pub password: String,
    /// Sub-path under the endpoint used as the snapshot container.
    pub dir: String,
}

/// Agent configuration, read once from the environment at startup and passed
/// into each component. No component reads ambient state after this.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the child's persistent state.
    pub workspace_dir: PathBuf,
    /// Interval between snapshot attempts.
    pub cycle: Duration,
    /// Remote store settings; `None` means standalone mode.
    pub remote: Option<RemoteConfig>,
}

impl Config {
    /// Build the configuration from `REMOTE_URL`, `REMOTE_USER`, `REMOTE_PASS`,
    /// `REMOTE_DIR` and `CYCLE_PERIOD`.
    pub fn from_env() -> Self {
        let workspace_dir = env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(WORKSPACE_DIRNAME);

        Self {
            workspace_dir,
            cycle: parse_cycle(env::var("CYCLE_PERIOD").ok()),
            remote: remote_config(
                env::var("REMOTE_URL").ok(),
                env::var("REMOTE_USER").ok(),
                env::var("REMOTE_PASS").ok(),
                env::var("REMOTE_DIR").ok(),
            ),
        }
    }
}

fn parse_cycle(raw: Option<String>) -> Duration {
    let Some(raw) = raw else {
        return Duration::from_secs(DEFAULT_CYCLE_SECS);
    };
    match raw.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => {
            warn!(value = %raw, "invalid CYCLE_PERIOD, using default");
            Duration::from_secs(DEFAULT_CYCLE_SECS)
        }
    }
}

/// A remote capability exists only when both the endpoint and the identity are
/// configured; anything less is standalone mode, not an error.
fn remote_config(
    url: Option<String>,
    user: Option<String>,
    password: Option<String>,
    dir: Option<String>,
) -> Option<RemoteConfig> {
    let url = url.filter(|v| !v.is_empty())?;
    let user = user.filter(|v| !v.is_empty())?;
    Some(RemoteConfig {
        url,
        user,
        password: password.unwrap_or_default(),
        dir: dir
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_REMOTE_DIR.to_string()),
    })
}
