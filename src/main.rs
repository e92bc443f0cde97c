use anyhow::Result;
use statekeeper::{Config, RemoteStore, Supervisor};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    let store = match &config.remote {
        Some(remote) => Some(RemoteStore::connect(remote)?),
        None => None,
    };

    let mut supervisor = Supervisor::new(config, store);
    let status = supervisor.run().await?;

    // Mirror the child's exit code; signal death maps to 1.
    std::process::exit(status.code().unwrap_or(1));
}
