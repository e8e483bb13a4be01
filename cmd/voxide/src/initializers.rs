//! Process startup: tracing, configuration and world construction.

use voxide_engine::World;
use voxide_script::NativeHost;

use crate::cli::Cli;

/// Install the tracing subscriber. Logs go to stderr so protocol output on
/// stdout stays machine-readable; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("{0}")]
    Config(#[from] voxide_script::ConfigError),

    #[error("{0}")]
    Engine(#[from] voxide_engine::EngineError),
}

/// Load the configuration file and build the world around it.
pub fn init_world(cli: &Cli) -> Result<(World, NativeHost), StartupError> {
    let (registry, host) = voxide_script::load_path(&cli.config)?;
    let world = World::new(registry, cli.size)?;
    tracing::info!(
        config = %cli.config.display(),
        size = cli.size,
        "world initialised"
    );
    Ok((world, host))
}
