//! Tracing setup for binaries and tests

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber honouring `RUST_LOG`, with `default_level` as the
/// baseline directive. Later calls are no-ops.
pub fn init_tracing(default_level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing(Level::WARN);
        init_tracing(Level::DEBUG);
        tracing::warn!("still logging");
    }
}
