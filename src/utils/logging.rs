use crate::models::Config;

/// Initialize the global logger at the configured verbosity.
///
/// `RUST_LOG` still overrides the level. Calling this twice is harmless.
pub fn init_logging(config: &Config) {
    let _ = env_logger::Builder::new()
        .filter_level(config.verbosity.level())
        .format_timestamp(None)
        .format_target(false)
        .parse_default_env()
        .try_init();
}
