use env_logger::Env;

/// Initialise the global logger. `RUST_LOG` overrides the default `info` level.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
