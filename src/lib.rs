pub mod db;
pub mod error;
pub mod migrations;
pub mod notification;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod templates;
pub mod transcription;
pub mod types;
pub mod util;

pub use error::AppError;
pub use state::AppState;

/// Install the global logger: `debug` in debug builds, `info` in release,
/// overridable with `RUST_LOG`.
pub fn init_logging() {
    let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(default_level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
