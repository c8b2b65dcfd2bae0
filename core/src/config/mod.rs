mod load;
mod types;

pub use load::{
    apply_env_overrides_from, load_from_root, parse_config, CONCURRENCY_ENV, CONFIG_FILE_NAME,
    LOG_LEVEL_ENV,
};
pub use types::{AppConfig, ExecConfig, LoggingConfig, WorkspaceConfig};
