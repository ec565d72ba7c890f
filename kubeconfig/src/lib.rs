pub mod config;
pub mod token;

pub use config::{write_config, ClusterSpec, ContextSpec, KubeConfig, UserSpec};
pub use token::{resolve_token_path, write_token};
