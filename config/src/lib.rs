//! # Layered Configuration
//!
//! Reads configuration from five precedence layers and merges them into one
//! immutable tree that remembers where every value came from.
//!
//! This crate provides:
//! - Per-platform discovery of app, host and user configuration files
//! - TOML, JSON and YAML file loading
//! - `.env` and prefixed environment variable layers
//! - A pure merge with per-key provenance
//! - A read-only [`Config`] value with dotted-path access
//! - Deployment and example scaffolding helpers
//!
//! # Precedence (lowest to highest)
//! `app` → `host` → `user` → `dotenv` → `env`
//!
//! # Example
//!
//! ```rust,no_run
//! use config::ConfigReader;
//!
//! let config = ConfigReader::new("Acme", "Demo", "demo").read()?;
//! let timeout = config.get("service.timeout", 30);
//! if let Some(origin) = config.origin("service.timeout") {
//!     println!("timeout={timeout} from {}", origin.layer);
//! }
//! # Ok::<(), errors::ConfigError>(())
//! ```

pub mod config;
pub mod deploy;
pub mod dotenv;
pub mod file_loader;
pub mod loader;
pub mod observability;
pub mod path_resolver;
pub mod ports;
pub mod precedence;
pub mod reader;
pub mod scaffold;
pub mod value;

pub use config::Config;
pub use deploy::{DeployTarget, deploy_config, deploy_with_resolver};
pub use dotenv::DefaultDotEnvLoader;
pub use errors::{ConfigError, ConfigResult};
pub use file_loader::{FileFormat, JsonFileLoader, TomlFileLoader, YamlFileLoader};
pub use loader::{DefaultEnvLoader, default_env_prefix};
pub use observability::TraceContext;
pub use path_resolver::{DefaultPathResolver, Platform, default_platform_identifier};
pub use ports::{DotEnvLoader, DotenvFile, EnvLoader, FileLoader, PathResolver};
pub use precedence::{MergedLayers, merge_layers};
pub use reader::{ConfigReader, read_config, read_config_raw};
pub use scaffold::{ExampleLayout, generate_examples};
pub use value::{LayerName, LayerPayload, Mapping, Provenance, SourceInfo};
