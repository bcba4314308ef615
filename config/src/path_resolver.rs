//! # Path Resolver
//!
//! Enumerates candidate configuration files per layer for Linux, macOS and
//! Windows layouts.
//!
//! # Layouts
//! | layer | Linux | macOS | Windows |
//! |-------|-------|-------|---------|
//! | app   | `/etc/<slug>` | `/Library/Application Support/<vendor>/<app>` | `%ProgramData%\<vendor>\<app>` |
//! | host  | `/etc/<slug>/hosts/<hostname>.toml` | `<app root>/hosts/<hostname>.toml` | `<app root>\hosts\<hostname>.toml` |
//! | user  | `$XDG_CONFIG_HOME/<slug>` or `~/.config/<slug>` | `~/Library/Application Support/<vendor>/<app>` | `%APPDATA%\<vendor>\<app>` (falls back to `%LOCALAPPDATA%`) |
//!
//! Every root can be redirected through the `LAYERED_CONFIG_*` environment
//! variables below, which is how tests and deployments keep discovery away
//! from the real system directories.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use errors::{ConfigError, ConfigResult};
use tracing::{debug, trace};

use crate::file_loader::FileFormat;
use crate::ports::PathResolver;
use crate::value::LayerName;

/// Linux app/host root (default `/etc`).
pub const ENV_ETC_ROOT: &str = "LAYERED_CONFIG_ETC";
/// macOS app/host root (default `/Library/Application Support`).
pub const ENV_MAC_APP_ROOT: &str = "LAYERED_CONFIG_MAC_APP_ROOT";
/// macOS user root (default `~/Library/Application Support`).
pub const ENV_MAC_HOME_ROOT: &str = "LAYERED_CONFIG_MAC_HOME_ROOT";
/// Windows app/host root (default `%ProgramData%`).
pub const ENV_PROGRAMDATA: &str = "LAYERED_CONFIG_PROGRAMDATA";
/// Windows user root (default `%APPDATA%`).
pub const ENV_APPDATA: &str = "LAYERED_CONFIG_APPDATA";
/// Windows user fallback root (default `%LOCALAPPDATA%`).
pub const ENV_LOCALAPPDATA: &str = "LAYERED_CONFIG_LOCALAPPDATA";
/// Hostname used for the host layer.
pub const ENV_HOSTNAME: &str = "LAYERED_CONFIG_HOSTNAME";

const CONFIG_FILE: &str = "config.toml";
const CONFIG_DIR: &str = "config.d";
const HOSTS_DIR: &str = "hosts";
const DOTENV_FILE: &str = ".env";

/// Platform family selecting a directory layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    /// No layout; every layer resolves to no candidates.
    Unknown
}

impl Platform {
    /// Family for a platform identifier: `linux*`, `darwin`/`macos`, `win*`.
    pub fn from_identifier(identifier: &str) -> Self {
        let identifier = identifier.to_ascii_lowercase();
        if identifier.starts_with("linux") {
            Self::Linux
        } else if identifier == "darwin" || identifier == "macos" {
            Self::MacOs
        } else if identifier.starts_with("win") {
            Self::Windows
        } else {
            Self::Unknown
        }
    }

    pub fn current() -> Self {
        Self::from_identifier(default_platform_identifier())
    }
}

/// Identifier of the running platform (`linux`, `darwin`, `win32`, ...).
pub fn default_platform_identifier() -> &'static str {
    match env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other
    }
}

/// Filesystem-backed resolver over a snapshot of the environment.
///
/// # Example
///
/// ```rust,no_run
/// use config::{DefaultPathResolver, PathResolver};
///
/// let resolver = DefaultPathResolver::new("Acme", "Demo", "demo")
///     .with_platform("linux")
///     .with_env([("LAYERED_CONFIG_ETC", "/srv/etc")]);
///
/// for path in resolver.app()? {
///     println!("{}", path.display());
/// }
/// # Ok::<(), errors::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DefaultPathResolver {
    vendor: String,
    app: String,
    slug: String,

    /// Directory the `.env` walk starts from.
    cwd: PathBuf,

    /// Process environment snapshot merged with caller overrides.
    environ: HashMap<String, String>,

    platform: Platform,

    /// Explicit hostname; detected lazily when unset.
    hostname: Option<String>
}

impl DefaultPathResolver {
    /// Resolver for the current directory, process environment and platform.
    #[must_use]
    pub fn new(vendor: impl Into<String>, app: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            app: app.into(),
            slug: slug.into(),
            cwd: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            environ: env::vars_os()
                .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
                .collect(),
            platform: Platform::current(),
            hostname: None
        }
    }

    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Override individual environment entries on top of the snapshot.
    #[must_use]
    pub fn with_env<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>
    {
        self.environ
            .extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Replace the whole environment snapshot.
    #[must_use]
    pub fn with_environ<I, K, V>(mut self, environ: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>
    {
        self.environ = environ
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Select the layout from a platform identifier (`linux`, `darwin`, `win32`).
    #[must_use]
    pub fn with_platform(mut self, identifier: &str) -> Self {
        self.platform = Platform::from_identifier(identifier);
        self
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn environ(&self) -> &HashMap<String, String> {
        &self.environ
    }

    /// Hostname for the host layer: explicit value, `LAYERED_CONFIG_HOSTNAME`,
    /// the system hostname, then `localhost`.
    pub fn hostname(&self) -> String {
        if let Some(hostname) = &self.hostname {
            return hostname.clone();
        }
        self.var(ENV_HOSTNAME)
            .map(str::to_string)
            .or_else(system_hostname)
            .unwrap_or_else(|| "localhost".to_string())
    }

    /// Directory holding the app layer (`config.toml`, `config.d/`, `hosts/`).
    pub fn app_root(&self) -> Option<PathBuf> {
        match self.platform {
            Platform::Linux => Some(self.etc_root().join(&self.slug)),
            Platform::MacOs => Some(self.vendor_dir(&self.mac_app_root())),
            Platform::Windows => Some(self.vendor_dir(&self.program_data_root())),
            Platform::Unknown => None
        }
    }

    /// Directory holding the user layer.
    pub fn user_root(&self) -> Option<PathBuf> {
        match self.platform {
            Platform::Linux => Some(self.xdg_config_root()?.join(&self.slug)),
            Platform::MacOs => Some(self.vendor_dir(&self.mac_home_root()?)),
            Platform::Windows => {
                let roaming = self.vendor_dir(&self.appdata_root()?);
                if roaming.exists() {
                    return Some(roaming);
                }
                self.localappdata_root()
                    .map(|root| self.vendor_dir(&root))
            }
            Platform::Unknown => None
        }
    }

    /// User directory that deployments write to. Unlike [`Self::user_root`]
    /// this never falls back to the Windows local profile.
    pub fn deploy_user_root(&self) -> Option<PathBuf> {
        match self.platform {
            Platform::Windows => Some(self.vendor_dir(&self.appdata_root()?)),
            _ => self.user_root()
        }
    }

    /// Canonical host file path, whether or not it exists.
    pub fn host_file(&self) -> Option<PathBuf> {
        self.app_root()
            .map(|root| root.join(HOSTS_DIR).join(format!("{}.toml", self.hostname())))
    }

    /// Platform `.env` fallback location, whether or not it exists.
    pub fn platform_dotenv(&self) -> Option<PathBuf> {
        let base = match self.platform {
            Platform::Linux => self.xdg_config_root()?.join(&self.slug),
            Platform::MacOs => self.vendor_dir(&self.mac_home_root()?),
            Platform::Windows => self.vendor_dir(&self.appdata_root()?),
            Platform::Unknown => return None
        };
        Some(base.join(DOTENV_FILE))
    }

    fn var(&self, name: &str) -> Option<&str> {
        self.environ
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    fn home(&self) -> Option<PathBuf> {
        self.var("HOME")
            .or_else(|| self.var("USERPROFILE"))
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
    }

    fn vendor_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.vendor).join(&self.app)
    }

    fn etc_root(&self) -> PathBuf {
        PathBuf::from(self.var(ENV_ETC_ROOT).unwrap_or("/etc"))
    }

    fn xdg_config_root(&self) -> Option<PathBuf> {
        match self.var("XDG_CONFIG_HOME") {
            Some(xdg) => Some(PathBuf::from(xdg)),
            None => self.home().map(|home| home.join(".config"))
        }
    }

    fn mac_app_root(&self) -> PathBuf {
        PathBuf::from(
            self.var(ENV_MAC_APP_ROOT)
                .unwrap_or("/Library/Application Support")
        )
    }

    fn mac_home_root(&self) -> Option<PathBuf> {
        match self.var(ENV_MAC_HOME_ROOT) {
            Some(root) => Some(PathBuf::from(root)),
            None => self
                .home()
                .map(|home| home.join("Library").join("Application Support"))
        }
    }

    fn program_data_root(&self) -> PathBuf {
        PathBuf::from(
            self.var(ENV_PROGRAMDATA)
                .or_else(|| self.var("ProgramData"))
                .unwrap_or(r"C:\ProgramData")
        )
    }

    fn appdata_root(&self) -> Option<PathBuf> {
        self.var(ENV_APPDATA)
            .or_else(|| self.var("APPDATA"))
            .map(PathBuf::from)
            .or_else(|| self.home().map(|home| home.join("AppData").join("Roaming")))
    }

    fn localappdata_root(&self) -> Option<PathBuf> {
        self.var(ENV_LOCALAPPDATA)
            .or_else(|| self.var("LOCALAPPDATA"))
            .map(PathBuf::from)
            .or_else(|| self.home().map(|home| home.join("AppData").join("Local")))
    }

    fn log_candidates(layer: LayerName, paths: &[PathBuf]) {
        if !paths.is_empty() {
            debug!(layer = layer.as_str(), count = paths.len(), "path_candidates");
        }
    }
}

impl PathResolver for DefaultPathResolver {
    fn app(&self) -> ConfigResult<Vec<PathBuf>> {
        let paths = match self.app_root() {
            Some(root) => collect_layer(&root)?,
            None => Vec::new()
        };
        Self::log_candidates(LayerName::App, &paths);
        Ok(paths)
    }

    fn host(&self) -> ConfigResult<Vec<PathBuf>> {
        let paths: Vec<PathBuf> = self.host_file().into_iter().filter(|p| p.is_file()).collect();
        Self::log_candidates(LayerName::Host, &paths);
        Ok(paths)
    }

    fn user(&self) -> ConfigResult<Vec<PathBuf>> {
        let paths = match self.user_root() {
            Some(root) => collect_layer(&root)?,
            None => Vec::new()
        };
        Self::log_candidates(LayerName::User, &paths);
        Ok(paths)
    }

    /// Existing `.env` files from the working directory upwards, then the
    /// platform fallback when it exists and was not already listed.
    fn dotenv(&self) -> ConfigResult<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for dir in self.cwd.ancestors() {
            let candidate = dir.join(DOTENV_FILE);
            if candidate.is_file() && !paths.contains(&candidate) {
                paths.push(candidate);
            }
        }
        if let Some(extra) = self.platform_dotenv() {
            if extra.is_file() && !paths.contains(&extra) {
                paths.push(extra);
            }
        }
        Self::log_candidates(LayerName::Dotenv, &paths);
        Ok(paths)
    }
}

/// Hostname reported by the operating system, if it is valid UTF-8.
fn system_hostname() -> Option<String> {
    gethostname::gethostname()
        .into_string()
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// `<base>/config.toml` when present, then every supported file directly in
/// `<base>/config.d`, sorted by name.
fn collect_layer(base: &Path) -> ConfigResult<Vec<PathBuf>> {
    let mut paths = Vec::new();

    let config_file = base.join(CONFIG_FILE);
    if config_file.is_file() {
        paths.push(config_file);
    }

    let config_dir = base.join(CONFIG_DIR);
    if config_dir.is_dir() {
        let mut entries = fs::read_dir(&config_dir)
            .and_then(|entries| {
                entries
                    .map(|entry| entry.map(|e| e.path()))
                    .collect::<Result<Vec<_>, _>>()
            })
            .map_err(|e| ConfigError::io(&config_dir, e))?;
        entries.sort();

        for path in entries {
            if path.is_file() && FileFormat::from_path(&path).is_some() {
                paths.push(path);
            } else {
                trace!(path = %path.display(), "skipping config.d entry");
            }
        }
    }

    Ok(paths)
}
