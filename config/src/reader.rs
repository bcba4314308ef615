//! # Configuration Reader
//!
//! Composition root: resolves candidate files, loads every layer in
//! precedence order, merges them and wraps the result in a [`Config`].
//!
//! # Layer Order
//! 1. `app` files (canonical `config.toml`, then `config.d/*`)
//! 2. `host` file (`hosts/<hostname>.toml`)
//! 3. `user` files
//! 4. first `.env` file found
//! 5. `<SLUG>_*` environment variables
//!
//! A malformed file aborts the whole read; missing files never do.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use errors::{ConfigError, ConfigResult};
use tracing::{debug, info};

use crate::config::Config;
use crate::dotenv::DefaultDotEnvLoader;
use crate::file_loader::FileFormat;
use crate::loader::{DefaultEnvLoader, default_env_prefix};
use crate::observability::TraceContext;
use crate::path_resolver::DefaultPathResolver;
use crate::ports::{DotEnvLoader, EnvLoader, FileLoader, PathResolver};
use crate::precedence::{MergedLayers, merge_layers};
use crate::value::{LayerName, LayerPayload, Mapping, Provenance};

/// Builder for one configuration read.
///
/// # Example
///
/// ```rust,no_run
/// use config::ConfigReader;
///
/// let config = ConfigReader::new("Acme", "Demo", "demo")
///     .with_prefer(["toml", "json"])
///     .with_trace_id("req-42")
///     .read()?;
///
/// println!("timeout = {}", config.get("service.timeout", 30));
/// # Ok::<(), errors::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigReader {
    vendor: String,
    app: String,
    slug: String,

    /// Preferred file suffixes, most preferred first.
    prefer: Vec<String>,

    /// Where the `.env` search starts; the working directory when unset.
    start_dir: Option<PathBuf>,

    /// Replacement for the process environment snapshot.
    environ: Option<HashMap<String, String>>,

    /// Entries layered on top of the snapshot.
    env_overrides: Vec<(String, String)>,

    platform: Option<String>,
    hostname: Option<String>,
    trace: TraceContext
}

impl ConfigReader {
    #[must_use]
    pub fn new(vendor: impl Into<String>, app: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            app: app.into(),
            slug: slug.into(),
            prefer: Vec::new(),
            start_dir: None,
            environ: None,
            env_overrides: Vec::new(),
            platform: None,
            hostname: None,
            trace: TraceContext::default()
        }
    }

    /// Order files within a layer by suffix (`"toml"` or `".toml"`); unlisted
    /// suffixes keep their discovery order after the listed ones.
    #[must_use]
    pub fn with_prefer<I, S>(mut self, prefer: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        self.prefer = prefer.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_start_dir(mut self, start_dir: impl Into<PathBuf>) -> Self {
        self.start_dir = Some(start_dir.into());
        self
    }

    /// Override environment entries seen by the resolver and the env layer.
    #[must_use]
    pub fn with_env<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>
    {
        self.env_overrides
            .extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Read from `environ` instead of the process environment.
    #[must_use]
    pub fn with_environ<I, K, V>(mut self, environ: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>
    {
        self.environ = Some(
            environ
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect()
        );
        self
    }

    /// Platform identifier (`linux`, `darwin`, `win32`); the running platform
    /// when unset.
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Trace id attached to every event emitted during the read.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace = TraceContext::new(trace_id);
        self
    }

    /// Path resolver configured from this builder.
    pub fn resolver(&self) -> DefaultPathResolver {
        let mut resolver = DefaultPathResolver::new(&self.vendor, &self.app, &self.slug);
        if let Some(environ) = &self.environ {
            resolver = resolver.with_environ(environ.clone());
        }
        resolver = resolver.with_env(self.env_overrides.iter().cloned());
        if let Some(start_dir) = &self.start_dir {
            resolver = resolver.with_cwd(start_dir);
        }
        if let Some(platform) = &self.platform {
            resolver = resolver.with_platform(platform);
        }
        if let Some(hostname) = &self.hostname {
            resolver = resolver.with_hostname(hostname);
        }
        resolver
    }

    /// Read and merge every layer into a [`Config`].
    ///
    /// # M-CANONICAL-DOCS
    ///
    /// ## Purpose
    /// Main entry point. Returns an empty configuration equal to
    /// [`Config::empty()`] when no layer contributed data.
    ///
    /// ## Error Handling
    /// - `LayerLoad` naming the layer and file when a file is malformed
    /// - `InvalidFormat` for malformed `.env` content or env nesting conflicts
    /// - `Io` when a `config.d` directory cannot be listed
    pub fn read(&self) -> ConfigResult<Config> {
        let (data, provenance) = self.read_raw()?;
        if data.is_empty() {
            return Ok(Config::empty().clone());
        }
        Ok(Config::new(data, provenance))
    }

    /// Merged tree and provenance without the [`Config`] wrapper.
    pub fn read_raw(&self) -> ConfigResult<(Mapping, Provenance)> {
        let span = self.trace.read_span(&self.slug);
        let _entered = span.enter();

        let layers = self.collect_layers()?;
        Ok(merge_or_empty(&layers).into_parts())
    }

    /// Layer payloads in precedence order, before merging.
    pub fn collect_layers(&self) -> ConfigResult<Vec<LayerPayload>> {
        let resolver = self.resolver();
        let dotenv_loader = DefaultDotEnvLoader::new().with_extras(resolver.dotenv()?);
        let env_loader = DefaultEnvLoader::with_environ(resolver.environ().clone());

        gather_layers(
            &resolver,
            &dotenv_loader,
            &env_loader,
            &self.prefer,
            self.start_dir.as_deref(),
            &self.slug
        )
    }
}

/// Read configuration for `vendor`/`app`/`slug` with the default adapters.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Shorthand for [`ConfigReader`] with a preference list and start directory.
///
/// ## Usage
/// ```rust,no_run
/// use config::read_config;
///
/// let config = read_config("Acme", "Demo", "demo", &["toml"], None)?;
/// if let Some(origin) = config.origin("service.timeout") {
///     println!("service.timeout set by {} layer", origin.layer);
/// }
/// # Ok::<(), errors::ConfigError>(())
/// ```
pub fn read_config(
    vendor: &str,
    app: &str,
    slug: &str,
    prefer: &[&str],
    start_dir: Option<&Path>
) -> ConfigResult<Config> {
    reader(vendor, app, slug, prefer, start_dir).read()
}

/// Like [`read_config`] but returns the plain `(tree, provenance)` pair.
pub fn read_config_raw(
    vendor: &str,
    app: &str,
    slug: &str,
    prefer: &[&str],
    start_dir: Option<&Path>
) -> ConfigResult<(Mapping, Provenance)> {
    reader(vendor, app, slug, prefer, start_dir).read_raw()
}

fn reader(
    vendor: &str,
    app: &str,
    slug: &str,
    prefer: &[&str],
    start_dir: Option<&Path>
) -> ConfigReader {
    let reader = ConfigReader::new(vendor, app, slug).with_prefer(prefer.iter().copied());
    match start_dir {
        Some(dir) => reader.with_start_dir(dir),
        None => reader
    }
}

/// Collect payloads from each adapter in precedence order.
pub fn gather_layers<R, D, E>(
    resolver: &R,
    dotenv_loader: &D,
    env_loader: &E,
    prefer: &[String],
    start_dir: Option<&Path>,
    slug: &str
) -> ConfigResult<Vec<LayerPayload>>
where
    R: PathResolver,
    D: DotEnvLoader,
    E: EnvLoader
{
    let mut layers = Vec::new();

    for layer in LayerName::FILE_LAYERS {
        let paths = match layer {
            LayerName::App => resolver.app()?,
            LayerName::Host => resolver.host()?,
            _ => resolver.user()?
        };
        let entries = load_files(layer, order_paths(paths, prefer))?;
        if !entries.is_empty() {
            debug!(layer = layer.as_str(), files = entries.len(), "layer_loaded");
            layers.extend(entries);
        }
    }

    if let Some(dotenv) = dotenv_loader.load(start_dir)? {
        if !dotenv.data.is_empty() {
            debug!(
                layer = LayerName::Dotenv.as_str(),
                path = %dotenv.path.display(),
                keys = dotenv.data.len(),
                "layer_loaded"
            );
            layers.push(LayerPayload::new(LayerName::Dotenv, dotenv.data, Some(dotenv.path)));
        }
    }

    let env = env_loader.load(&default_env_prefix(slug))?;
    if !env.is_empty() {
        debug!(layer = LayerName::Env.as_str(), keys = env.len(), "layer_loaded");
        layers.push(LayerPayload::in_memory(LayerName::Env, env));
    }

    Ok(layers)
}

fn load_files(layer: LayerName, paths: Vec<PathBuf>) -> ConfigResult<Vec<LayerPayload>> {
    let mut entries = Vec::new();
    for path in paths {
        if let Some(entry) = load_entry(layer, path)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

fn load_entry(layer: LayerName, path: PathBuf) -> ConfigResult<Option<LayerPayload>> {
    let Some(format) = FileFormat::from_path(&path) else {
        return Ok(None);
    };
    match format.load(&path) {
        Ok(data) if data.is_empty() => Ok(None),
        Ok(data) => Ok(Some(LayerPayload::new(layer, data, Some(path)))),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) if e.is_invalid_format() => {
            debug!(
                layer = layer.as_str(),
                path = %path.display(),
                error = %e,
                "layer_error"
            );
            Err(ConfigError::layer_load(layer.as_str(), path, e))
        }
        Err(e) => Err(e)
    }
}

/// Stable-sort `paths` by the rank of their suffix in `prefer`.
pub fn order_paths(mut paths: Vec<PathBuf>, prefer: &[String]) -> Vec<PathBuf> {
    if prefer.is_empty() {
        return paths;
    }
    let mut ranking: HashMap<String, usize> = HashMap::new();
    for (index, suffix) in prefer.iter().enumerate() {
        ranking
            .entry(normalize_suffix(suffix))
            .or_insert(index);
    }
    let unranked = prefer.len();
    paths.sort_by_key(|path| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ranking.get(&normalize_suffix(ext)).copied())
            .unwrap_or(unranked)
    });
    paths
}

fn normalize_suffix(suffix: &str) -> String {
    suffix.trim_start_matches('.').to_lowercase()
}

fn merge_or_empty(layers: &[LayerPayload]) -> MergedLayers {
    if layers.is_empty() {
        info!("configuration_empty");
        return MergedLayers::default();
    }
    let merged = merge_layers(layers);
    info!(total_layers = layers.len(), "configuration_merged");
    merged
}
