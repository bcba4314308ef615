//! Example configuration trees for documentation and onboarding.

use std::fs;
use std::path::{Path, PathBuf};

use errors::{ConfigError, ConfigResult};
use tracing::{debug, info};

use crate::loader::default_env_prefix;

/// Placeholder hostname used for the example host file.
pub const HOST_PLACEHOLDER: &str = "your-hostname";

/// Directory layout of the generated examples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExampleLayout {
    /// `etc/<slug>/...` and `xdg/<slug>/...`
    Posix,
    /// `ProgramData/<vendor>/<app>/...` and `AppData/Roaming/<vendor>/<app>/...`
    Windows
}

impl ExampleLayout {
    /// `win*` selects the Windows layout; anything else is POSIX. `None`
    /// follows the running platform.
    pub fn from_platform(platform: Option<&str>) -> Self {
        let is_windows = match platform {
            Some(value) => value.to_ascii_lowercase().starts_with("win"),
            None => cfg!(windows)
        };
        if is_windows { Self::Windows } else { Self::Posix }
    }
}

struct ExampleFile {
    relative_path: PathBuf,
    content: String
}

/// Write the example tree under `destination`.
///
/// Existing files are left alone unless `force` is set. Returns the files
/// written.
pub fn generate_examples(
    destination: &Path,
    slug: &str,
    vendor: &str,
    app: &str,
    platform: Option<&str>,
    force: bool
) -> ConfigResult<Vec<PathBuf>> {
    let layout = ExampleLayout::from_platform(platform);
    let mut written = Vec::new();

    for example in example_files(layout, slug, vendor, app) {
        let path = destination.join(&example.relative_path);
        if path.exists() && !force {
            debug!(path = %path.display(), "example exists, skipping");
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        fs::write(&path, &example.content).map_err(|e| ConfigError::io(&path, e))?;
        written.push(path);
    }

    info!(destination = %destination.display(), files = written.len(), "examples_generated");
    Ok(written)
}

fn example_files(layout: ExampleLayout, slug: &str, vendor: &str, app: &str) -> Vec<ExampleFile> {
    let (app_dir, user_dir) = match layout {
        ExampleLayout::Posix => (
            PathBuf::from("etc").join(slug),
            PathBuf::from("xdg").join(slug)
        ),
        ExampleLayout::Windows => (
            PathBuf::from("ProgramData").join(vendor).join(app),
            PathBuf::from("AppData").join("Roaming").join(vendor).join(app)
        )
    };
    let prefix = default_env_prefix(slug);

    vec![
        ExampleFile {
            relative_path: app_dir.join("config.toml"),
            content: format!(
                "# Application-wide defaults for {slug}\n[service]\nendpoint = \"https://api.example.com\"\ntimeout = 10\n"
            )
        },
        ExampleFile {
            relative_path: app_dir.join("hosts").join(format!("{HOST_PLACEHOLDER}.toml")),
            content: "# Host overrides (rename to the machine hostname)\n[service]\ntimeout = 15\n"
                .to_string()
        },
        ExampleFile {
            relative_path: user_dir.join("config.toml"),
            content: format!("# User-specific preferences for {vendor} {app}\n[service]\nretry = 2\n")
        },
        ExampleFile {
            relative_path: user_dir.join("config.d").join("10-override.toml"),
            content: "# Fragments in config.d/ apply in lexical order\n[service]\nretry = 3\n"
                .to_string()
        },
        ExampleFile {
            relative_path: PathBuf::from(".env.example"),
            content: format!(
                "# Copy to .env for secrets and local overrides\nSERVICE__PASSWORD=changeme\n# The same key as an environment variable: {prefix}_SERVICE__PASSWORD\n"
            )
        },
    ]
}
