//! # Configuration Deployment
//!
//! Copies a configuration file into the canonical location of one or more
//! file layers (`app`, `host`, `user`) for a platform.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use errors::{ConfigError, ConfigResult};
use strum::{AsRefStr, Display, EnumString};
use tracing::{debug, info};

use crate::path_resolver::{DefaultPathResolver, Platform};

/// Layer a file can be deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeployTarget {
    App,
    Host,
    User
}

impl DeployTarget {
    /// Parse target names, rejecting the whole list on the first unknown one.
    pub fn parse_all<S: AsRef<str>>(targets: &[S]) -> ConfigResult<Vec<Self>> {
        targets
            .iter()
            .map(|raw| {
                Self::from_str(raw.as_ref()).map_err(|_| ConfigError::UnsupportedTarget {
                    target: raw.as_ref().to_string()
                })
            })
            .collect()
    }
}

/// Copy `source` to each target's canonical path.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Installs a configuration file where [`crate::ConfigReader`] will find it.
/// `slug` defaults to `app`; an unknown `platform` falls back to the Linux
/// layout.
///
/// ## Behavior
/// - Targets are validated before any filesystem access.
/// - A destination that is the source file itself is skipped.
/// - Existing destinations are skipped unless `force` is set.
/// - Returns the paths actually written.
///
/// ## Error Handling
/// - `UnsupportedTarget` for a target outside `app`, `host`, `user`
/// - `NotFound` when `source` is not a file
/// - `Io` when a destination cannot be written
pub fn deploy_config<S: AsRef<str>>(
    source: &Path,
    vendor: &str,
    app: &str,
    targets: &[S],
    slug: Option<&str>,
    platform: Option<&str>,
    force: bool
) -> ConfigResult<Vec<PathBuf>> {
    let mut resolver = DefaultPathResolver::new(vendor, app, slug.unwrap_or(app));
    if let Some(platform) = platform {
        resolver = resolver.with_platform(platform);
    }
    deploy_with_resolver(source, &resolver, &DeployTarget::parse_all(targets)?, force)
}

/// [`deploy_config`] against an explicitly configured resolver.
pub fn deploy_with_resolver(
    source: &Path,
    resolver: &DefaultPathResolver,
    targets: &[DeployTarget],
    force: bool
) -> ConfigResult<Vec<PathBuf>> {
    if !source.is_file() {
        return Err(ConfigError::not_found(source));
    }
    let payload = fs::read(source).map_err(|e| ConfigError::io(source, e))?;
    let canonical_source = fs::canonicalize(source).map_err(|e| ConfigError::io(source, e))?;

    let resolver = if resolver.platform() == Platform::Unknown {
        resolver.clone().with_platform("linux")
    } else {
        resolver.clone()
    };

    let mut written = Vec::new();
    for target in targets {
        let Some(destination) = destination_for(&resolver, *target) else {
            debug!(target = target.as_ref(), "no destination for target");
            continue;
        };
        if !should_copy(&canonical_source, &destination, force) {
            debug!(destination = %destination.display(), "deploy skipped");
            continue;
        }
        write_payload(&destination, &payload)?;
        info!(target = target.as_ref(), destination = %destination.display(), "config_deployed");
        written.push(destination);
    }
    Ok(written)
}

fn destination_for(resolver: &DefaultPathResolver, target: DeployTarget) -> Option<PathBuf> {
    match target {
        DeployTarget::App => resolver.app_root().map(|root| root.join("config.toml")),
        DeployTarget::Host => resolver.host_file(),
        DeployTarget::User => resolver
            .deploy_user_root()
            .map(|root| root.join("config.toml"))
    }
}

fn should_copy(canonical_source: &Path, destination: &Path, force: bool) -> bool {
    if fs::canonicalize(destination).is_ok_and(|dest| dest == canonical_source) {
        return false;
    }
    force || !destination.exists()
}

fn write_payload(destination: &Path, payload: &[u8]) -> ConfigResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }
    fs::write(destination, payload).map_err(|e| ConfigError::io(destination, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_resolver::{ENV_APPDATA, ENV_ETC_ROOT, ENV_LOCALAPPDATA, ENV_PROGRAMDATA};
    use tempfile::TempDir;

    fn source(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("source.toml");
        fs::write(&path, "[service]\ntimeout = 5\n").unwrap();
        path
    }

    fn linux_resolver(dir: &TempDir) -> DefaultPathResolver {
        DefaultPathResolver::new("Acme", "Demo", "demo")
            .with_platform("linux")
            .with_hostname("box")
            .with_environ([
                (ENV_ETC_ROOT, dir.path().join("etc").display().to_string()),
                ("XDG_CONFIG_HOME", dir.path().join("xdg").display().to_string()),
            ])
    }

    #[test]
    fn test_parse_targets() {
        assert_eq!(
            DeployTarget::parse_all(&["app", "HOST", "User"]).unwrap(),
            vec![DeployTarget::App, DeployTarget::Host, DeployTarget::User]
        );
        let err = DeployTarget::parse_all(&["app", "cloud"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedTarget { ref target } if target == "cloud"));
    }

    #[test]
    fn test_deploy_linux_targets() {
        let dir = TempDir::new().unwrap();
        let source = source(&dir);
        let resolver = linux_resolver(&dir);
        let targets = [DeployTarget::App, DeployTarget::Host, DeployTarget::User];

        let written = deploy_with_resolver(&source, &resolver, &targets, false).unwrap();

        assert_eq!(
            written,
            vec![
                dir.path().join("etc/demo/config.toml"),
                dir.path().join("etc/demo/hosts/box.toml"),
                dir.path().join("xdg/demo/config.toml"),
            ]
        );
        for path in &written {
            assert_eq!(fs::read_to_string(path).unwrap(), "[service]\ntimeout = 5\n");
        }
    }

    #[test]
    fn test_existing_destination_needs_force() {
        let dir = TempDir::new().unwrap();
        let source = source(&dir);
        let resolver = linux_resolver(&dir);
        let existing = dir.path().join("etc/demo/config.toml");
        fs::create_dir_all(existing.parent().unwrap()).unwrap();
        fs::write(&existing, "old").unwrap();

        let skipped = deploy_with_resolver(&source, &resolver, &[DeployTarget::App], false).unwrap();
        assert!(skipped.is_empty());
        assert_eq!(fs::read_to_string(&existing).unwrap(), "old");

        let forced = deploy_with_resolver(&source, &resolver, &[DeployTarget::App], true).unwrap();
        assert_eq!(forced, vec![existing.clone()]);
        assert_ne!(fs::read_to_string(&existing).unwrap(), "old");
    }

    #[test]
    fn test_source_equal_to_destination_is_skipped() {
        let dir = TempDir::new().unwrap();
        let resolver = linux_resolver(&dir);
        let target = dir.path().join("etc/demo/config.toml");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "x = 1\n").unwrap();

        let written = deploy_with_resolver(&target, &resolver, &[DeployTarget::App], true).unwrap();
        assert!(written.is_empty());
    }

    #[test]
    fn test_missing_source_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = deploy_with_resolver(
            &dir.path().join("absent.toml"),
            &linux_resolver(&dir),
            &[DeployTarget::App],
            false
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unknown_platform_uses_linux_layout() {
        let dir = TempDir::new().unwrap();
        let source = source(&dir);
        let resolver = linux_resolver(&dir).with_platform("plan9");

        let written = deploy_with_resolver(&source, &resolver, &[DeployTarget::App], false).unwrap();
        assert_eq!(written, vec![dir.path().join("etc/demo/config.toml")]);
    }

    #[test]
    fn test_windows_user_deploys_to_roaming() {
        let dir = TempDir::new().unwrap();
        let source = source(&dir);
        let resolver = DefaultPathResolver::new("Acme", "Demo", "demo")
            .with_platform("win32")
            .with_environ([
                (ENV_PROGRAMDATA, dir.path().join("ProgramData").display().to_string()),
                (ENV_APPDATA, dir.path().join("Roaming").display().to_string()),
                (ENV_LOCALAPPDATA, dir.path().join("Local").display().to_string()),
            ]);

        let written = deploy_with_resolver(
            &source,
            &resolver,
            &[DeployTarget::App, DeployTarget::User],
            false
        )
        .unwrap();
        assert_eq!(
            written,
            vec![
                dir.path().join("ProgramData").join("Acme").join("Demo").join("config.toml"),
                dir.path().join("Roaming").join("Acme").join("Demo").join("config.toml"),
            ]
        );
    }

    #[test]
    fn test_deploy_config_rejects_unknown_target_before_io() {
        let err = deploy_config(
            Path::new("/definitely/missing.toml"),
            "Acme",
            "Demo",
            &["app", "galaxy"],
            None,
            Some("linux"),
            false
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedTarget { .. }));
    }
}
