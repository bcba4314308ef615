use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use tempfile::TempDir;

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

/// Slug that no other test in the process uses, so env prefixes never clash.
pub fn unique_slug() -> String {
    unique_id("sandbox-app")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Linux,
    MacOs,
    Windows
}

impl Family {
    fn from_platform(platform: &str) -> Self {
        let platform = platform.to_ascii_lowercase();
        if platform.starts_with("win") {
            Self::Windows
        } else if platform == "darwin" || platform == "macos" {
            Self::MacOs
        } else {
            Self::Linux
        }
    }
}

/// Temporary directory tree standing in for every configuration root.
///
/// Writes go to the directories the reader would search for the chosen
/// platform, and [`LayeredSandbox::env`] yields the overrides that point the
/// reader at them.
///
/// ```rust,ignore
/// let sandbox = LayeredSandbox::new("Acme", "Demo", "demo");
/// sandbox.write("app", "config.toml", "[service]\ntimeout = 5\n");
///
/// let config = ConfigReader::new("Acme", "Demo", "demo")
///     .with_platform(sandbox.platform())
///     .with_environ(sandbox.env())
///     .with_start_dir(sandbox.start_dir())
///     .read()?;
/// ```
pub struct LayeredSandbox {
    dir: TempDir,
    vendor: String,
    app: String,
    slug: String,
    platform: String,
    hostname: String
}

impl LayeredSandbox {
    pub fn new(vendor: &str, app: &str, slug: &str) -> Self {
        let dir = TempDir::new().expect("failed to create sandbox directory");
        fs::create_dir_all(dir.path().join("project")).expect("failed to create project directory");
        Self {
            dir,
            vendor: vendor.to_string(),
            app: app.to_string(),
            slug: slug.to_string(),
            platform: "linux".to_string(),
            hostname: "test-host".to_string()
        }
    }

    #[must_use]
    pub fn with_platform(mut self, platform: &str) -> Self {
        self.platform = platform.to_string();
        self
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = hostname.to_string();
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Project directory the `.env` search starts from.
    pub fn start_dir(&self) -> PathBuf {
        self.root().join("project")
    }

    /// Directory backing a layer: `app`, `host`, `user` or `dotenv`.
    ///
    /// `dotenv` maps to the project directory; the user directory doubles as
    /// the platform `.env` fallback.
    pub fn layer_dir(&self, layer: &str) -> PathBuf {
        match layer {
            "app" => self.app_dir(),
            "host" => self.app_dir().join("hosts"),
            "user" => self.user_dir(),
            "dotenv" => self.start_dir(),
            other => panic!("unknown sandbox layer {other}")
        }
    }

    /// Write `content` to `relative` inside a layer directory and return the
    /// full path.
    pub fn write(&self, layer: &str, relative: &str, content: &str) -> PathBuf {
        let path = self.layer_dir(layer).join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create sandbox layer directory");
        }
        fs::write(&path, content).expect("failed to write sandbox file");
        path
    }

    /// Environment entries redirecting every root into the sandbox.
    pub fn env(&self) -> Vec<(String, String)> {
        let root = self.root();
        [
            ("LAYERED_CONFIG_ETC", root.join("etc")),
            ("XDG_CONFIG_HOME", root.join("xdg")),
            ("LAYERED_CONFIG_MAC_APP_ROOT", root.join("mac-app")),
            ("LAYERED_CONFIG_MAC_HOME_ROOT", root.join("mac-home")),
            ("LAYERED_CONFIG_PROGRAMDATA", root.join("ProgramData")),
            ("LAYERED_CONFIG_APPDATA", root.join("AppData").join("Roaming")),
            ("LAYERED_CONFIG_LOCALAPPDATA", root.join("AppData").join("Local")),
            ("HOME", root.join("home")),
        ]
        .into_iter()
        .map(|(key, path)| (key.to_string(), path.display().to_string()))
        .chain([("LAYERED_CONFIG_HOSTNAME".to_string(), self.hostname.clone())])
        .collect()
    }

    fn app_dir(&self) -> PathBuf {
        let root = self.root();
        match Family::from_platform(&self.platform) {
            Family::Linux => root.join("etc").join(&self.slug),
            Family::MacOs => root.join("mac-app").join(&self.vendor).join(&self.app),
            Family::Windows => root.join("ProgramData").join(&self.vendor).join(&self.app)
        }
    }

    fn user_dir(&self) -> PathBuf {
        let root = self.root();
        match Family::from_platform(&self.platform) {
            Family::Linux => root.join("xdg").join(&self.slug),
            Family::MacOs => root.join("mac-home").join(&self.vendor).join(&self.app),
            Family::Windows => root
                .join("AppData")
                .join("Roaming")
                .join(&self.vendor)
                .join(&self.app)
        }
    }
}
