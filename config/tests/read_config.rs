//! End-to-end reads against a sandboxed filesystem.

use std::env;

use config::{Config, ConfigError, ConfigReader, LayerName, read_config, read_config_raw};
use serde_json::json;
use serial_test::serial;
use testing::LayeredSandbox;

const VENDOR: &str = "Acme";
const APP: &str = "ConfigKit";
const SLUG: &str = "config-kit";

fn reader(sandbox: &LayeredSandbox) -> ConfigReader {
    ConfigReader::new(sandbox.vendor(), sandbox.app(), sandbox.slug())
        .with_platform(sandbox.platform())
        .with_environ(sandbox.env())
        .with_start_dir(sandbox.start_dir())
}

fn write_basic_layers(sandbox: &LayeredSandbox) {
    sandbox.write("app", "config.toml", "[service]\ntimeout = 5\n");
    sandbox.write("app", "config.d/01-extra.toml", "[service]\nretries = 1\n");
    sandbox.write("host", "test-host.toml", "[service]\ntimeout = 10\n");
    sandbox.write("user", "config.toml", "[service]\nendpoint = 'https://api'\n");
    sandbox.write("user", ".env", "SERVICE__TIMEOUT=15\n");
}

#[test]
fn test_basic_layering_env_wins() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG);
    write_basic_layers(&sandbox);

    let config = reader(&sandbox)
        .with_env([
            ("CONFIG_KIT_SERVICE__TIMEOUT", "20"),
            ("CONFIG_KIT_SERVICE__MODE", "debug"),
        ])
        .read()
        .unwrap();

    assert_eq!(config.get("service.timeout", 0), json!(20));
    assert_eq!(config.get("service.mode", ""), json!("debug"));
    assert_eq!(config.get("service.endpoint", ""), json!("https://api"));
    assert_eq!(config.get("service.retries", 0), json!(1));

    let timeout = config.origin("service.timeout").unwrap();
    assert_eq!(timeout.layer, LayerName::Env);
    assert!(timeout.path.is_none());

    let endpoint = config.origin("service.endpoint").unwrap();
    assert_eq!(endpoint.layer, LayerName::User);
    assert_eq!(
        endpoint.path.as_deref(),
        Some(sandbox.layer_dir("user").join("config.toml").as_path())
    );
}

#[test]
fn test_each_layer_overrides_the_previous() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG);
    sandbox.write("app", "config.toml", "[service]\ntimeout = 5\n");

    let origin_of_timeout = |sandbox: &LayeredSandbox| {
        let config = reader(sandbox).read().unwrap();
        let origin = config.origin("service.timeout").unwrap().layer;
        (config.get("service.timeout", 0), origin)
    };

    assert_eq!(origin_of_timeout(&sandbox), (json!(5), LayerName::App));

    sandbox.write("host", "test-host.toml", "[service]\ntimeout = 10\n");
    assert_eq!(origin_of_timeout(&sandbox), (json!(10), LayerName::Host));

    sandbox.write("user", "config.toml", "[service]\ntimeout = 12\n");
    assert_eq!(origin_of_timeout(&sandbox), (json!(12), LayerName::User));

    sandbox.write("dotenv", ".env", "SERVICE__TIMEOUT=15\n");
    assert_eq!(origin_of_timeout(&sandbox), (json!("15"), LayerName::Dotenv));
}

#[test]
fn test_config_d_fragments_merge_after_canonical_file() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG);
    sandbox.write("app", "config.toml", "[service]\ntimeout = 5\n");
    sandbox.write("app", "config.d/01-extra.toml", "[service]\nretries = 1\n");

    let config = reader(&sandbox).read().unwrap();

    assert_eq!(config.get("service.timeout", 0), json!(5));
    assert_eq!(config.get("service.retries", 0), json!(1));
    assert_eq!(config.origin("service.retries").unwrap().layer, LayerName::App);
    assert_eq!(
        config.origin("service.retries").unwrap().path.as_deref(),
        Some(sandbox.layer_dir("app").join("config.d/01-extra.toml").as_path())
    );
}

#[test]
fn test_config_d_mixed_formats_in_name_order() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG);
    sandbox.write("user", "config.d/10-base.json", r#"{"feature": {"flag": "json", "only_json": true}}"#);
    sandbox.write("user", "config.d/20-next.yaml", "feature:\n  flag: yaml\n");
    sandbox.write("user", "config.d/30-last.yml", "feature:\n  level: 3\n");
    sandbox.write("user", "config.d/40-ignored.ini", "flag=ini\n");

    let config = reader(&sandbox).read().unwrap();

    assert_eq!(config.get("feature.flag", ""), json!("yaml"));
    assert_eq!(config.get("feature.only_json", false), json!(true));
    assert_eq!(config.get("feature.level", 0), json!(3));
}

#[test]
fn test_prefer_reorders_files_within_a_layer() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG);
    sandbox.write("app", "config.d/10-a.json", r#"{"winner": "json"}"#);
    sandbox.write("app", "config.d/20-b.toml", "winner = \"toml\"\n");

    let default_order = reader(&sandbox).read().unwrap();
    assert_eq!(default_order.get("winner", ""), json!("toml"));

    let preferred = reader(&sandbox).with_prefer(["toml", ".json"]).read().unwrap();
    assert_eq!(preferred.get("winner", ""), json!("json"));
}

#[test]
fn test_malformed_file_aborts_read() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG);
    sandbox.write("app", "config.toml", "[service]\ntimeout = 5\n");
    let bad = sandbox.write("app", "config.d/config.json", "{\"service\": ");

    let err = reader(&sandbox).read().unwrap_err();

    assert!(matches!(err, ConfigError::LayerLoad { ref layer, .. } if layer == "app"));
    let message = err.to_string();
    assert!(message.contains(&bad.display().to_string()), "{message}");
    assert!(message.contains("app layer"), "{message}");
}

#[test]
fn test_malformed_dotenv_aborts_read() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG);
    sandbox.write("dotenv", ".env", "VALID=1\nnot a pair\n");

    let err = reader(&sandbox).read().unwrap_err();
    assert!(err.is_invalid_format());
    assert!(err.to_string().contains("malformed line 2"));
}

#[test]
fn test_project_dotenv_beats_platform_fallback() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG);
    sandbox.write("user", ".env", "TOKEN=fallback\n");
    let project_env = sandbox.write("dotenv", ".env", "TOKEN=project\n");

    let config = reader(&sandbox).read().unwrap();

    assert_eq!(config.get("token", ""), json!("project"));
    assert_eq!(config.origin("token").unwrap().path.as_ref(), Some(&project_env));
}

#[test]
fn test_nothing_configured_returns_empty_config() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG);

    let config = reader(&sandbox).read().unwrap();

    assert!(config.is_empty());
    assert_eq!(&config, Config::empty());
    assert_eq!(config.get("service.timeout", "fallback"), json!("fallback"));
}

#[test]
fn test_empty_files_contribute_nothing() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG);
    sandbox.write("app", "config.toml", "");
    sandbox.write("user", "config.d/10-empty.yaml", "# nothing\n");

    let (data, provenance) = reader(&sandbox).read_raw().unwrap();
    assert!(data.is_empty());
    assert!(provenance.is_empty());
}

#[test]
fn test_read_raw_exposes_provenance() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG);
    write_basic_layers(&sandbox);

    let (data, provenance) = reader(&sandbox)
        .with_env([("CONFIG_KIT_SERVICE__TIMEOUT", "20")])
        .read_raw()
        .unwrap();

    assert_eq!(data["service"]["timeout"], 20);
    assert_eq!(provenance["service.timeout"].layer, LayerName::Env);
    assert_eq!(provenance["service.retries"].layer, LayerName::App);
    assert_eq!(
        serde_json::to_value(&provenance["service.retries"]).unwrap()["layer"],
        "app"
    );
}

#[test]
fn test_macos_layout() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG).with_platform("darwin");
    sandbox.write("app", "config.toml", "[service]\ntimeout = 5\n");
    sandbox.write("host", "test-host.toml", "[service]\nhost_only = true\n");
    sandbox.write("user", "config.toml", "[service]\ntimeout = 7\n");

    let config = reader(&sandbox).read().unwrap();

    assert_eq!(config.get("service.timeout", 0), json!(7));
    assert_eq!(config.get("service.host_only", false), json!(true));
    assert_eq!(config.origin("service.host_only").unwrap().layer, LayerName::Host);
}

#[test]
fn test_windows_layout() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG).with_platform("win32");
    sandbox.write("app", "config.toml", "[service]\ntimeout = 5\n");
    sandbox.write("user", "config.d/10-user.json", r#"{"service": {"timeout": 8}}"#);

    let config = reader(&sandbox).read().unwrap();

    assert_eq!(config.get("service.timeout", 0), json!(8));
    assert_eq!(config.origin("service.timeout").unwrap().layer, LayerName::User);
}

#[test]
fn test_unknown_platform_only_reads_dotenv_and_env() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG).with_platform("plan9");
    sandbox.write("dotenv", ".env", "A=1\n");

    let config = reader(&sandbox)
        .with_env([("CONFIG_KIT_B", "2")])
        .read()
        .unwrap();

    assert_eq!(config.len(), 2);
    assert_eq!(config.get("a", ""), json!("1"));
    assert_eq!(config.get("b", 0), json!(2));
}

#[test]
#[serial]
fn test_read_config_uses_process_environment() {
    let sandbox = LayeredSandbox::new(VENDOR, APP, SLUG);
    sandbox.write("app", "config.toml", "[service]\nname = 'demo'\n");

    let mut overrides = sandbox.env();
    overrides.push(("CONFIG_KIT_SERVICE__LEVEL".to_string(), "4".to_string()));
    let saved: Vec<(String, Option<String>)> = overrides
        .iter()
        .map(|(key, _)| (key.clone(), env::var(key).ok()))
        .collect();
    unsafe {
        for (key, value) in &overrides {
            env::set_var(key, value);
        }
    }

    let config = read_config(VENDOR, APP, SLUG, &[], Some(&sandbox.start_dir()));
    let raw = read_config_raw(VENDOR, APP, SLUG, &["toml"], Some(&sandbox.start_dir()));

    unsafe {
        for (key, previous) in saved {
            match previous {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key)
            }
        }
    }

    // Roots other than the env layer only line up with the sandbox on linux.
    let config = config.unwrap();
    assert_eq!(config.get("service.level", 0), json!(4));
    if cfg!(target_os = "linux") {
        assert_eq!(config.get("service.name", ""), json!("demo"));
    }

    let (data, provenance) = raw.unwrap();
    assert_eq!(data["service"]["level"], 4);
    assert_eq!(provenance["service.level"].layer, LayerName::Env);
}
