//! Application configuration loading and CLI/file merging.
//!
//! The config file is a strict `key = value` subset of TOML. Credentials are
//! never read from it; the access token comes from `--token` or
//! `DROPBOX_ACCESS_TOKEN` only.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use harvester_core::DropboxSettings;

use crate::cli::Args;

/// Environment variable consulted when `--token` is absent.
pub const TOKEN_ENV_VAR: &str = "DROPBOX_ACCESS_TOKEN";

/// File-backed configuration for harvester defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Default parent directory for staging directories.
    pub staging_dir: Option<PathBuf>,
    /// Base URL for listing endpoints.
    pub api_base_url: Option<String>,
    /// Base URL for download endpoints.
    pub content_base_url: Option<String>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP request timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        validate_base_url("api_base_url", self.api_base_url.as_deref())?;
        validate_base_url("content_base_url", self.content_base_url.as_deref())?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

fn validate_base_url(field: &str, value: Option<&str>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        bail!("Invalid config value for `{field}`: '{value}'. Expected an http(s) URL");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Tracing filter level for this setting.
    #[must_use]
    pub fn level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path, if one is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    fn empty(path: Option<PathBuf>) -> Self {
        Self { path, config: None }
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/pdf-harvester/config.toml`
/// 2. `$HOME/.config/pdf-harvester/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("pdf-harvester")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("pdf-harvester")
            .join("config.toml"),
    )
}

fn env_var_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config: Some(config),
            })
        }
        _ => Ok(LoadedConfig::empty(path)),
    }
}

/// Loads config from an explicitly requested path, which must exist.
pub fn load_explicit_file_config(path: &Path) -> Result<LoadedConfig> {
    let config = load_file_config(path)?;
    Ok(LoadedConfig {
        path: Some(path.to_path_buf()),
        config: Some(config),
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "staging_dir" => {
                cfg.staging_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            "api_base_url" => {
                cfg.api_base_url = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "content_base_url" => {
                cfg.content_base_url = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            "access_token" | "token" => {
                bail!(
                    "Config key '{key}' on line {line_no} is not supported: pass the token via --token or DROPBOX_ACCESS_TOKEN"
                );
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

/// Fully resolved runtime settings: CLI values win over file values, which
/// win over built-in defaults.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    /// Storage client settings (token, endpoints, timeouts).
    pub dropbox: DropboxSettings,
    /// Parent directory of the staging directory.
    pub staging_parent: PathBuf,
    /// Tracing filter level used when `RUST_LOG` is unset.
    pub log_level: &'static str,
}

impl RuntimeSettings {
    /// Merges CLI arguments with an optional file config.
    #[must_use]
    pub fn resolve(args: &Args, file_config: Option<&FileConfig>) -> Self {
        let file = file_config.cloned().unwrap_or_default();
        let defaults = DropboxSettings::default();

        let dropbox = DropboxSettings {
            access_token: args
                .token
                .clone()
                .or_else(|| env_var_non_empty(TOKEN_ENV_VAR)),
            api_base_url: args
                .api_url
                .clone()
                .or(file.api_base_url)
                .unwrap_or(defaults.api_base_url),
            content_base_url: args
                .content_url
                .clone()
                .or(file.content_base_url)
                .unwrap_or(defaults.content_base_url),
            connect_timeout_secs: args
                .connect_timeout
                .or(file.connect_timeout_secs)
                .unwrap_or(defaults.connect_timeout_secs),
            read_timeout_secs: args
                .read_timeout
                .or(file.read_timeout_secs)
                .unwrap_or(defaults.read_timeout_secs),
        };

        let staging_parent = args
            .staging_dir
            .clone()
            .or(file.staging_dir)
            .unwrap_or_else(env::temp_dir);

        Self {
            dropbox,
            staging_parent,
            log_level: resolve_log_level(args, file.verbosity),
        }
    }
}

/// Priority: quiet flag > verbose flag > config verbosity > default (info).
fn resolve_log_level(args: &Args, configured: Option<VerbositySetting>) -> &'static str {
    if args.quiet {
        return VerbositySetting::Quiet.level();
    }
    match args.verbose {
        0 => configured.unwrap_or(VerbositySetting::Default).level(),
        1 => VerbositySetting::Verbose.level(),
        _ => VerbositySetting::Debug.level(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["pdf-harvester"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
staging_dir = "/var/tmp/harvests"
verbosity = "verbose"
"#,
        )
        .expect("partial config should parse");
        assert_eq!(cfg.staging_dir, Some(PathBuf::from("/var/tmp/harvests")));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
        assert!(cfg.api_base_url.is_none());
    }

    #[test]
    fn test_parse_config_all_fields_with_comments() {
        let cfg = parse_config_str(
            r#"
# endpoints
api_base_url = "http://127.0.0.1:9000" # local proxy
content_base_url = "http://127.0.0.1:9001"
connect_timeout_secs = 5
read_timeout_secs = 120
verbosity = "quiet"
"#,
        )
        .expect("full config should parse");
        assert_eq!(cfg.api_base_url.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(cfg.content_base_url.as_deref(), Some("http://127.0.0.1:9001"));
        assert_eq!(cfg.connect_timeout_secs, Some(5));
        assert_eq!(cfg.read_timeout_secs, Some(120));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Quiet));
    }

    #[test]
    fn test_parse_config_rejects_out_of_range_timeout() {
        let err = parse_config_str("read_timeout_secs = 0").expect_err("invalid timeout expected");
        assert!(err.to_string().contains("read_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_trailing_tokens() {
        let err = parse_config_str("connect_timeout_secs = 4 trailing")
            .expect_err("expected trailing token error");
        assert!(err.to_string().contains("connect_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_non_http_url() {
        let err = parse_config_str(r#"api_base_url = "ftp://example.com""#)
            .expect_err("expected url validation error");
        assert!(err.to_string().contains("api_base_url"));
    }

    #[test]
    fn test_parse_config_rejects_token_keys() {
        let err = parse_config_str(r#"access_token = "secret""#)
            .expect_err("token in config must be rejected");
        assert!(err.to_string().contains("DROPBOX_ACCESS_TOKEN"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_key() {
        let err = parse_config_str("concurrency = 4").expect_err("unknown key expected");
        assert!(err.to_string().contains("Unknown configuration key"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("staging_dir").expect_err("syntax error expected");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_load_explicit_file_config_reads_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "read_timeout_secs = 60\n").unwrap();

        let loaded = load_explicit_file_config(&path).unwrap();
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.unwrap().read_timeout_secs, Some(60));
    }

    #[test]
    fn test_load_explicit_file_config_missing_file_errors() {
        let temp = TempDir::new().unwrap();
        let err = load_explicit_file_config(&temp.path().join("absent.toml"))
            .expect_err("missing explicit config must fail");
        assert!(format!("{err:#}").contains("Failed to read config file"));
    }

    #[test]
    fn test_resolve_cli_overrides_file_config() {
        let file = FileConfig {
            staging_dir: Some(PathBuf::from("/from/file")),
            connect_timeout_secs: Some(7),
            read_timeout_secs: Some(70),
            api_base_url: Some("http://file.example".to_string()),
            ..FileConfig::default()
        };
        let args = args(&["--staging-dir", "/from/cli", "--connect-timeout", "3", "--token", "t"]);

        let settings = RuntimeSettings::resolve(&args, Some(&file));

        assert_eq!(settings.staging_parent, PathBuf::from("/from/cli"));
        assert_eq!(settings.dropbox.connect_timeout_secs, 3);
        assert_eq!(settings.dropbox.read_timeout_secs, 70);
        assert_eq!(settings.dropbox.api_base_url, "http://file.example");
        assert_eq!(settings.dropbox.access_token.as_deref(), Some("t"));
    }

    #[test]
    fn test_resolve_defaults_without_file_config() {
        let settings = RuntimeSettings::resolve(&args(&[]), None);
        let defaults = DropboxSettings::default();

        assert_eq!(settings.staging_parent, env::temp_dir());
        assert_eq!(settings.dropbox.api_base_url, defaults.api_base_url);
        assert_eq!(settings.dropbox.content_base_url, defaults.content_base_url);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_resolve_log_level_priority() {
        let quiet_file = Some(VerbositySetting::Quiet);
        assert_eq!(resolve_log_level(&args(&[]), quiet_file), "error");
        assert_eq!(resolve_log_level(&args(&["-v"]), quiet_file), "debug");
        assert_eq!(resolve_log_level(&args(&["-vv"]), None), "trace");
        assert_eq!(resolve_log_level(&args(&["-q", "-v"]), None), "error");
        assert_eq!(
            resolve_log_level(&args(&[]), Some(VerbositySetting::Debug)),
            "trace"
        );
    }
}
