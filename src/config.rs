//! Configuration for voxtract paths and extraction defaults.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (applied by the CLI on top of this)
//! 2. Environment variables (VOXTRACT_INDEX, VOXTRACT_SOURCE, VOXTRACT_OUTPUT)
//! 3. Project config file (.voxtract/config.yaml)
//! 4. User config file (<config dir>/voxtract/config.yaml)
//! 5. Defaults (no paths, `wem` assets, `voice_data.json` metadata)
//!
//! Config file discovery:
//! - Searches current directory and parents for .voxtract/config.yaml
//! - Paths in a project config file are relative to the directory holding .voxtract/
//! - Paths in the user config file are relative to the user's home directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::{DEFAULT_EXTENSION, DEFAULT_METADATA_FILE};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

pub const ENV_INDEX: &str = "VOXTRACT_INDEX";
pub const ENV_SOURCE: &str = "VOXTRACT_SOURCE";
pub const ENV_OUTPUT: &str = "VOXTRACT_OUTPUT";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub extract: Option<ExtractConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Voice index JSON
    pub index: Option<String>,
    /// Root of the audio dump
    pub source: Option<String>,
    /// Where per-character folders are created
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    pub extension: Option<String>,
    pub metadata_file: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub index: Option<PathBuf>,
    pub source: Option<PathBuf>,
    pub output: Option<PathBuf>,
    /// Audio asset extension, without the dot
    pub extension: String,
    /// Per-character metadata file name
    pub metadata_file: String,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            index: None,
            source: None,
            output: None,
            extension: DEFAULT_EXTENSION.to_string(),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            config_file: None,
        }
    }
}

/// Find a project config file by searching `start` and its parents
fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".voxtract").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Per-user config file, if present
fn find_user_config() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("voxtract").join("config.yaml");
    path.exists().then_some(path)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's base directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Directory that relative paths in `config_path` are resolved against
fn base_dir_for(config_path: &Path, is_project: bool) -> PathBuf {
    if is_project {
        // Parent of .voxtract/ (i.e., grandparent of config.yaml)
        config_path
            .parent()
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."))
            .to_path_buf()
    } else {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Merge a parsed config file and environment lookups into a resolved config
fn resolve(
    file: Option<(&Path, &ConfigFile)>,
    base_dir: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let mut resolved = ResolvedConfig::default();

    if let Some((path, config)) = file {
        resolved.config_file = Some(path.to_path_buf());
        resolved.index = config.paths.index.as_deref().map(|p| resolve_path(base_dir, p));
        resolved.source = config.paths.source.as_deref().map(|p| resolve_path(base_dir, p));
        resolved.output = config.paths.output.as_deref().map(|p| resolve_path(base_dir, p));

        if let Some(extract) = &config.extract {
            if let Some(ext) = &extract.extension {
                resolved.extension = ext.trim_start_matches('.').to_string();
            }
            if let Some(name) = &extract.metadata_file {
                resolved.metadata_file = name.clone();
            }
        }
    }

    let from_env = |key: &str| env(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);
    if let Some(index) = from_env(ENV_INDEX) {
        resolved.index = Some(index);
    }
    if let Some(source) = from_env(ENV_SOURCE) {
        resolved.source = Some(source);
    }
    if let Some(output) = from_env(ENV_OUTPUT) {
        resolved.output = Some(output);
    }

    resolved
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;

    let found = find_project_config(&cwd)
        .map(|path| (path, true))
        .or_else(|| find_user_config().map(|path| (path, false)));

    let env = |key: &str| std::env::var(key).ok();

    match found {
        Some((path, is_project)) => {
            let config = load_config_file(&path)?;
            let base = base_dir_for(&path, is_project);
            Ok(resolve(Some((path.as_path(), &config)), &base, env))
        }
        None => Ok(resolve(None, &cwd, env)),
    }
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(None, Path::new("/work"), no_env);

        assert_eq!(config, ResolvedConfig::default());
        assert_eq!(config.extension, "wem");
        assert_eq!(config.metadata_file, "voice_data.json");
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let voxtract_dir = temp.path().join(".voxtract");
        std::fs::create_dir_all(&voxtract_dir).unwrap();

        let config_path = voxtract_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  index: data/voice.json
  source: /dump/wem
extract:
  extension: .ogg
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.paths.index, Some("data/voice.json".to_string()));
        assert_eq!(config.paths.output, None);

        let base = base_dir_for(&config_path, true);
        assert_eq!(base, temp.path());

        let resolved = resolve(Some((config_path.as_path(), &config)), &base, no_env);
        assert_eq!(resolved.index, Some(temp.path().join("data/voice.json")));
        assert_eq!(resolved.source, Some(PathBuf::from("/dump/wem")));
        assert_eq!(resolved.output, None);
        assert_eq!(resolved.extension, "ogg");
        assert_eq!(resolved.metadata_file, "voice_data.json");
        assert_eq!(resolved.config_file, Some(config_path));
    }

    #[test]
    fn test_env_overrides_file() {
        let config = ConfigFile {
            version: "1.0".to_string(),
            paths: PathsConfig {
                index: Some("/from/file.json".to_string()),
                source: Some("/from/file".to_string()),
                output: None,
            },
            extract: None,
        };

        let env = |key: &str| match key {
            ENV_SOURCE => Some("/from/env".to_string()),
            ENV_OUTPUT => Some("   ".to_string()),
            _ => None,
        };

        let resolved = resolve(
            Some((Path::new("/p/.voxtract/config.yaml"), &config)),
            Path::new("/p"),
            env,
        );
        assert_eq!(resolved.index, Some(PathBuf::from("/from/file.json")));
        assert_eq!(resolved.source, Some(PathBuf::from("/from/env")));
        // Blank env values are ignored
        assert_eq!(resolved.output, None);
    }

    #[test]
    fn test_find_project_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let voxtract_dir = temp.path().join(".voxtract");
        std::fs::create_dir_all(&voxtract_dir).unwrap();
        std::fs::write(voxtract_dir.join("config.yaml"), "version: \"1.0\"\n").unwrap();

        let nested = temp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            find_project_config(&nested),
            Some(voxtract_dir.join("config.yaml"))
        );
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
