//! Site build command.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use quire_markdown::ConvertOptions;
use quire_site::{BuildConfig, SiteBuilder};
use serde::Deserialize;

/// Config file looked up under the site root.
pub const CONFIG_FILE: &str = "quire.toml";

/// Environment variable that toggles clearing build/ before a run.
pub const ERASE_ENV: &str = "ERASE_BUILD";

/// Configuration file structure (quire.toml).
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    build: BuildSettings,
    #[serde(default)]
    markdown: MarkdownSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct BuildSettings {
    erase: bool,
    default_template: String,
    template_extension: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            erase: true,
            default_template: "base".to_string(),
            template_extension: "html".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MarkdownSettings {
    tables: bool,
    footnotes: bool,
    strikethrough: bool,
    tasklists: bool,
    heading_ids: bool,
}

impl Default for MarkdownSettings {
    fn default() -> Self {
        let options = ConvertOptions::default();
        Self {
            tables: options.tables,
            footnotes: options.footnotes,
            strikethrough: options.strikethrough,
            tasklists: options.tasklists,
            heading_ids: options.heading_ids,
        }
    }
}

impl From<MarkdownSettings> for ConvertOptions {
    fn from(settings: MarkdownSettings) -> Self {
        Self {
            tables: settings.tables,
            footnotes: settings.footnotes,
            strikethrough: settings.strikethrough,
            tasklists: settings.tasklists,
            heading_ids: settings.heading_ids,
        }
    }
}

/// Load configuration from `explicit`, or from quire.toml under `root`.
///
/// A missing quire.toml means defaults; a named config file must exist.
/// Returns an error if the config file exists but is malformed.
fn load_config(root: &Path, explicit: Option<&Path>) -> Result<ConfigFile> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file {} not found", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = root.join(CONFIG_FILE);
            if !path.exists() {
                return Ok(ConfigFile::default());
            }
            path
        }
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());

    Ok(config)
}

/// Parse a boolean-ish environment value.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Decide whether to clear build/: CLI flag, then environment, then config file.
fn resolve_erase(config_value: bool, env_value: Option<&str>, no_erase: bool) -> bool {
    if no_erase {
        return false;
    }

    match env_value {
        Some(raw) => parse_flag(raw).unwrap_or_else(|| {
            tracing::warn!(
                "Ignoring {}={:?}: expected true/false, 1/0, yes/no or on/off",
                ERASE_ENV,
                raw
            );
            config_value
        }),
        None => config_value,
    }
}

/// Assemble the build configuration for a site root.
fn build_config(
    root: &Path,
    file_config: ConfigFile,
    env_erase: Option<&str>,
    no_erase: bool,
) -> BuildConfig {
    BuildConfig {
        erase_output: resolve_erase(file_config.build.erase, env_erase, no_erase),
        default_template: file_config.build.default_template,
        template_extension: file_config.build.template_extension,
        markdown: file_config.markdown.into(),
        ..BuildConfig::from_root(root)
    }
}

/// Run the build command.
pub async fn run(root: &Path, config_path: Option<&Path>, no_erase: bool) -> Result<()> {
    tracing::info!("Building...");

    let file_config = load_config(root, config_path)?;

    let env_erase = std::env::var(ERASE_ENV).ok();
    let config = build_config(root, file_config, env_erase.as_deref(), no_erase);

    let result = SiteBuilder::new(config)
        .build()
        .await
        .context("Build failed")?;

    tracing::info!(
        "Built {} pages and copied {} static files in {}ms",
        result.pages,
        result.assets,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
