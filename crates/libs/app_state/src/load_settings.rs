use crate::{AppSettings, RawSettings};
use color_eyre::eyre::Result;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use config::builder::DefaultState;
use std::fs;
use std::path::Path;
use tracing::debug;

const SETTINGS_PATH: &str = "config/settings.yaml";

/// Loads `config/settings.yaml`, overridden by `APP__*` environment variables,
/// and makes sure the media and thumbnail folders exist.
pub fn load_app_settings() -> Result<AppSettings> {
    // Need to load from dotenv to get it to overwrite the settings from env.
    dotenv::from_path(".env").ok();
    let config_path = Path::new(SETTINGS_PATH).canonicalize()?;
    debug!("Loading settings from {}", config_path.display());

    let builder = Config::builder()
        .add_source(File::from(config_path))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );

    build_settings(builder)
}

/// Parses settings from a YAML document, without environment overrides.
pub fn load_app_settings_from_yaml(yaml: &str) -> Result<AppSettings> {
    build_settings(Config::builder().add_source(File::from_str(yaml, FileFormat::Yaml)))
}

fn build_settings(builder: ConfigBuilder<DefaultState>) -> Result<AppSettings> {
    let raw_settings = builder.build()?.try_deserialize::<RawSettings>()?;
    let settings = AppSettings::try_from(raw_settings)?;

    fs::create_dir_all(&settings.ingest.media_folder)?;
    fs::create_dir_all(&settings.ingest.thumbnail_folder)?;

    Ok(settings)
}
