use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use indoor_map_geometry::{TransformError, ViewTransform};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_PREFIX: &str = "INDOOR_MAP";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_SCALE: f64 = 15.0; // pixels per meter
const DEFAULT_OFFSET_X: f64 = 100.0;
const DEFAULT_OFFSET_Y: f64 = 100.0;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_BACKGROUND_PATH: &str = "assets/floor_plan.png";
const DEFAULT_WINDOW_TITLE: &str = "Indoor Map";
const DEFAULT_WINDOW_WIDTH: i32 = 800;
const DEFAULT_WINDOW_HEIGHT: i32 = 600;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("invalid view transform: {0}")]
    View(#[from] TransformError),
    #[error("invalid backend base url {url:?}: {reason}")]
    BaseUrl { url: String, reason: String },
    #[error("poll interval must be greater than zero")]
    PollInterval,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub backend: BackendSettings,
    pub view: ViewSettings,
    pub session: SessionSettings,
    pub window: WindowSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    pub base_url: String,
    /// Off unless set; requests otherwise wait for the transport default.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewSettings {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub poll_interval_ms: u64,
    pub background_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowSettings {
    pub title: String,
    pub width: i32,
    pub height: i32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        WindowSettings {
            title: DEFAULT_WINDOW_TITLE.to_string(),
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

impl Settings {
    pub fn view_transform(&self) -> Result<ViewTransform, TransformError> {
        ViewTransform::new(self.view.scale, self.view.offset_x, self.view.offset_y)
    }

    pub fn base_url(&self) -> Result<Url, SettingsError> {
        Url::parse(&self.backend.base_url).map_err(|e| SettingsError::BaseUrl {
            url: self.backend.base_url.clone(),
            reason: e.to_string(),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.session.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.backend.request_timeout_ms.map(Duration::from_millis)
    }

    /// Rejects anything that would only fail later, once the window is up.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.view_transform()?;
        self.base_url()?;
        if self.session.poll_interval_ms == 0 {
            return Err(SettingsError::PollInterval);
        }
        Ok(())
    }
}

/// Loads settings from built-in defaults, `config/default.toml` (optional)
/// and `INDOOR_MAP__SECTION__KEY` environment variables, in that order of precedence.
pub fn load_settings() -> Result<Settings, SettingsError> {
    info!("Attempting to load configuration from {}", DEFAULT_CONFIG_PATH);

    let builder = Config::builder()
        .add_source(File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml).required(false))
        .add_source(environment());

    match build_settings(builder) {
        Ok(settings) => {
            info!("Successfully loaded configuration: {:?}", settings);
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("backend.base_url", DEFAULT_BASE_URL)?
        .set_default("view.scale", DEFAULT_SCALE)?
        .set_default("view.offset_x", DEFAULT_OFFSET_X)?
        .set_default("view.offset_y", DEFAULT_OFFSET_Y)?
        .set_default("session.poll_interval_ms", DEFAULT_POLL_INTERVAL_MS as i64)?
        .set_default("session.background_path", DEFAULT_BACKGROUND_PATH)?
        .set_default("window.title", DEFAULT_WINDOW_TITLE)?
        .set_default("window.width", DEFAULT_WINDOW_WIDTH as i64)?
        .set_default("window.height", DEFAULT_WINDOW_HEIGHT as i64)
}

fn build_settings(builder: ConfigBuilder<DefaultState>) -> Result<Settings, SettingsError> {
    let settings: Settings = with_defaults(builder)?.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}
