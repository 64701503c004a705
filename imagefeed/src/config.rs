use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
    time::Duration,
};

use log::debug;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::from_str;

use crate::error::{Context, Error, Result};
use crate::models::AvatarSize;

pub const DEFAULT_PHOTOS_PER_PAGE: u32 = 10;

const CONFIG_FILE: &str = "imagefeed/config.json";

static CONFIG: OnceCell<Arc<RwLock<Config>>> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub oauth_token_url: String,
    pub access_key: String,
    pub secret_key: String,
    pub redirect_uri: String,
    pub photos_per_page: u32,
    pub avatar_size: AvatarSize,
    pub token_path: PathBuf,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(PathBuf::new)
            .join("imagefeed");
        Self {
            api_base_url: "https://api.unsplash.com/".to_string(),
            oauth_token_url: "https://unsplash.com/oauth/token".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            redirect_uri: "urn:ietf:wg:oauth:2.0:oob".to_string(),
            photos_per_page: DEFAULT_PHOTOS_PER_PAGE,
            avatar_size: AvatarSize::default(),
            token_path: config_dir.join("token.json"),
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Loads the configuration file, creating a default one in the local config
/// directory when none exists. Call once at startup.
///
/// # Errors
///
/// Fails if an existing file cannot be read or parsed, or if writing the
/// default file fails.
pub fn init() -> Result<()> {
    let config = load_or_create()?;
    // A second init keeps whatever the first one installed.
    let _ = CONFIG.set(Arc::new(RwLock::new(config)));
    Ok(())
}

/// Like [`init`] but reads an explicit file and never writes anything.
pub fn init_from(path: &Path) -> Result<()> {
    let config = load_from_file(path)?;
    let _ = CONFIG.set(Arc::new(RwLock::new(config)));
    Ok(())
}

/// Returns the process-wide configuration.
///
/// If neither `init` nor `init_from` ran, the known locations are searched
/// once; any failure there falls back to in-memory defaults.
pub fn get_config() -> Arc<RwLock<Config>> {
    CONFIG
        .get_or_init(|| {
            let config = load_from_files().unwrap_or_default();
            Arc::new(RwLock::new(config))
        })
        .clone()
}

/// Writes `config` to the local config directory and makes it current.
pub fn save_config(config: &Config) -> Result<()> {
    let path = local_config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(config)?)?;
    *get_config().write()? = config.clone();
    debug!("configuration saved to {}", path.display());
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).context("reading config file")?;
    let config: Config = from_str(&content).context("config file is malformed")?;
    if config.photos_per_page == 0 {
        return Err(Error::Other("photos_per_page must be positive".to_string()));
    }
    Ok(config)
}

fn load_from_files() -> Result<Config> {
    let config_path =
        find_config_file()?.ok_or(Error::Other("config file not found".to_string()))?;
    load_from_file(&config_path)
}

fn load_or_create() -> Result<Config> {
    if let Some(path) = find_config_file()? {
        return load_from_file(&path);
    }

    let config = Config::default();
    let config_local_path = local_config_path();
    if let Some(parent) = config_local_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_local_path, serde_json::to_string_pretty(&config)?)?;
    debug!(
        "Default configuration file created at: {:?}",
        config_local_path
    );

    Ok(config)
}

fn local_config_path() -> PathBuf {
    dirs::config_local_dir()
        .unwrap_or_else(PathBuf::new)
        .join(CONFIG_FILE)
}

fn find_config_file() -> Result<Option<PathBuf>> {
    let exe_path = std::env::current_exe()?;
    let exe_dir = exe_path.parent().unwrap_or(&exe_path);

    let paths = [
        local_config_path(),
        dirs::config_dir().unwrap_or_default().join(CONFIG_FILE),
        exe_dir.join(CONFIG_FILE),
    ];

    Ok(paths.into_iter().find(|p| p.exists()))
}
