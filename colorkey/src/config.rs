use anyhow::{Context, Result, bail};
use chroma_key::{ChromaKeyConfig, MAX_TOLERANCE};
use image::Rgb;
use log::debug;
use once_cell::sync::Lazy;
use platform_dirs::AppDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::Mutex};

const CARGO_TOML: &str = include_str!("../Cargo.toml");
static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::default()));

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(skip)]
    pub cache_dir: PathBuf,

    #[serde(skip)]
    pub is_first_run: bool,

    #[serde(skip)]
    pub app_name: String,

    /// Catalog database, `<data dir>/<app>.db` when empty
    #[serde(default)]
    pub db_path: PathBuf,

    /// File the rendered frame is written to, `<cache dir>/preview.png` when empty
    #[serde(default)]
    pub preview_path: PathBuf,

    #[serde(default)]
    pub preference: Preference,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
pub struct Preference {
    #[derivative(Default(value = "10"))]
    pub default_tolerance: u8,

    #[derivative(Default(value = "[255, 255, 255]"))]
    pub default_target_rgb: [u8; 3],
}

impl Preference {
    /// Key settings a fresh session starts with
    pub fn key_config(&self) -> ChromaKeyConfig {
        let tolerance = if self.default_tolerance > MAX_TOLERANCE {
            log::warn!(
                "default_tolerance {} is out of range, using {MAX_TOLERANCE}",
                self.default_tolerance
            );
            MAX_TOLERANCE
        } else {
            self.default_tolerance
        };

        ChromaKeyConfig::new()
            .with_target(Rgb(self.default_target_rgb))
            .with_tolerance(tolerance)
    }
}

impl Config {
    /// Initializes the configuration
    ///
    /// Reads the package name, creates the application directories and
    /// loads the configuration file.
    pub fn init(&mut self) -> Result<()> {
        let metadata =
            toml::from_str::<toml::Table>(CARGO_TOML).with_context(|| "parse Cargo.toml failed")?;

        self.app_name = metadata
            .get("package")
            .and_then(|p| p.get("name"))
            .and_then(|n| n.as_str())
            .with_context(|| "package name missing in Cargo.toml")?
            .to_string();

        let app_dirs = AppDirs::new(Some(&self.app_name), true)
            .with_context(|| "no application directories on this platform")?;
        self.crate_dirs(&app_dirs)?;
        self.load().with_context(|| "load config file failed")?;
        self.fill_default_paths(&app_dirs);

        debug!("{:?}", self);
        Ok(())
    }

    fn crate_dirs(&mut self, app_dirs: &AppDirs) -> Result<()> {
        self.config_path = app_dirs.config_dir.join(format!("{}.toml", self.app_name));
        self.cache_dir = app_dirs.data_dir.join("cache");

        fs::create_dir_all(&app_dirs.data_dir)?;
        fs::create_dir_all(&app_dirs.config_dir)?;
        fs::create_dir_all(&self.cache_dir)?;

        Ok(())
    }

    fn fill_default_paths(&mut self, app_dirs: &AppDirs) {
        if self.db_path.as_os_str().is_empty() {
            self.db_path = app_dirs.data_dir.join(format!("{}.db", self.app_name));
        }

        if self.preview_path.as_os_str().is_empty() {
            self.preview_path = self.cache_dir.join("preview.png");
        }
    }

    /// Loads configuration from file or writes the defaults if it is missing or broken
    fn load(&mut self) -> Result<()> {
        match fs::read_to_string(&self.config_path) {
            Ok(text) => match toml::from_str::<Config>(&text) {
                Ok(mut c) => {
                    c.config_path = self.config_path.clone();
                    c.cache_dir = self.cache_dir.clone();
                    c.is_first_run = self.is_first_run;
                    c.app_name = self.app_name.clone();
                    *self = c;

                    Ok(())
                }
                Err(e) => {
                    log::warn!("invalid config {}: {e}", self.config_path.display());
                    self.write_defaults()
                }
            },
            Err(_) => self.write_defaults(),
        }
    }

    fn write_defaults(&mut self) -> Result<()> {
        self.is_first_run = true;

        if self.config_path.exists() {
            let mut bak_file = self.config_path.clone().into_os_string();
            bak_file.push(".bak");
            _ = fs::copy(&self.config_path, bak_file);
        }

        self.save()
    }

    /// Saves the current configuration to file
    pub fn save(&self) -> Result<()> {
        match toml::to_string_pretty(self) {
            Ok(text) => Ok(fs::write(&self.config_path, text)
                .with_context(|| "save config failed".to_string())?),
            Err(e) => bail!(format!("convert config from toml format failed. {e:?}")),
        }
    }
}

/// Initializes the global configuration
///
/// This should be called once at application startup.
pub fn init() -> Result<()> {
    CONFIG.lock().unwrap().init()
}

/// Returns a clone of the current configuration
pub fn all() -> Config {
    CONFIG.lock().unwrap().clone()
}
