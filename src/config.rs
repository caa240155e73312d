use crate::cli::Cli;
use crate::geolocation::GeolocationOptions;
use crate::i18n::Language;
use crate::logging::LoggingOptions;
use crate::search::DEFAULT_RADIUS;
use anyhow::Result;
use etcetera::{choose_app_strategy, AppStrategy, AppStrategyArgs};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,
    pub main: MainConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: Self::default_path(),
            main: MainConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MainConfig {
    /// Google Maps API key with the Places API enabled
    pub maps_key: Option<String>,
    /// Search radius in metres
    pub radius: u32,
    /// Overrides the locale reported by the environment
    pub locale: Option<String>,
    /// Link a photo of each place
    pub photos: bool,
    pub photo_max_width: u32,
    pub geolocation: GeolocationOptions,
    pub logging: LoggingOptions,
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            maps_key: None,
            radius: DEFAULT_RADIUS,
            locale: None,
            photos: false,
            photo_max_width: 400,
            geolocation: GeolocationOptions::default(),
            logging: LoggingOptions::default(),
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        let mut path = PathBuf::from(&Self::default_dirs().config);
        path.push("config.yml");
        path
    }

    pub fn default_dirs() -> &'static DefaultDirs {
        DEFAULT_DIRS.get_or_init(|| {
            let strategy = choose_app_strategy(AppStrategyArgs {
                top_level_domain: "org".to_string(),
                author: "sublipri".to_string(),
                app_name: "SOSMe".to_string(),
            })
            .expect("unable to find the home directory");
            DefaultDirs {
                config: strategy.config_dir(),
            }
        })
    }

    pub fn from_path(config_path: &Path) -> Result<Self> {
        let main = Self::figment(config_path).extract()?;
        Ok(Self {
            config_path: config_path.to_owned(),
            main,
        })
    }

    pub fn from_cli(args: &Cli) -> Result<Self> {
        let config_path = if let Some(path) = &args.config_path {
            path.to_owned()
        } else {
            Self::default_path().to_owned()
        };

        let mut main: MainConfig = Self::figment(&config_path)
            .merge(Serialized::defaults(args))
            .extract()?;
        if let Some(position) = args.at {
            main.geolocation.fixed(position);
        }

        Ok(Config { config_path, main })
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(MainConfig::default()))
            .merge(Yaml::file(config_path))
            .merge(Env::prefixed("SOSME_").split("__"))
    }

    pub fn language(&self) -> Language {
        Language::detect(self.main.locale.as_deref())
    }

    pub fn write_config_file(&self) -> Result<()> {
        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let yaml = serde_yaml::to_string(&self.main)?;
        fs::write(&self.config_path, yaml)?;
        info!("Wrote {}", self.config_path.display());
        Ok(())
    }

    /// Open the config file in the user's editor, creating it first if needed.
    pub fn edit(&self) -> Result<()> {
        if !self.config_path.exists() {
            self.write_config_file()?;
        }
        edit::edit_file(&self.config_path)?;
        Ok(())
    }
}

static DEFAULT_DIRS: OnceCell<DefaultDirs> = OnceCell::new();

#[derive(Debug, Deserialize, Serialize)]
pub struct DefaultDirs {
    pub config: PathBuf,
}
