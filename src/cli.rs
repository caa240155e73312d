use crate::client::Client;
use crate::config::Config;
use crate::geolocation::{self, Coordinates};
use crate::i18n::LanguageBundle;
use crate::loader::ScriptLoader;
use crate::logging::{setup_logging, LogLevel};
use crate::render::{rows, table, RowOptions};
use crate::search::{ConsoleNotifier, SearchError, SearchPage};
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use inquire::{Select, Text};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

fn default(path: &Path) -> String {
    format!("[default: {}]", path.as_os_str().to_string_lossy())
}

/// Find the nearest services that can help you
#[derive(Parser, Serialize, Deserialize)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long = "config", value_name = "FILE", help = default(&Config::default_path()))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,

    /// [default: info]
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    log_level: Option<LogLevel>,

    /// Google Maps API key (overrides config)
    #[arg(short, long = "key", value_name = "KEY")]
    #[serde(skip_serializing_if = "Option::is_none")]
    maps_key: Option<String>,

    /// Locale used to pick the language e.g. pt-BR
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<String>,

    /// Search radius in metres [default: 5000]
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    radius: Option<u32>,

    /// Search around LAT,LNG instead of looking up your position
    #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
    #[serde(skip)]
    pub at: Option<Coordinates>,

    /// Link a photo of each place
    #[arg(short, long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    photos: bool,

    #[command(subcommand)]
    #[serde(skip)]
    command: Option<Commands>,
}

// The API key is kept out of the log.
impl fmt::Debug for Cli {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Cli")
            .field("config_path", &self.config_path)
            .field("log_level", &self.log_level)
            .field("maps_key", &self.maps_key.as_ref().map(|_| "***"))
            .field("locale", &self.locale)
            .field("radius", &self.radius)
            .field("at", &self.at)
            .field("photos", &self.photos)
            .field("command", &self.command)
            .finish()
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search for services near you
    Search {
        /// What you need e.g. mechanic. Prompts when missing
        query: Option<String>,
    },
    /// Pick one of the suggested services and search for it
    Keywords,
    /// Print the position searches are made from
    Locate,
    /// Open the config file in your editor
    Config,
}

pub fn cli() -> Result<()> {
    let args = Cli::parse();

    let mut config = Config::from_cli(&args)?;
    if let Some(level) = args.log_level {
        config.main.logging.console_level = level;
        config.main.logging.file_level = level;
    }
    let _guard = setup_logging(&config.main.logging);
    debug!("Command line arguments: {:#?}", &args);

    let bundle = config.language().bundle();
    match &args.command {
        Some(Commands::Search { query }) => {
            let query = match query {
                Some(q) => q.to_owned(),
                None => prompt_query(bundle)?,
            };
            search(&config, bundle, Input::Query(&query))?
        }
        Some(Commands::Keywords) => {
            let keyword = Select::new(&bundle.keywords_prompt, bundle.keywords.clone()).prompt()?;
            search(&config, bundle, Input::Keyword(&keyword))?
        }
        Some(Commands::Locate) => locate(&config, bundle)?,
        Some(Commands::Config) => config.edit()?,
        None => {
            let query = prompt_query(bundle)?;
            search(&config, bundle, Input::Query(&query))?
        }
    }
    Ok(())
}

enum Input<'a> {
    Query(&'a str),
    Keyword(&'a str),
}

fn prompt_query(bundle: &LanguageBundle) -> Result<String> {
    loop {
        let input = Text::new(&bundle.search_button)
            .with_placeholder(&bundle.placeholder)
            .prompt()?;
        if !input.trim().is_empty() {
            return Ok(input.trim().to_string());
        }
    }
}

fn search(config: &Config, bundle: &'static LanguageBundle, input: Input) -> Result<()> {
    let key = config.main.maps_key.as_deref().unwrap_or_default();
    let mut client = Client::new(key);
    let mut loader = ScriptLoader::places(key);
    let loaded = if key.is_empty() {
        warn!("No Maps API key configured. Set maps_key in the config file or SOSME_MAPS_KEY");
        false
    } else {
        loader.load(&mut client).unwrap_or_else(|err| {
            error!("Unable to load the places library: {err:#}");
            false
        })
    };

    let geolocator = geolocation::from_options(&config.main.geolocation)?;
    let language = config.language().to_string();
    let mut page = SearchPage::new(&client, ConsoleNotifier::stdout(), bundle)
        .with_geolocator(geolocator.as_deref())
        .with_radius(config.main.radius)
        .with_language(&language);
    page.set_loaded(loaded);

    println!("{}\n{}\n", bundle.title, bundle.header);
    match input {
        Input::Query(query) => {
            page.set_query(query);
            page.submit();
        }
        Input::Keyword(keyword) => {
            page.select_keyword(keyword);
        }
    }

    let results = &page.form().results;
    if !results.is_empty() {
        let photos = config.main.photos.then_some((key, config.main.photo_max_width));
        let opts = RowOptions {
            origin: page.position(),
            photos,
        };
        println!("{}", table(&rows(results, opts), bundle));
    }
    println!("\n{}", bundle.footer);
    Ok(())
}

fn locate(config: &Config, bundle: &LanguageBundle) -> Result<()> {
    let Some(geolocator) = geolocation::from_options(&config.main.geolocation)? else {
        return Err(anyhow!("{}", bundle.messages.unsupported));
    };
    match geolocator.current_position() {
        Ok(position) => {
            println!("{position}");
            Ok(())
        }
        Err(err) => {
            let message = SearchError::from(err).message(&bundle.messages).to_string();
            Err(anyhow!(message))
        }
    }
}
