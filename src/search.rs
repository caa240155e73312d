use crate::geolocation::{Coordinates, GeolocationError, Geolocator};
use crate::i18n::{LanguageBundle, Messages};
use crate::places::{PlaceResult, PlacesSearch, PlacesStatus, TextSearchRequest};
use crate::ranking::rank;
use std::io::{self, Write};
use strum::Display;
use thiserror::Error;
use tracing::{debug, error, warn};

pub const DEFAULT_RADIUS: u32 = 5000;

#[derive(Debug, Clone, Copy, Display, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

/// Shows short messages to the user.
pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// Prints notices regardless of the log level. Errors go through the log.
#[derive(Debug)]
pub struct ConsoleNotifier<W = io::Stdout> {
    out: W,
}

impl ConsoleNotifier {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for ConsoleNotifier<W> {
    fn notify(&mut self, notice: Notice) {
        match notice.severity {
            Severity::Info | Severity::Success => {
                if let Err(err) = writeln!(self.out, "{}", notice.message) {
                    error!("Unable to print notice: {err}");
                }
            }
            Severity::Error => error!("{}", notice.message),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchError {
    #[error("geolocation is not supported")]
    GeolocationUnsupported,
    #[error(transparent)]
    Geolocation(#[from] GeolocationError),
    #[error("the places query limit was exceeded")]
    QueryLimit,
    #[error("places search returned {0}")]
    Places(PlacesStatus),
    #[error("places search failed: {0}")]
    Transport(String),
}

impl SearchError {
    pub fn message<'a>(&self, messages: &'a Messages) -> &'a str {
        match self {
            Self::GeolocationUnsupported => &messages.unsupported,
            Self::Geolocation(GeolocationError::PermissionDenied) => &messages.permission_denied,
            Self::Geolocation(GeolocationError::PositionUnavailable) => {
                &messages.position_unavailable
            }
            Self::Geolocation(GeolocationError::Other) => &messages.location_failed,
            Self::QueryLimit => &messages.query_limit,
            Self::Places(_) | Self::Transport(_) => &messages.search_failed,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SearchForm {
    pub query: String,
    pub is_loading: bool,
    pub results: Vec<PlaceResult>,
}

/// Identifies one search. Only the newest ticket may change the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Found {
    pub position: Coordinates,
    pub results: Vec<PlaceResult>,
}

pub type Outcome = Result<Found, SearchError>;

pub struct SearchPage<'a, N> {
    form: SearchForm,
    generation: u64,
    loaded: bool,
    radius: u32,
    language: Option<String>,
    position: Option<Coordinates>,
    bundle: &'static LanguageBundle,
    places: &'a dyn PlacesSearch,
    geolocator: Option<&'a dyn Geolocator>,
    notifier: N,
}

impl<'a, N: Notifier> SearchPage<'a, N> {
    pub fn new(places: &'a dyn PlacesSearch, notifier: N, bundle: &'static LanguageBundle) -> Self {
        Self {
            form: SearchForm::default(),
            generation: 0,
            loaded: false,
            radius: DEFAULT_RADIUS,
            language: None,
            position: None,
            bundle,
            places,
            geolocator: None,
            notifier,
        }
    }

    pub fn with_geolocator(mut self, geolocator: Option<&'a dyn Geolocator>) -> Self {
        self.geolocator = geolocator;
        self
    }

    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    /// Ask the API for results in this language.
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    pub fn form(&self) -> &SearchForm {
        &self.form
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Where the last successful search was made from.
    pub fn position(&self) -> Option<Coordinates> {
        self.position
    }

    pub fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    pub fn set_query(&mut self, query: &str) {
        self.form.query = query.to_string();
    }

    pub fn can_submit(&self) -> bool {
        self.loaded && !self.form.is_loading
    }

    pub fn submit(&mut self) -> bool {
        let Some(ticket) = self.begin() else {
            return false;
        };
        let outcome = self.execute(ticket);
        self.complete(ticket, outcome)
    }

    /// Same as typing the keyword and submitting.
    pub fn select_keyword(&mut self, keyword: &str) -> bool {
        self.set_query(keyword);
        self.submit()
    }

    /// Start a search if one is allowed, moving the form into the loading state.
    pub fn begin(&mut self) -> Option<Ticket> {
        if !self.loaded {
            warn!("The places library hasn't loaded, ignoring search");
            return None;
        }
        if self.form.is_loading {
            debug!("A search is already running, ignoring search");
            return None;
        }
        if self.geolocator.is_none() {
            self.notify_error(&SearchError::GeolocationUnsupported);
            return None;
        }
        self.form.is_loading = true;
        self.generation += 1;
        debug!("Starting search {} for {:?}", self.generation, self.form.query);
        Some(Ticket {
            generation: self.generation,
        })
    }

    /// Locate the user and run the text search. Doesn't touch the form.
    pub fn execute(&self, ticket: Ticket) -> Outcome {
        let geolocator = self
            .geolocator
            .ok_or(SearchError::GeolocationUnsupported)?;
        let position = geolocator.current_position()?;
        debug!("Search {} located at {position}", ticket.generation);

        let request = TextSearchRequest {
            query: self.form.query.clone(),
            location: position,
            radius: self.radius,
            language: self.language.clone(),
        };
        let response = self
            .places
            .text_search(&request)
            .map_err(|err| SearchError::Transport(format!("{err:#}")))?;
        match response.status {
            PlacesStatus::Ok => Ok(Found {
                position,
                results: response.results,
            }),
            PlacesStatus::OverQueryLimit => Err(SearchError::QueryLimit),
            status => Err(SearchError::Places(status)),
        }
    }

    /// Apply the outcome of a search. Outcomes from anything but the latest
    /// search are dropped. Returns whether the outcome was applied.
    pub fn complete(&mut self, ticket: Ticket, outcome: Outcome) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "Dropping stale search {} (latest is {})",
                ticket.generation, self.generation
            );
            return false;
        }
        self.form.is_loading = false;
        match outcome {
            Ok(Found {
                position,
                mut results,
            }) => {
                let message = self.bundle.messages.found(results.len());
                self.notifier.notify(Notice {
                    severity: Severity::Success,
                    message,
                });
                rank(&mut results);
                self.form.results = results;
                self.position = Some(position);
            }
            Err(err) => {
                debug!("Search {} failed: {err}", ticket.generation);
                self.notify_error(&err);
            }
        }
        true
    }

    fn notify_error(&mut self, err: &SearchError) {
        let message = err.message(&self.bundle.messages).to_string();
        self.notifier.notify(Notice {
            severity: Severity::Error,
            message,
        });
    }
}
