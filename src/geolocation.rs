use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use strum::Display;
use thiserror::Error;
use tracing::{debug, error};
use ureq::{Agent, AgentBuilder};

const IP_API_URL: &str = "https://ipapi.co/json/";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinates {
    type Err = anyhow::Error;

    /// Parses `LAT,LNG`
    fn from_str(s: &str) -> Result<Self> {
        let Some((lat, lng)) = s.split_once(',') else {
            return Err(anyhow!("{s} is not in the form LAT,LNG"));
        };
        let latitude: f64 = lat.trim().parse()?;
        let longitude: f64 = lng.trim().parse()?;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(anyhow!("{s} is out of range"));
        }
        Ok(Self::new(latitude, longitude))
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("permission to access the location was denied")]
    PermissionDenied,
    #[error("the current position is unavailable")]
    PositionUnavailable,
    #[error("unable to determine the current position")]
    Other,
}

/// A source for the user's current position.
pub trait Geolocator {
    fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

#[derive(
    Clone, Copy, Debug, Default, Display, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GeolocationProvider {
    /// Estimate the position from the public IP address
    #[default]
    Ip,
    /// Use the configured latitude and longitude
    Fixed,
    /// No geolocation support
    None,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeolocationOptions {
    pub provider: GeolocationProvider,
    /// Whether SOSMe may look up your position at all
    pub allow: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            provider: GeolocationProvider::Ip,
            allow: true,
            latitude: None,
            longitude: None,
        }
    }
}

impl GeolocationOptions {
    pub fn fixed(&mut self, position: Coordinates) {
        self.provider = GeolocationProvider::Fixed;
        self.latitude = Some(position.latitude);
        self.longitude = Some(position.longitude);
    }
}

/// Build the configured geolocator. `None` means geolocation is unsupported.
pub fn from_options(opts: &GeolocationOptions) -> Result<Option<Box<dyn Geolocator>>> {
    let geolocator: Box<dyn Geolocator> = match opts.provider {
        GeolocationProvider::None => return Ok(None),
        _ if !opts.allow => Box::new(Denied),
        GeolocationProvider::Ip => Box::new(IpGeolocator::new()),
        GeolocationProvider::Fixed => {
            let (Some(latitude), Some(longitude)) = (opts.latitude, opts.longitude) else {
                return Err(anyhow!(
                    "The fixed geolocation provider needs a latitude and longitude"
                ));
            };
            Box::new(FixedPosition(Coordinates::new(latitude, longitude)))
        }
    };
    Ok(Some(geolocator))
}

#[derive(Debug)]
pub struct FixedPosition(pub Coordinates);

impl Geolocator for FixedPosition {
    fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// Refuses every request, used when location access isn't allowed.
#[derive(Debug)]
pub struct Denied;

impl Geolocator for Denied {
    fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::PermissionDenied)
    }
}

#[derive(Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    error: Option<bool>,
    reason: Option<String>,
}

#[derive(Debug)]
pub struct IpGeolocator {
    agent: Agent,
}

impl IpGeolocator {
    pub fn new() -> Self {
        let agent = AgentBuilder::new()
            .timeout_read(Duration::from_secs(5))
            .timeout_write(Duration::from_secs(5))
            .user_agent(concat!("sosme/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl Default for IpGeolocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Geolocator for IpGeolocator {
    fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        debug!("Fetching {IP_API_URL}");
        let response = match self.agent.get(IP_API_URL).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                error!("{code} from {IP_API_URL}");
                return Err(match code {
                    401 | 403 => GeolocationError::PermissionDenied,
                    _ => GeolocationError::Other,
                });
            }
            Err(ureq::Error::Transport(err)) => {
                error!("{err}");
                return Err(GeolocationError::PositionUnavailable);
            }
        };

        let body: IpApiResponse = response.into_json().map_err(|err| {
            error!("Invalid response from {IP_API_URL}: {err}");
            GeolocationError::Other
        })?;
        if body.error.unwrap_or(false) {
            error!("{}", body.reason.as_deref().unwrap_or("Unknown error"));
            return Err(GeolocationError::PositionUnavailable);
        }
        let (Some(latitude), Some(longitude)) = (body.latitude, body.longitude) else {
            return Err(GeolocationError::PositionUnavailable);
        };
        debug!(
            "Located near {} at {latitude},{longitude}",
            body.city.as_deref().unwrap_or("an unknown city")
        );
        Ok(Coordinates::new(latitude, longitude))
    }
}
