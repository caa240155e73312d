use crate::loader::{Script, ScriptHost};
use crate::places::{PlacesResponse, PlacesSearch, TextSearchRequest};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::thread::sleep;
use std::time::Duration;
use tracing::{debug, error, warn};
use ureq::{Agent, AgentBuilder, Error, Request, Response};
use url::Url;

const URL_BASE: &str = "https://maps.googleapis.com/maps/api/place";
const USER_AGENT: &str = concat!("sosme/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct Client {
    client: Agent,
    key: String,
    retry_limit: u64,
    retry_delay: u64,
    /// Attached scripts and whether they finished loading
    scripts: HashMap<String, bool>,
}

impl Client {
    pub fn new(key: &str) -> Client {
        let client = AgentBuilder::new()
            .timeout_read(Duration::from_secs(10))
            .timeout_write(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build();
        Client {
            client,
            key: key.to_string(),
            retry_limit: 3,
            retry_delay: 2,
            scripts: HashMap::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    // URLs carry the API key so only the name of the endpoint is logged.
    fn call(&self, name: &str, request: Request) -> Result<Response> {
        debug!("Fetching {name}");
        let mut attempts = 0;
        while attempts < self.retry_limit {
            match request.clone().call() {
                Ok(response) => return Ok(response),
                Err(Error::Status(code, response)) => match code {
                    503 | 429 | 408 => {
                        let retry = match response.header("retry-after") {
                            Some(header) => header.parse()?,
                            None => self.retry_delay,
                        };
                        warn!("{code} for {name}, retry in {retry}s");
                        attempts += 1;
                        sleep(Duration::from_secs(retry));
                    }
                    _ => {
                        let error = response.into_string()?;
                        error!("{code}: {error}");
                        return Err(anyhow!("{name} returned {code}"));
                    }
                },
                Err(Error::Transport(err)) => {
                    let error = err.to_string();
                    error!("{error}");
                    if let Some(message) = err.message() {
                        error!("{message}");
                    }
                    return Err(anyhow!("{error}"));
                }
            }
        }
        Err(anyhow!("Retry limit exceeded for {name}"))
    }
}

/// The text search endpoint with every parameter the request maps to.
fn text_search_url(key: &str, request: &TextSearchRequest) -> Result<Url> {
    let mut params = vec![
        ("query", request.query.clone()),
        ("location", request.location.to_string()),
        ("radius", request.radius.to_string()),
        ("key", key.to_string()),
    ];
    if let Some(language) = &request.language {
        params.push(("language", language.clone()));
    }
    Ok(Url::parse_with_params(
        &format!("{URL_BASE}/textsearch/json"),
        &params,
    )?)
}

impl PlacesSearch for Client {
    fn text_search(&self, request: &TextSearchRequest) -> Result<PlacesResponse> {
        let url = text_search_url(&self.key, request)?;
        let http = self.client.request_url("GET", &url);
        let response: PlacesResponse = self.call("place/textsearch", http)?.into_json()?;
        debug!(
            "Text search for {:?} returned {} with {} results",
            request.query,
            response.status,
            response.results.len()
        );
        if let Some(message) = &response.error_message {
            error!("{message}");
        }
        if response.next_page_token.is_some() {
            debug!("More results are available but only the first page is used");
        }
        Ok(response)
    }
}

impl ScriptHost for Client {
    fn contains(&self, id: &str) -> bool {
        self.scripts.contains_key(id)
    }

    fn is_loaded(&self, id: &str) -> bool {
        self.scripts.get(id).copied().unwrap_or(false)
    }

    fn append(&mut self, script: &Script) -> Result<()> {
        self.scripts.insert(script.id.clone(), false);
        let loaded = self
            .call(&script.id, self.client.get(&script.src))
            .and_then(|response| Ok(response.into_string()?));
        match loaded {
            Ok(body) => {
                debug!("{} is {} bytes", script.id, body.len());
                self.scripts.insert(script.id.clone(), true);
                Ok(())
            }
            Err(err) => {
                self.scripts.remove(&script.id);
                Err(err)
            }
        }
    }
}
