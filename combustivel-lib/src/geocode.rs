use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use log::debug;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use url::Url;
use crate::error::GeocodeError;

pub static NOMINATIM_ENDPOINT: &'static str = "https://nominatim.openstreetmap.org/search";

pub static USER_AGENT_VALUE: &'static str = "preco_combustivel";

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Forward geocoding: a free-form postal address to a coordinate pair.
///
/// `Ok(None)` means the service answered and knows no such place; `Err` covers
/// everything that kept it from answering.
pub trait Geocoder: Send + Sync {
    fn forward(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

#[derive(Clone, Debug)]
pub struct NominatimSettings {
    pub endpoint: String,
    pub user_agent: String,
    pub country_codes: Option<String>,
    pub timeout: Duration,
}

impl Default for NominatimSettings {
    fn default() -> Self {
        Self {
            endpoint: NOMINATIM_ENDPOINT.to_string(),
            user_agent: USER_AGENT_VALUE.to_string(),
            country_codes: Some("br".to_string()),
            timeout: Duration::from_secs(10),
        }
    }
}

/// OpenStreetMap Nominatim search, one blocking request per lookup.
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    endpoint: Url,
    user_agent: String,
    country_codes: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Place {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    /// Must not be called from inside an async runtime.
    pub fn new(settings: NominatimSettings) -> Result<Self, GeocodeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: Url::parse(&settings.endpoint)?,
            user_agent: settings.user_agent,
            country_codes: settings.country_codes.filter(|codes| !codes.is_empty()),
        })
    }

    fn search_url(&self, address: &str) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("q", address)
                .append_pair("format", "jsonv2")
                .append_pair("limit", "1");
            if let Some(codes) = &self.country_codes {
                query.append_pair("countrycodes", codes);
            }
        }
        url
    }
}

impl Geocoder for NominatimGeocoder {
    fn forward(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let url = self.search_url(address);
        debug!("geocoding {}", url);

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        parse_search_response(&response.text()?)
    }
}

fn parse_search_response(body: &str) -> Result<Option<Coordinates>, GeocodeError> {
    let places: Vec<Place> =
        serde_json::from_str(body).map_err(|err| GeocodeError::Decode(err.to_string()))?;

    let place = match places.into_iter().next() {
        Some(place) => place,
        None => return Ok(None),
    };

    let latitude = place.lat.trim().parse::<f64>();
    let longitude = place.lon.trim().parse::<f64>();
    match (latitude, longitude) {
        (Ok(latitude), Ok(longitude)) => Ok(Some(Coordinates { latitude, longitude })),
        _ => Err(GeocodeError::Decode(format!(
            "bad coordinates {}, {}",
            place.lat, place.lon
        ))),
    }
}

/// Remembers answers per address string. Transport failures are not
/// remembered, so the next call for that address goes out again.
pub struct CachingGeocoder<G> {
    inner: G,
    cache: Mutex<HashMap<String, Option<Coordinates>>>,
}

impl<G: Geocoder> CachingGeocoder<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<G: Geocoder> Geocoder for CachingGeocoder<G> {
    fn forward(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        if let Ok(cache) = self.cache.lock() {
            if let Some(hit) = cache.get(address) {
                debug!("geocode cache hit for {}", address);
                return Ok(*hit);
            }
        }

        let answer = self.inner.forward(address)?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(address.to_string(), answer);
            debug!("geocode cache holds {} addresses", cache.len());
        }

        Ok(answer)
    }
}
