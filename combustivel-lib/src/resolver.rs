use log::{debug, info, warn};
use serde::Serialize;
use crate::geocode::{Coordinates, Geocoder};
use crate::station::StationRecord;

/// A station together with the address it was looked up with and, when the
/// lookup worked, where it is.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct ResolvedLocation {
    pub station: StationRecord,
    pub address: String,
    pub coordinates: Option<Coordinates>,
}

impl ResolvedLocation {
    pub fn unresolved(station: StationRecord) -> Self {
        Self {
            address: composite_address(&station),
            station,
            coordinates: None,
        }
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(tag = "status", content = "location", rename_all = "snake_case")]
pub enum Resolution {
    Found(ResolvedLocation),
    NotFound,
}

impl Resolution {
    pub fn location(&self) -> Option<&ResolvedLocation> {
        match self {
            Resolution::Found(location) => Some(location),
            Resolution::NotFound => None,
        }
    }
}

/// Street, number, neighborhood, municipality, state and postal code, comma separated.
pub fn composite_address(station: &StationRecord) -> String {
    format!(
        "{}, {}, {}, {}, {}, {}",
        station.street,
        station.number,
        station.neighborhood,
        station.municipality,
        station.state,
        station.postal_code
    )
}

/// Geocodes the candidates cheapest first and returns the first one that
/// resolves. Each candidate gets exactly one attempt; a failed attempt moves on
/// to the next candidate.
pub fn resolve_first_available<G>(ranked: &[StationRecord], geocoder: &G) -> Resolution
where
    G: Geocoder + ?Sized,
{
    for (position, station) in ranked.iter().enumerate() {
        let address = composite_address(station);
        debug!("trying candidate {} at {}", position, address);

        let coordinates = match geocoder.forward(&address) {
            Ok(Some(coordinates)) => coordinates,
            Ok(None) => {
                debug!("no match for {}", address);
                continue;
            }
            Err(err) => {
                warn!("geocoding {} failed: {}", address, err);
                continue;
            }
        };

        info!(
            "resolved {} ({}) to {}, {}",
            station.reseller, address, coordinates.latitude, coordinates.longitude
        );

        return Resolution::Found(ResolvedLocation {
            station: station.clone(),
            address,
            coordinates: Some(coordinates),
        });
    }

    if !ranked.is_empty() {
        warn!("none of {} candidates could be geocoded", ranked.len());
    }

    Resolution::NotFound
}
