use log::debug;
use serde::Serialize;
use crate::geocode::{Coordinates, Geocoder};
use crate::histogram::PriceHistogram;
use crate::ranker::rank;
use crate::resolver::{resolve_first_available, Resolution, ResolvedLocation};
use crate::selector::{cascade, Cascade, Selection};
use crate::station::StationRecord;

pub static MAP_UNAVAILABLE: &'static str = "could not load map";

#[derive(Clone, Debug)]
pub struct ViewSettings {
    pub default_product: String,
    pub histogram_bins: usize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            default_product: "GASOLINA".to_string(),
            histogram_bins: 10,
        }
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct Popup {
    pub reseller: String,
    pub brand: String,
    pub price: String,
    pub updated_at: String,
    pub address: String,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct MapMarker {
    pub coordinates: Coordinates,
    pub popup: Popup,
}

impl MapMarker {
    pub fn from_location(location: &ResolvedLocation) -> Option<Self> {
        let coordinates = location.coordinates?;
        let station = &location.station;

        Some(Self {
            coordinates,
            popup: Popup {
                reseller: station.reseller.clone(),
                brand: station.brand.clone(),
                price: format_price(station.price()),
                updated_at: station.updated_at(),
                address: location.address.clone(),
            },
        })
    }
}

/// Brazilian currency notation, "R$ 5,49".
pub fn format_price(price: f64) -> String {
    format!("R$ {:.2}", price).replace('.', ",")
}

/// Everything the page shows for one selection.
#[derive(Clone, Serialize, Debug)]
pub struct DashboardView {
    #[serde(flatten)]
    pub cascade: Cascade,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_label: Option<String>,
    pub stations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<MapMarker>,
    /// Cheapest station, shown without a map when nothing could be geocoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cheapest: Option<ResolvedLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<PriceHistogram>,
}

/// One full recomputation pass: settle the selection, rank, resolve, histogram.
pub fn build_view<G>(
    records: &[StationRecord],
    requested: &Selection,
    geocoder: &G,
    settings: &ViewSettings,
) -> DashboardView
where
    G: Geocoder + ?Sized,
{
    let cascade = cascade(records, requested, &settings.default_product);

    let ranked = match (&cascade.selection.municipality, &cascade.selection.product) {
        (Some(municipality), Some(product)) => rank(records, municipality, product),
        _ => vec![],
    };
    debug!("building view for {:?} over {} stations", cascade.selection, ranked.len());

    let histogram = PriceHistogram::from_ranked(&ranked, settings.histogram_bins);
    let product_label = ranked.first().map(|station| station.product_label());

    let (marker, cheapest, map_error) = match resolve_first_available(&ranked, geocoder) {
        Resolution::Found(location) => (MapMarker::from_location(&location), Some(location), None),
        Resolution::NotFound => (
            None,
            ranked.first().cloned().map(ResolvedLocation::unresolved),
            Some(MAP_UNAVAILABLE.to_string()),
        ),
    };

    DashboardView {
        cascade,
        product_label,
        stations: ranked.len(),
        marker,
        cheapest,
        map_error,
        histogram,
    }
}
