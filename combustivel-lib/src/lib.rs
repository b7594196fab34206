pub mod dashboard;
pub mod error;
pub mod geocode;
pub mod histogram;
pub mod loader;
pub mod ranker;
pub mod resolver;
pub mod selector;
pub mod station;

pub use crate::dashboard::{build_view, format_price, DashboardView, MapMarker, Popup, ViewSettings};
pub use crate::error::{CombustivelError, GeocodeError};
pub use crate::geocode::{CachingGeocoder, Coordinates, Geocoder, NominatimGeocoder, NominatimSettings};
pub use crate::histogram::PriceHistogram;
pub use crate::loader::load_and_clean;
pub use crate::ranker::rank;
pub use crate::resolver::{composite_address, resolve_first_available, Resolution, ResolvedLocation};
pub use crate::selector::{cascade, distinct_sorted, Cascade, Selection};
pub use crate::station::StationRecord;
