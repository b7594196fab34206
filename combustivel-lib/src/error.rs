use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the price table. All of them are fatal for the session.
#[derive(Debug, Error)]
pub enum CombustivelError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("format error: {0}")]
    Format(String),

    #[error("row {row}: {field} value `{value}` could not be parsed")]
    Parse {
        row: usize,
        field: &'static str,
        value: String,
    },
}

impl From<csv::Error> for CombustivelError {
    fn from(err: csv::Error) -> Self {
        let row = err.position().map(|p| p.line()).unwrap_or_default();
        CombustivelError::Format(format!("line {}: {}", row, err))
    }
}

/// Failures of a single geocoding attempt. The resolver treats every one of
/// them as "no result" for that candidate.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder answered with status {0}")]
    Status(u16),

    #[error("geocoder response could not be decoded: {0}")]
    Decode(String),

    #[error("invalid geocoder url: {0}")]
    Url(#[from] url::ParseError),
}
