use serde::Serialize;
use crate::station::StationRecord;

/// Upper bound on the number of bins a histogram is split into.
pub static MAX_BINS: usize = 200;

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Local price distribution for one municipality and product, with the mean
/// drawn as a marker line.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct PriceHistogram {
    pub bins: Vec<HistogramBin>,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub observations: usize,
}

impl PriceHistogram {
    /// Equal-width bins between the lowest and the highest price. The last bin
    /// is closed so the maximum lands in it. `bins` is clamped to
    /// `1..=MAX_BINS`. No prices, no histogram.
    pub fn from_ranked(ranked: &[StationRecord], bins: usize) -> Option<Self> {
        let prices: Vec<f64> = ranked.iter().map(|record| record.price()).collect();
        if prices.is_empty() {
            return None;
        }

        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = prices.iter().sum::<f64>() / prices.len() as f64;

        let bins = if max > min { bins.clamp(1, MAX_BINS) } else { 1 };
        let width = (max - min) / bins as f64;

        let mut histogram: Vec<HistogramBin> = (0..bins)
            .map(|index| HistogramBin {
                lower: min + width * index as f64,
                upper: if index + 1 == bins { max } else { min + width * (index + 1) as f64 },
                count: 0,
            })
            .collect();

        for price in &prices {
            let index = if width > 0.0 {
                (((price - min) / width) as usize).min(bins - 1)
            } else {
                0
            };
            histogram[index].count += 1;
        }

        Some(Self {
            bins: histogram,
            mean,
            min,
            max,
            observations: prices.len(),
        })
    }
}
