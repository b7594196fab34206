use log::debug;
use crate::station::{normalize, StationRecord};

/// Stations selling `product` in `municipality`, cheapest first.
///
/// Equal prices keep the order they had in the source file. An empty result is
/// a normal outcome, not an error.
pub fn rank(records: &[StationRecord], municipality: &str, product: &str) -> Vec<StationRecord> {
    let municipality = normalize(municipality);
    let product = normalize(product);

    let mut ranked: Vec<StationRecord> = records
        .iter()
        .filter(|record| record.municipality == municipality && record.product == product)
        .cloned()
        .collect();

    // sort_by_key is stable
    ranked.sort_by_key(|record| record.sale_price);

    debug!("ranked {} stations for {} / {}", ranked.len(), municipality, product);

    ranked
}

#[cfg(test)]
mod tests {
    use crate::loader;
    use crate::loader::fixtures::three_rows;
    use crate::station::fixtures::station;
    use super::rank;

    #[test]
    fn ranks_matching_rows_by_price() {
        let records = loader::parse(&three_rows()).unwrap();
        let ranked = rank(&records, "Porto Alegre", "gasolina");
        let prices: Vec<f64> = ranked.iter().map(|r| r.price()).collect();
        assert_eq!(prices, vec![5.20, 5.49]);
        assert!(ranked.iter().all(|r| r.municipality == "PORTO ALEGRE"));
    }

    #[test]
    fn no_match_is_empty() {
        let records = loader::parse(&three_rows()).unwrap();
        assert!(rank(&records, "Pelotas", "gasolina").is_empty());
        assert!(rank(&records, "Porto Alegre", "GNV").is_empty());
        assert!(rank(&[], "Porto Alegre", "gasolina").is_empty());
    }

    #[test]
    fn output_is_sorted_ascending() {
        let records: Vec<_> = [6.1, 5.3, 7.0, 4.99, 5.3, 6.0]
            .iter()
            .map(|price| station("PORTO ALEGRE", "ETANOL", *price))
            .collect();
        let ranked = rank(&records, "porto alegre", "etanol");
        assert_eq!(ranked.len(), records.len());
        assert!(ranked.windows(2).all(|w| w[0].sale_price <= w[1].sale_price));
    }

    #[test]
    fn ties_keep_source_order() {
        let mut first = station("PORTO ALEGRE", "DIESEL", 5.0);
        first.reseller = "PRIMEIRO".to_string();
        let mut second = station("PORTO ALEGRE", "DIESEL", 5.0);
        second.reseller = "SEGUNDO".to_string();
        let cheaper = station("PORTO ALEGRE", "DIESEL", 4.0);

        let ranked = rank(&[first, second, cheaper], "PORTO ALEGRE", "DIESEL");
        let resellers: Vec<&str> = ranked.iter().map(|r| r.reseller.as_str()).collect();
        assert_eq!(resellers, vec!["POSTO 4", "PRIMEIRO", "SEGUNDO"]);
    }
}
