use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use crate::station::{normalize, StationRecord};

/// Sorted distinct values of `field` over the records accepted by `predicate`.
pub fn distinct_sorted<F, P>(records: &[StationRecord], field: F, predicate: Option<P>) -> Vec<String>
where
    F: Fn(&StationRecord) -> &str,
    P: Fn(&StationRecord) -> bool,
{
    records
        .iter()
        .filter(|record| predicate.as_ref().map_or(true, |accept| accept(*record)))
        .map(|record| field(record).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn states(records: &[StationRecord]) -> Vec<String> {
    distinct_sorted(records, |r| r.state.as_str(), None::<fn(&StationRecord) -> bool>)
}

pub fn municipalities(records: &[StationRecord], state: &str) -> Vec<String> {
    let state = normalize(state);
    distinct_sorted(records, |r| r.municipality.as_str(), Some(|r: &StationRecord| r.state == state))
}

pub fn products(records: &[StationRecord], state: &str, municipality: &str) -> Vec<String> {
    let state = normalize(state);
    distinct_sorted(
        records,
        |r| r.product.as_str(),
        Some(|r: &StationRecord| r.state == state && r.is_in(municipality)),
    )
}

/// Current choice of the three cascading selectors.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
}

impl Selection {
    pub fn new(state: &str, municipality: &str, product: &str) -> Self {
        Self {
            state: Some(state.to_string()),
            municipality: Some(municipality.to_string()),
            product: Some(product.to_string()),
        }
    }
}

/// Option lists for every selector together with the selection they settle on.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct Cascade {
    pub states: Vec<String>,
    pub municipalities: Vec<String>,
    pub products: Vec<String>,
    pub selection: Selection,
}

/// Walks state → municipality → product. A requested value that is not among
/// the options of its level falls back to the first option, or for products to
/// `default_product` when that is offered. An empty level leaves itself and
/// every level below it unselected.
pub fn cascade(records: &[StationRecord], requested: &Selection, default_product: &str) -> Cascade {
    let states = states(records);
    let state = pick(&states, requested.state.as_deref(), None);

    let municipalities = state
        .as_deref()
        .map(|state| municipalities(records, state))
        .unwrap_or_default();
    let municipality = pick(&municipalities, requested.municipality.as_deref(), None);

    let products = match (state.as_deref(), municipality.as_deref()) {
        (Some(state), Some(municipality)) => products(records, state, municipality),
        _ => vec![],
    };
    let product = pick(&products, requested.product.as_deref(), Some(default_product));

    Cascade {
        states,
        municipalities,
        products,
        selection: Selection {
            state,
            municipality,
            product,
        },
    }
}

fn pick(options: &[String], requested: Option<&str>, fallback: Option<&str>) -> Option<String> {
    let find = |wanted: &str| {
        let wanted = normalize(wanted);
        options.iter().find(|option| **option == wanted).cloned()
    };

    requested
        .and_then(find)
        .or_else(|| fallback.and_then(find))
        .or_else(|| options.first().cloned())
}

#[cfg(test)]
mod tests {
    use crate::station::fixtures::station;
    use crate::station::StationRecord;
    use super::*;

    fn dataset() -> Vec<StationRecord> {
        let mut sp = station("SAO PAULO", "ETANOL", 3.9);
        sp.state = "SP".to_string();
        let mut campinas = station("CAMPINAS", "DIESEL", 5.9);
        campinas.state = "SP".to_string();

        vec![
            station("PORTO ALEGRE", "GASOLINA", 5.49),
            sp,
            station("CANOAS", "GASOLINA", 5.10),
            station("PORTO ALEGRE", "ETANOL", 4.5),
            campinas,
            station("PORTO ALEGRE", "GASOLINA", 5.20),
        ]
    }

    #[test]
    fn distinct_values_are_sorted_without_duplicates() {
        let records = dataset();
        assert_eq!(states(&records), vec!["RS", "SP"]);
        assert_eq!(municipalities(&records, "rs"), vec!["CANOAS", "PORTO ALEGRE"]);
        assert_eq!(products(&records, "RS", "Porto Alegre"), vec!["ETANOL", "GASOLINA"]);
    }

    #[test]
    fn empty_predicate_match_gives_empty_list() {
        let records = dataset();
        assert!(municipalities(&records, "AM").is_empty());
        assert!(products(&records, "SP", "PORTO ALEGRE").is_empty());
        assert!(states(&[]).is_empty());
    }

    #[test]
    fn cascade_keeps_a_valid_selection() {
        let records = dataset();
        let requested = Selection::new("RS", "porto alegre", "etanol");
        let cascade = cascade(&records, &requested, "GASOLINA");
        assert_eq!(cascade.selection, Selection::new("RS", "PORTO ALEGRE", "ETANOL"));
        assert_eq!(cascade.products, vec!["ETANOL", "GASOLINA"]);
    }

    #[test]
    fn cascade_falls_back_when_state_changes() {
        let records = dataset();
        // municipality belongs to the previous state
        let requested = Selection::new("SP", "PORTO ALEGRE", "GASOLINA");
        let cascade = cascade(&records, &requested, "GASOLINA");
        assert_eq!(cascade.municipalities, vec!["CAMPINAS", "SAO PAULO"]);
        assert_eq!(cascade.selection, Selection::new("SP", "CAMPINAS", "DIESEL"));
    }

    #[test]
    fn cascade_prefers_the_default_product() {
        let records = dataset();
        let requested = Selection {
            state: Some("RS".to_string()),
            municipality: Some("PORTO ALEGRE".to_string()),
            product: None,
        };
        let cascade = cascade(&records, &requested, "gasolina");
        assert_eq!(cascade.selection.product.as_deref(), Some("GASOLINA"));
    }

    #[test]
    fn cascade_on_empty_dataset_selects_nothing() {
        let cascade = cascade(&[], &Selection::default(), "GASOLINA");
        assert!(cascade.states.is_empty());
        assert!(cascade.municipalities.is_empty());
        assert!(cascade.products.is_empty());
        assert_eq!(cascade.selection, Selection::default());
    }
}
