use chrono::NaiveDate;
use convert_case::{Case, Casing};
use ordered_float::NotNan;
use serde::Serialize;

/// One price observation of a fuel station, as published by the ANP survey.
///
/// Municipality and product are stored the way the source ships them, in
/// uppercase, and every comparison against a user choice goes through
/// [`normalize`].
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct StationRecord {
    pub region: String,
    pub state: String,
    pub municipality: String,
    pub reseller: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cnpj: String,
    pub street: String,
    pub number: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub complement: String,
    pub neighborhood: String,
    pub postal_code: String,
    pub product: String,
    /// Collection date exactly as published.
    pub collection_date: String,
    /// `collection_date` read as `dd/mm/yyyy`, absent when it does not parse.
    pub collected_on: Option<NaiveDate>,
    pub sale_price: NotNan<f64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unit: String,
    pub brand: String,
}

impl StationRecord {
    pub fn price(&self) -> f64 {
        self.sale_price.into_inner()
    }

    /// Last update as `dd/mm/yyyy`, or the raw cell when it is not a date.
    pub fn updated_at(&self) -> String {
        match self.collected_on {
            Some(date) => date.format("%d/%m/%Y").to_string(),
            None => self.collection_date.clone(),
        }
    }

    /// "GASOLINA ADITIVADA" becomes "Gasolina Aditivada".
    pub fn product_label(&self) -> String {
        self.product.to_lowercase().to_case(Case::Title)
    }

    pub fn is_in(&self, municipality: &str) -> bool {
        self.municipality == normalize(municipality)
    }

    pub fn sells(&self, product: &str) -> bool {
        self.product == normalize(product)
    }
}

/// Brings a user supplied label to the stored representation.
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}
