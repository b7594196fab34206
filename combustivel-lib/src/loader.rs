use std::collections::HashMap;
use std::fs;
use std::path::Path;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use lazy_static::lazy_static;
use log::{debug, info, warn};
use ordered_float::NotNan;
use serde::Deserialize;
use crate::error::CombustivelError;
use crate::station::StationRecord;

static DELIMITER: u8 = b';';

/// Always empty in the published files.
static PURCHASE_PRICE_COLUMN: &'static str = "Valor de Compra";

static DATE_FORMAT: &'static str = "%d/%m/%Y";

lazy_static! {
    static ref COLUMN_RENAMES: HashMap<&'static str, &'static str> = {
        let mut renames = HashMap::new();
        renames.insert("Regiao - Sigla", "Regiao");
        renames.insert("Estado - Sigla", "Estado");
        renames
    };

    static ref REQUIRED_COLUMNS: Vec<&'static str> = vec![
        "Regiao",
        "Estado",
        "Municipio",
        "Revenda",
        "Nome da Rua",
        "Numero Rua",
        "Bairro",
        "Cep",
        "Produto",
        "Data da Coleta",
        "Valor de Venda",
        "Bandeira",
    ];
}

#[derive(Deserialize, Debug)]
struct RawRow {
    #[serde(rename = "Regiao")]
    region: String,
    #[serde(rename = "Estado")]
    state: String,
    #[serde(rename = "Municipio")]
    municipality: String,
    #[serde(rename = "Revenda")]
    reseller: String,
    #[serde(rename = "CNPJ da Revenda", default)]
    cnpj: String,
    #[serde(rename = "Nome da Rua")]
    street: String,
    #[serde(rename = "Numero Rua")]
    number: String,
    #[serde(rename = "Complemento", default)]
    complement: String,
    #[serde(rename = "Bairro")]
    neighborhood: String,
    #[serde(rename = "Cep")]
    postal_code: String,
    #[serde(rename = "Produto")]
    product: String,
    #[serde(rename = "Data da Coleta")]
    collection_date: String,
    #[serde(rename = "Valor de Venda")]
    sale_price: String,
    #[serde(rename = "Unidade de Medida", default)]
    unit: String,
    #[serde(rename = "Bandeira")]
    brand: String,
}

impl RawRow {
    fn clean(self, row: usize) -> Result<StationRecord, CombustivelError> {
        let sale_price = parse_price(&self.sale_price).ok_or_else(|| CombustivelError::Parse {
            row,
            field: "Valor de Venda",
            value: self.sale_price.clone(),
        })?;

        let collected_on = NaiveDate::parse_from_str(&self.collection_date, DATE_FORMAT).ok();
        if collected_on.is_none() {
            warn!("row {}: keeping unreadable collection date `{}`", row, self.collection_date);
        }

        Ok(StationRecord {
            region: self.region,
            state: self.state,
            municipality: self.municipality,
            reseller: self.reseller,
            cnpj: self.cnpj,
            street: self.street,
            number: self.number,
            complement: self.complement,
            neighborhood: self.neighborhood,
            postal_code: self.postal_code,
            product: self.product,
            collection_date: self.collection_date,
            collected_on,
            sale_price,
            unit: self.unit,
            brand: self.brand,
        })
    }
}

/// Decimal-comma price ("5,49") to a non-negative finite number.
pub fn parse_price(value: &str) -> Option<NotNan<f64>> {
    let price = value.trim().replace(',', ".").parse::<f64>().ok()?;
    if !price.is_finite() || price < 0.0 {
        return None;
    }

    NotNan::new(price).ok()
}

/// Reads the semicolon separated price table at `path`, keeping the source order.
pub fn load_and_clean<P: AsRef<Path>>(path: P) -> Result<Vec<StationRecord>, CombustivelError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| CombustivelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records = parse(&String::from_utf8_lossy(&bytes))?;
    info!("loaded {} price observations from {}", records.len(), path.display());

    Ok(records)
}

/// Same as [`load_and_clean`] over an in-memory table.
pub fn parse(content: &str) -> Result<Vec<StationRecord>, CombustivelError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let (headers, kept) = clean_headers(reader.headers()?)?;

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        // line 1 holds the header
        let row = index + 2;
        let record = result?;
        let trimmed: StringRecord = kept
            .iter()
            .map(|&column| record.get(column).unwrap_or(""))
            .collect();

        let raw: RawRow = trimmed
            .deserialize(Some(&headers))
            .map_err(|err| CombustivelError::Format(format!("row {}: {}", row, err)))?;

        records.push(raw.clean(row)?);
    }

    Ok(records)
}

/// Renames the ambiguous labels, drops the purchase price column and checks
/// that every column the pipeline reads is there. Returns the cleaned header
/// along with the source indices it was built from.
fn clean_headers(raw: &StringRecord) -> Result<(StringRecord, Vec<usize>), CombustivelError> {
    let mut headers = StringRecord::new();
    let mut kept = Vec::new();

    for (index, label) in raw.iter().enumerate() {
        let label = label.trim_start_matches('\u{feff}');
        if label == PURCHASE_PRICE_COLUMN {
            debug!("dropping column {}", label);
            continue;
        }

        headers.push_field(COLUMN_RENAMES.get(label).copied().unwrap_or(label));
        kept.push(index);
    }

    for required in REQUIRED_COLUMNS.iter() {
        if !headers.iter().any(|label| label == *required) {
            return Err(CombustivelError::Format(format!("missing column `{}`", required)));
        }
    }

    Ok((headers, kept))
}


#[cfg(test)]
mod tests {
    use std::io::Write;
    use super::fixtures::{three_rows, HEADER};
    use super::*;

    #[test]
    fn cleans_prices_and_keeps_source_order() {
        let records = parse(&three_rows()).unwrap();
        let prices: Vec<f64> = records.iter().map(|r| r.price()).collect();
        assert_eq!(prices, vec![5.49, 5.20, 5.10]);
        assert!(prices.iter().all(|p| p.is_finite() && *p >= 0.0));
    }

    #[test]
    fn renames_state_and_region_columns() {
        let records = parse(&three_rows()).unwrap();
        assert_eq!(records[0].state, "RS");
        assert_eq!(records[0].region, "S");
        assert_eq!(records[1].complement, "LOJA 1");
        assert_eq!(records[2].brand, "SHELL");
        assert_eq!(records[1].collection_date, "02/02/2022");
        assert_eq!(records[1].collected_on, NaiveDate::from_ymd_opt(2022, 2, 2));
    }

    #[test]
    fn purchase_price_is_not_carried() {
        let records = parse(&three_rows()).unwrap();
        let json = serde_json::to_string(&records[0]).unwrap();
        assert!(!json.contains("purchase"));
        assert!(!json.contains("Valor de Compra"));
    }

    #[test]
    fn purchase_price_column_is_optional() {
        let header = HEADER.replace(";Valor de Compra", "");
        let content = format!(
            "{}\nS;RS;PORTO ALEGRE;POSTO;;Rua A;10;;Centro;90000-000;ETANOL;01/02/2022;4,09;R$ / litro;BRANCA",
            header
        );
        let records = parse(&content).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price(), 4.09);
    }

    #[test]
    fn missing_column_is_a_format_error() {
        let header = HEADER.replace("Bairro;", "");
        let content = format!("{}\n", header);
        match parse(&content) {
            Err(CombustivelError::Format(message)) => assert!(message.contains("Bairro")),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn non_numeric_price_is_a_parse_error() {
        let content = format!(
            "{}\nS;RS;PORTO ALEGRE;POSTO;;Rua A;10;;Centro;90000-000;GASOLINA;01/02/2022;cinco;;R$ / litro;BRANCA",
            HEADER
        );
        match parse(&content) {
            Err(CombustivelError::Parse { row, field, value }) => {
                assert_eq!(row, 2);
                assert_eq!(field, "Valor de Venda");
                assert_eq!(value, "cinco");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn odd_collection_dates_do_not_stop_the_load() {
        let content = format!(
            "{}\nS;RS;PORTO ALEGRE;POSTO A;;Rua A;10;;Centro;90000-000;GASOLINA;;5,49;;R$ / litro;BRANCA\nS;RS;PORTO ALEGRE;POSTO B;;Rua B;20;;Centro;90000-000;GASOLINA;2022-02-01;5,20;;R$ / litro;BRANCA",
            HEADER
        );
        let records = parse(&content).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].collection_date, "");
        assert_eq!(records[0].collected_on, None);
        assert_eq!(records[1].collection_date, "2022-02-01");
        assert_eq!(records[1].collected_on, None);
        assert_eq!(records[1].price(), 5.20);
    }

    #[test]
    fn negative_price_is_rejected() {
        assert!(parse_price("-1,00").is_none());
        assert!(parse_price("NaN").is_none());
        assert_eq!(parse_price(" 6,799 ").map(|p| p.into_inner()), Some(6.799));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = load_and_clean("/definitely/not/here/ca-2022-02.csv");
        assert!(matches!(result, Err(CombustivelError::Io { .. })));
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!("combustivel-loader-{}.csv", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(three_rows().as_bytes()).unwrap();
        drop(file);

        let records = load_and_clean(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(records.len(), 3);
    }
}
