use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use combustivel_lib::histogram::MAX_BINS;
use combustivel_lib::selector::{municipalities, products, states};
use combustivel_lib::{
    build_view, load_and_clean, rank, CachingGeocoder, Geocoder, NominatimGeocoder,
    NominatimSettings, Selection, StationRecord, ViewSettings,
};
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::process;
use std::sync::Arc;
use std::time::Duration;

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_data_path() -> String {
    "ca-2022-02.csv".to_string()
}

fn default_geocoder_url() -> String {
    combustivel_lib::geocode::NOMINATIM_ENDPOINT.to_string()
}

fn default_user_agent() -> String {
    combustivel_lib::geocode::USER_AGENT_VALUE.to_string()
}

fn default_country_codes() -> String {
    "br".to_string()
}

fn default_geocode_timeout_secs() -> u64 {
    10
}

fn default_product() -> String {
    "GASOLINA".to_string()
}

fn default_histogram_bins() -> usize {
    10
}

#[derive(Deserialize, Clone, Debug)]
struct Config {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_data_path")]
    data_path: String,
    #[serde(default = "default_geocoder_url")]
    geocoder_url: String,
    #[serde(default = "default_user_agent")]
    user_agent: String,
    #[serde(default = "default_country_codes")]
    country_codes: String,
    #[serde(default = "default_geocode_timeout_secs")]
    geocode_timeout_secs: u64,
    #[serde(default = "default_product")]
    default_product: String,
    #[serde(default = "default_histogram_bins")]
    histogram_bins: usize,
}

impl Config {
    fn nominatim(&self) -> NominatimSettings {
        NominatimSettings {
            endpoint: self.geocoder_url.clone(),
            user_agent: self.user_agent.clone(),
            country_codes: Some(self.country_codes.clone()),
            timeout: Duration::from_secs(self.geocode_timeout_secs),
        }
    }

    fn view(&self) -> ViewSettings {
        let histogram_bins = self.histogram_bins.clamp(1, MAX_BINS);
        if histogram_bins != self.histogram_bins {
            warn!(
                "histogram bins {} out of range, using {}",
                self.histogram_bins, histogram_bins
            );
        }

        ViewSettings {
            default_product: self.default_product.clone(),
            histogram_bins,
        }
    }
}

/// Loaded once at startup and never written afterwards.
struct AppState {
    stations: Vec<StationRecord>,
    geocoder: Arc<dyn Geocoder>,
    settings: ViewSettings,
}

#[derive(Deserialize, Debug)]
struct PriceQuery {
    municipality: String,
    product: String,
}

#[get("/states")]
async fn get_states(data: web::Data<AppState>) -> impl Responder {
    web::Json(states(&data.stations))
}

#[get("/states/{state}/municipalities")]
async fn get_municipalities(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> impl Responder {
    web::Json(municipalities(&data.stations, &path.into_inner()))
}

#[get("/states/{state}/municipalities/{municipality}/products")]
async fn get_products(
    path: web::Path<(String, String)>,
    data: web::Data<AppState>,
) -> impl Responder {
    let (state, municipality) = path.into_inner();
    web::Json(products(&data.stations, &state, &municipality))
}

#[get("/prices")]
async fn get_prices(query: web::Query<PriceQuery>, data: web::Data<AppState>) -> impl Responder {
    web::Json(rank(&data.stations, &query.municipality, &query.product))
}

#[get("/dashboard")]
async fn get_dashboard(
    query: web::Query<Selection>,
    data: web::Data<AppState>,
) -> actix_web::Result<HttpResponse> {
    let requested = query.into_inner();
    debug!("dashboard requested for {:?}", requested);

    let state = data.into_inner();
    let view = web::block(move || {
        build_view(&state.stations, &requested, state.geocoder.as_ref(), &state.settings)
    })
    .await?;

    Ok(HttpResponse::Ok().json(view))
}

#[get("/version")]
async fn get_version() -> impl Responder {
    env!("CARGO_PKG_VERSION")
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_states)
        .service(get_municipalities)
        .service(get_products)
        .service(get_prices)
        .service(get_dashboard)
        .service(get_version);
}

async fn serve(address: String, state: AppState) -> std::io::Result<()> {
    let data = web::Data::new(state);

    info!("starting http server @ {}", address);

    HttpServer::new(move || App::new().app_data(data.clone()).configure(routes))
        .workers(1)
        .bind(address)?
        .run()
        .await
}

fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = match envy::prefixed("COMBUSTIVEL_").from_env::<Config>() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {}", err);
            process::exit(2);
        }
    };
    let address = format!("{}:{}", config.host, config.port);

    info!("loading price table from {}", config.data_path);

    let stations = match load_and_clean(&config.data_path) {
        Ok(stations) => stations,
        Err(err) => {
            error!("could not load price table: {}", err);
            process::exit(1);
        }
    };

    // the blocking client has to be built and dropped outside the runtime
    let geocoder: Arc<dyn Geocoder> = match NominatimGeocoder::new(config.nominatim()) {
        Ok(nominatim) => Arc::new(CachingGeocoder::new(nominatim)),
        Err(err) => {
            error!("could not set up geocoder: {}", err);
            process::exit(1);
        }
    };

    let state = AppState {
        stations,
        geocoder: Arc::clone(&geocoder),
        settings: config.view(),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(serve(address, state));

    // shut the runtime down first so the last geocoder handle, and with it the
    // blocking client, is released on this plain thread
    drop(runtime);
    drop(geocoder);

    result
}
