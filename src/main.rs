use actix_web::{web, App, HttpServer};
use log::info;
use weatherdash::dashboard::MAX_FORECAST_DAYS;
use weatherdash::errors::UnrecoverableError;
use weatherdash::handlers::{cors, routes, AppState};
use weatherdash::initialization::config;
use weatherdash::logging::setup_logger;
use weatherdash::manager_ai::Gemini;
use weatherdash::manager_weather::OpenWeather;

#[actix_web::main]
async fn main() -> Result<(), UnrecoverableError> {
    let config = config()?;
    setup_logger(&config.general)?;

    let state = web::Data::new(AppState {
        weather: OpenWeather::new(&config.weather, &config.keys.weather)?,
        ai: Gemini::new(&config.ai, &config.keys.ai)?,
        forecast_days: config.dashboard.forecast_days.min(MAX_FORECAST_DAYS),
    });

    info!("starting server on {}:{}", config.web_server.bind_address, config.web_server.bind_port);

    let origins = config.web_server.allowed_origins.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(cors(&origins))
            .app_data(state.clone())
            .configure(routes)
    })
        .bind((config.web_server.bind_address.as_str(), config.web_server.bind_port))?
        .run()
        .await?;

    Ok(())
}
