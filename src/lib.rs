pub mod aggregator;
pub mod analytics;
pub mod dashboard;
pub mod errors;
pub mod feels_like;
pub mod handlers;
pub mod initialization;
pub mod logging;
pub mod manager_ai;
pub mod manager_cities;
pub mod manager_refresh;
pub mod manager_weather;
pub mod views;
