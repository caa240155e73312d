pub mod cli;
pub mod client;
pub mod config;
pub mod geolocation;
pub mod i18n;
pub mod loader;
pub mod logging;
pub mod places;
pub mod ranking;
pub mod render;
pub mod search;
