//! Current-weather drivers: OpenWeatherMap, then wttr.in.

use super::{keys, push_segment, ApiKeys};
use crate::capability::{Capability, CapabilityRequest};
use crate::config::FacadeConfig;
use crate::provider::{Endpoint, Provider, ProviderChain, ShapeError};
use crate::transport::{ProviderRequest, RawResponse};
use crate::types::WeatherReport;
use crate::utils::PathMapper;
use crate::Result;

pub const OPENWEATHERMAP_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const WTTR_URL: &str = "https://wttr.in";

pub fn weather_chain(config: &FacadeConfig, api_keys: &ApiKeys) -> ProviderChain<WeatherReport> {
    ProviderChain::new(
        Capability::Weather,
        vec![
            Provider::new(
                "weather.openweathermap",
                config.endpoint("weather.openweathermap", OPENWEATHERMAP_URL),
                build_openweathermap,
                normalize_openweathermap,
            )
            .with_api_key(keys::OPENWEATHERMAP, api_keys.get(keys::OPENWEATHERMAP)),
            Provider::new(
                "weather.wttr",
                config.endpoint("weather.wttr", WTTR_URL),
                build_wttr,
                normalize_wttr,
            ),
        ],
    )
    .with_default("language", config.default_language.as_str())
    .with_default("units", config.weather_units.as_str())
}

fn language(req: &CapabilityRequest) -> &str {
    req.get("language").unwrap_or(crate::config::DEFAULT_LANGUAGE)
}

fn imperial(req: &CapabilityRequest) -> bool {
    req.get("units") == Some("imperial")
}

fn build_openweathermap(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    let key = endpoint.require_key()?;
    Ok(ProviderRequest::get(endpoint.url.clone())
        .query("q", req.require("city")?)
        .query("appid", key)
        .query("units", req.get("units").unwrap_or(crate::config::DEFAULT_WEATHER_UNITS))
        .query("lang", language(req)))
}

fn normalize_openweathermap(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<WeatherReport, ShapeError> {
    let body = &raw.body;
    let temperature =
        PathMapper::get_f64(body, "main.temp").ok_or_else(|| ShapeError::missing("main.temp"))?;

    Ok(WeatherReport {
        city: PathMapper::get_string(body, "name")
            .unwrap_or_else(|| req.get("city").unwrap_or_default().to_string()),
        temperature,
        feels_like: PathMapper::get_f64(body, "main.feels_like"),
        humidity: PathMapper::get_f64(body, "main.humidity"),
        description: PathMapper::get_string(body, "weather[0].description").unwrap_or_default(),
        wind_speed: PathMapper::get_f64(body, "wind.speed"),
        raw: body.clone(),
        provider: endpoint.provider_id.clone(),
    })
}

fn build_wttr(endpoint: &Endpoint, req: &CapabilityRequest) -> Result<ProviderRequest> {
    let url = push_segment(endpoint, req.require("city")?)?;
    Ok(ProviderRequest::get(url.to_string())
        .query("format", "j1")
        .query("lang", language(req)))
}

/// wttr.in reports every number as a string, in both unit systems.
fn normalize_wttr(
    endpoint: &Endpoint,
    raw: &RawResponse,
    req: &CapabilityRequest,
) -> std::result::Result<WeatherReport, ShapeError> {
    let current = PathMapper::get_path(&raw.body, "current_condition[0]")
        .ok_or_else(|| ShapeError::missing("current_condition"))?;

    let (temp, feels, wind) = if imperial(req) {
        ("temp_F", "FeelsLikeF", "windspeedMiles")
    } else {
        ("temp_C", "FeelsLikeC", "windspeedKmph")
    };
    let temperature = PathMapper::get_f64(current, temp).ok_or_else(|| ShapeError::missing(temp))?;

    let localized = format!("lang_{}[0].value", language(req));
    let description =
        PathMapper::first_string(current, &[localized.as_str(), "weatherDesc[0].value"]).unwrap_or_default();

    Ok(WeatherReport {
        city: PathMapper::get_string(&raw.body, "nearest_area[0].areaName[0].value")
            .unwrap_or_else(|| req.get("city").unwrap_or_default().to_string()),
        temperature,
        feels_like: PathMapper::get_f64(current, feels),
        humidity: PathMapper::get_f64(current, "humidity"),
        description,
        wind_speed: PathMapper::get_f64(current, wind),
        raw: raw.body.clone(),
        provider: endpoint.provider_id.clone(),
    })
}
