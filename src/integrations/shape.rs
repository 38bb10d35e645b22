// Upstream payloads and their reduction to widget models

use serde::Deserialize;

use super::IntegrationError;
use crate::models::{
    CryptoPrice, CurrentWeather, ForecastDay, GitHubRepo, NewsItem, TempRange, WeatherData,
};

/// OpenWeather 5-day forecast: one entry per 3 hours, so every 8th entry is a new day.
const ENTRIES_PER_DAY: usize = 8;
const FORECAST_DAYS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct OwmForecast {
    pub list: Vec<OwmEntry>,
}

#[derive(Debug, Deserialize)]
pub struct OwmEntry {
    pub dt_txt: String,
    pub main: OwmMain,
    pub weather: Vec<OwmWeather>,
}

#[derive(Debug, Deserialize)]
pub struct OwmMain {
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct OwmWeather {
    pub description: String,
    pub icon: String,
}

impl OwmEntry {
    fn condition(&self) -> OwmWeather {
        self.weather.first().cloned().unwrap_or_default()
    }
}

pub fn shape_weather(forecast: OwmForecast) -> Result<WeatherData, IntegrationError> {
    let first = forecast
        .list
        .first()
        .ok_or_else(|| IntegrationError::Malformed {
            service: "OpenWeather",
            message: "empty forecast list".into(),
        })?;
    let now = first.condition();
    let current = CurrentWeather {
        temp: first.main.temp.round(),
        humidity: first.main.humidity,
        pressure: first.main.pressure,
        description: now.description,
        icon: now.icon,
    };
    let forecast = forecast
        .list
        .iter()
        .step_by(ENTRIES_PER_DAY)
        .take(FORECAST_DAYS)
        .map(|e| {
            let c = e.condition();
            ForecastDay {
                date: e.dt_txt.split(' ').next().unwrap_or_default().to_string(),
                temp: TempRange {
                    min: e.main.temp_min,
                    max: e.main.temp_max,
                },
                description: c.description,
                icon: c.icon,
            }
        })
        .collect();
    Ok(WeatherData { current, forecast })
}

#[derive(Debug, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub articles: Vec<NewsArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub published_at: String,
    pub source: NewsSource,
    pub url_to_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewsSource {
    pub name: Option<String>,
}

pub fn shape_news(news: NewsResponse) -> Vec<NewsItem> {
    news.articles
        .into_iter()
        .map(|a| NewsItem {
            title: a.title,
            description: a.description,
            url: a.url,
            published_at: a.published_at,
            source: a.source.name.unwrap_or_default(),
            url_to_image: a.url_to_image,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub current_price: f64,
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub market_cap: f64,
    #[serde(default)]
    pub image: String,
}

pub fn shape_crypto(coins: Vec<CoinMarket>) -> Vec<CryptoPrice> {
    coins
        .into_iter()
        .map(|c| CryptoPrice {
            id: c.id,
            symbol: c.symbol.to_uppercase(),
            name: c.name,
            current_price: c.current_price,
            price_change_percentage_24h: c.price_change_percentage_24h,
            market_cap: c.market_cap,
            image: c.image,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct GitHubRepoRaw {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    pub language: Option<String>,
    #[serde(default)]
    pub updated_at: String,
}

pub fn shape_github(repos: Vec<GitHubRepoRaw>) -> Vec<GitHubRepo> {
    repos
        .into_iter()
        .map(|r| GitHubRepo {
            name: r.name,
            full_name: r.full_name,
            description: r.description,
            stargazers_count: r.stargazers_count,
            forks_count: r.forks_count,
            open_issues_count: r.open_issues_count,
            language: r.language,
            updated_at: r.updated_at,
        })
        .collect()
}
