// Third-party data for dashboard widgets: weather, news, crypto, GitHub, upstream status

mod shape;

pub use shape::{
    CoinMarket, GitHubRepoRaw, NewsResponse, OwmForecast, shape_crypto, shape_github,
    shape_news, shape_weather,
};

use futures_util::future::join_all;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::IntegrationsConfig;
use crate::models::{
    CryptoPrice, GitHubRepo, NewsItem, UpstreamState, UpstreamStatus, WeatherData,
};
use crate::version;

const OPENWEATHER_FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";
const NEWSAPI_HEADLINES_URL: &str = "https://newsapi.org/v2/top-headlines";
const COINGECKO_MARKETS_URL: &str = "https://api.coingecko.com/api/v3/coins/markets";
const GITHUB_API_URL: &str = "https://api.github.com";

/// Services probed by `status()`.
pub const UPSTREAM_SERVICES: &[(&str, &str)] = &[
    ("GitHub", "https://api.github.com"),
    ("Docker Hub", "https://hub.docker.com"),
    ("NPM", "https://registry.npmjs.org"),
];

pub const DEFAULT_CITY: &str = "London";
pub const DEFAULT_NEWS_CATEGORY: &str = "technology";

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("{0} API key not configured")]
    NotConfigured(&'static str),
    #[error("request to {service} failed: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} answered {status}")]
    Status { service: &'static str, status: u16 },
    #[error("unexpected {service} response: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },
}

/// HTTP client for widget data. Data calls share one timeout; status probes use their own.
#[derive(Clone)]
pub struct WidgetClient {
    http: Client,
    config: IntegrationsConfig,
}

impl WidgetClient {
    pub fn new(config: IntegrationsConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(format!("{}/{}", version::NAME, version::VERSION))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, IntegrationError> {
        let request_err = |source| IntegrationError::Request { service, source };
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(request_err)?;
        let status = response.status();
        if !status.is_success() {
            warn!(service, status = status.as_u16(), "upstream error");
            return Err(IntegrationError::Status {
                service,
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(request_err)?;
        serde_json::from_slice(&body).map_err(|e| IntegrationError::Malformed {
            service,
            message: e.to_string(),
        })
    }

    #[instrument(skip(self), fields(operation = "weather"))]
    pub async fn weather(&self, city: &str) -> Result<WeatherData, IntegrationError> {
        let key = self
            .config
            .openweather_api_key
            .as_deref()
            .ok_or(IntegrationError::NotConfigured("OpenWeather"))?;
        let forecast: OwmForecast = self
            .get_json(
                "OpenWeather",
                OPENWEATHER_FORECAST_URL,
                &[("q", city), ("appid", key), ("units", "metric")],
            )
            .await?;
        shape_weather(forecast)
    }

    #[instrument(skip(self), fields(operation = "news"))]
    pub async fn news(&self, category: &str, limit: u32) -> Result<Vec<NewsItem>, IntegrationError> {
        let key = self
            .config
            .news_api_key
            .as_deref()
            .ok_or(IntegrationError::NotConfigured("News"))?;
        let limit = limit.to_string();
        let news: NewsResponse = self
            .get_json(
                "NewsAPI",
                NEWSAPI_HEADLINES_URL,
                &[("category", category), ("pageSize", &limit), ("apiKey", key)],
            )
            .await?;
        Ok(shape_news(news))
    }

    #[instrument(skip(self), fields(operation = "crypto"))]
    pub async fn crypto(&self, limit: u32) -> Result<Vec<CryptoPrice>, IntegrationError> {
        let limit = limit.to_string();
        let coins: Vec<CoinMarket> = self
            .get_json(
                "CoinGecko",
                COINGECKO_MARKETS_URL,
                &[
                    ("vs_currency", "usd"),
                    ("order", "market_cap_desc"),
                    ("per_page", &limit),
                    ("page", "1"),
                    ("sparkline", "false"),
                ],
            )
            .await?;
        Ok(shape_crypto(coins))
    }

    #[instrument(skip(self), fields(operation = "github"))]
    pub async fn github(
        &self,
        username: &str,
        limit: u32,
    ) -> Result<Vec<GitHubRepo>, IntegrationError> {
        let url = format!("{}/users/{}/repos", GITHUB_API_URL, username);
        let limit = limit.to_string();
        let repos: Vec<GitHubRepoRaw> = self
            .get_json("GitHub", &url, &[("sort", "updated"), ("per_page", &limit)])
            .await?;
        Ok(shape_github(repos))
    }

    /// Probes every upstream concurrently. A probe that fails or times out is reported
    /// offline; it never holds up the others past the status timeout.
    #[instrument(skip(self), fields(operation = "upstream_status"))]
    pub async fn status(&self) -> Vec<UpstreamStatus> {
        let timeout = Duration::from_secs(self.config.status_timeout_secs);
        let probes = UPSTREAM_SERVICES
            .iter()
            .map(|(name, url)| self.probe(name, url, timeout));
        join_all(probes).await
    }

    async fn probe(&self, service: &str, url: &str, timeout: Duration) -> UpstreamStatus {
        let start = Instant::now();
        let result = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        let response_time = start.elapsed().as_millis() as u64;
        let status = match result {
            Ok(_) => UpstreamState::Online,
            Err(e) => {
                debug!(service, error = %e, "upstream probe failed");
                UpstreamState::Offline
            }
        };
        UpstreamStatus {
            service: service.to_string(),
            status,
            response_time,
        }
    }
}
