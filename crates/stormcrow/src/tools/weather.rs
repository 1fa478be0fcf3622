use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::Tool;

pub const WEATHER_HOST: &str = "https://wttr.in";
pub const WEATHER_TIMEOUT: Duration = Duration::from_secs(10);

const ERROR_PREFIX: &str = "Error fetching weather";

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub host: String,
    pub timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            host: WEATHER_HOST.to_string(),
            timeout: WEATHER_TIMEOUT,
        }
    }
}

/// Current conditions for a city from a wttr.in compatible service
pub struct WeatherTool {
    client: Client,
    config: WeatherConfig,
}

impl WeatherTool {
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, city: &str) -> String {
        format!(
            "{}/{}?format=%C+%t",
            self.config.host.trim_end_matches('/'),
            urlencoding::encode(&city.to_lowercase())
        )
    }

    async fn fetch(&self, city: &str) -> Result<String> {
        let response = self
            .client
            .get(self.url(city))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?.trim().to_string())
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather for a city. Input: city name (string)"
    }

    async fn invoke(&self, input: &str) -> String {
        let city = input.trim();
        if city.is_empty() {
            return format!("{}: no city given", ERROR_PREFIX);
        }

        match self.fetch(city).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(city, error = %e, "weather lookup failed");
                format!("{}: {}", ERROR_PREFIX, e)
            }
        }
    }
}
