//! USDA FoodData Central client
//!
//! Proxies `GET {base}/foods/search` and reduces each result to the fields
//! the logging flow needs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, instrument};

use super::{FoodHit, FoodSearch, SearchError};

/// Nutrient unit that carries energy in kilocalories
const KCAL_UNIT: &str = "KCAL";

#[derive(Debug, Clone)]
pub struct UsdaConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl UsdaConfig {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UsdaClient {
    client: Client,
    config: UsdaConfig,
}

impl UsdaClient {
    pub fn new(config: UsdaConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn search_url(&self) -> String {
        format!("{}/foods/search", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl FoodSearch for UsdaClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<FoodHit>, SearchError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            error!("USDA_API_KEY is missing");
            return Err(SearchError::MissingApiKey);
        };

        let response = self
            .client
            .get(self.search_url())
            .query(&[("api_key", api_key), ("query", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let hits = parse_search_response(&body)?;
        debug!(results = hits.len(), "USDA search complete");

        Ok(hits)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<UsdaFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsdaFood {
    fdc_id: i64,
    description: String,
    brand_owner: Option<String>,
    #[serde(default)]
    food_nutrients: Vec<UsdaNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsdaNutrient {
    unit_name: Option<String>,
    value: Option<f64>,
}

impl From<UsdaFood> for FoodHit {
    fn from(food: UsdaFood) -> Self {
        let calories = food
            .food_nutrients
            .iter()
            .find(|n| n.unit_name.as_deref() == Some(KCAL_UNIT))
            .and_then(|n| n.value)
            .filter(|v| v.is_finite())
            .map(f64::round)
            .unwrap_or(0.0);

        Self {
            fdc_id: food.fdc_id,
            description: food.description,
            brand_owner: food.brand_owner,
            calories,
        }
    }
}

/// Parse a `/foods/search` body. A body without `foods` yields no hits.
pub fn parse_search_response(body: &str) -> Result<Vec<FoodHit>, SearchError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response.foods.into_iter().map(FoodHit::from).collect())
}
