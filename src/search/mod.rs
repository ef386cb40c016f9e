//! Food search
//!
//! Third-party nutrition database lookups behind the `FoodSearch` trait.

pub mod usda;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use usda::{parse_search_response, UsdaClient, UsdaConfig};

/// One search result, reduced to what the logging flow needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodHit {
    pub fdc_id: i64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_owner: Option<String>,
    /// Energy per serving in kcal, rounded
    pub calories: f64,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Missing API Key")]
    MissingApiKey,

    #[error("USDA Fetch Failed")]
    Request(#[from] reqwest::Error),

    #[error("USDA Fetch Failed")]
    Status(u16),

    #[error("USDA Fetch Failed")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait FoodSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<FoodHit>, SearchError>;
}
