//! Food search operations

use tracing::debug;

use crate::error::AppError;
use crate::search::{FoodHit, FoodSearch};

/// Look up foods by name through the configured provider
pub async fn search_foods(search: &dyn FoodSearch, query: Option<&str>) -> Result<Vec<FoodHit>, AppError> {
    let query = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::missing_param("foodName"))?;

    let hits = search.search(query).await?;
    debug!(query, hits = hits.len(), "Food search complete");
    Ok(hits)
}
