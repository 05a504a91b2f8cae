//! JSON API handlers used by the page scripts.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use delicious_core::{GeoPoint, StoreId};

use crate::db::stores::SearchHit;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::StoreService;
use crate::services::stores::NearbyStore;
use crate::state::AppState;

/// `?q=` for text search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// `?lng=&lat=` for proximity search.
#[derive(Debug, Deserialize)]
pub struct NearQuery {
    pub lng: f64,
    pub lat: f64,
}

/// Result of toggling a heart.
#[derive(Debug, Serialize)]
pub struct HeartResponse {
    /// Whether the store is hearted after the toggle.
    pub hearted: bool,
    /// Every store the user has hearted.
    pub hearts: Vec<StoreId>,
}

/// Full-text search over store names and descriptions.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>> {
    let hits = StoreService::new(state.pool()).search(&query.q).await?;
    Ok(Json(hits))
}

/// Stores within 20 km of a point, nearest first.
pub async fn near(
    State(state): State<AppState>,
    Query(query): Query<NearQuery>,
) -> Result<Json<Vec<NearbyStore>>> {
    let origin = GeoPoint::new(query.lng, query.lat)?;
    let stores = StoreService::new(state.pool()).near(origin).await?;
    Ok(Json(stores))
}

/// Add or remove a store from the current user's hearts.
#[tracing::instrument(skip_all, fields(user_id = %user.id, store_id = id))]
pub async fn heart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<HeartResponse>> {
    let store = StoreId::new(id);
    let hearts = StoreService::new(state.pool())
        .toggle_heart(user.id, store)
        .await?;

    Ok(Json(HeartResponse {
        hearted: hearts.contains(&store),
        hearts,
    }))
}
