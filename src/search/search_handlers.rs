use axum::{
    extract::{Query, State},
    Json,
};

use crate::{error::Result, middleware::AuthUser, state::AppState};
use super::search_models::{SearchQuery, SearchResponse};

/// Search rooms by name
#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching rooms", body = SearchResponse),
        (status = 400, description = "Missing q parameter")
    ),
    tag = "search",
    security(("bearer_auth" = []))
)]
pub async fn search(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    let response = state
        .search_service
        .search(params.q.as_deref(), params.page.as_deref())
        .await?;
    Ok(Json(response))
}
