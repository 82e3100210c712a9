//! News handlers for the web API.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::news::{ArticleRepository, FetchOrchestrator};
use crate::web::dto::{
    ApiResponse, ArticleLookupQuery, ArticleResponse, FetchResponse, PaginatedResponse,
    PaginationQuery,
};
use crate::NewsdeskError;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /api/articles - List stored articles, newest first.
pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<ArticleResponse>>, ApiError> {
    let pagination = pagination.normalized();
    let repo = ArticleRepository::new(state.db.pool());

    let articles = repo
        .list_page(pagination.page, pagination.per_page)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list articles: {}", e);
            ApiError::internal("Failed to list articles")
        })?;
    let total = repo.count().await.map_err(|e| {
        tracing::error!("Failed to count articles: {}", e);
        ApiError::internal("Failed to count articles")
    })?;

    let data = articles.into_iter().map(ArticleResponse::from).collect();

    Ok(Json(PaginatedResponse::new(
        data,
        pagination.page,
        pagination.per_page,
        total.max(0) as u64,
    )))
}

/// GET /api/articles/by-url?url= - Look up one stored article by its URL.
pub async fn get_article_by_url(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ArticleLookupQuery>,
) -> Result<Json<ApiResponse<ArticleResponse>>, ApiError> {
    let url = query
        .url()
        .ok_or_else(|| ApiError::bad_request("Query parameter 'url' is required"))?;

    let article = ArticleRepository::new(state.db.pool())
        .get_by_url(url)
        .await?
        .ok_or_else(|| NewsdeskError::NotFound(format!("article {url}")))?;

    Ok(Json(ApiResponse::new(ArticleResponse::from(article))))
}

/// POST /api/fetch - Run one fetch cycle and return the latest articles.
///
/// Source failures are absorbed by the cycle, so this answers 200 even when
/// every source is down.
pub async fn fetch_latest(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FetchResponse>, ApiError> {
    let result = FetchOrchestrator::new(&state.db)
        .fetch_latest(&state.news)
        .await?;

    tracing::info!(
        fetched = result.report.fetched,
        created = result.report.created,
        "Fetch triggered via API"
    );

    Ok(Json(FetchResponse::new(result.report, result.latest)))
}
