use crate::config::Config;
use crate::error::{CatalogError, RecommendError};
use crate::models::MediaType;
use crate::recommend::{GeminiClient, RecommendationEngine, RecommendationRequest};
use crate::tmdb::{CatalogApi, TmdbClient};
use crate::views;
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogApi>,
    pub recommender: Arc<dyn RecommendationEngine>,
    pub cache_ttl: Duration,
}

pub async fn run_server(config: Config) -> Result<()> {
    let catalog = TmdbClient::new(config.tmdb_base_url.clone(), config.tmdb_api_key.clone())?
        .with_search_policy(config.search_policy)
        .with_cache_ttl(config.cache_ttl);
    let recommender = GeminiClient::new(
        config.gemini_base_url.clone(),
        config.gemini_model.clone(),
        config.gemini_api_key.clone(),
    )?;

    let state = AppState {
        catalog: Arc::new(catalog),
        recommender: Arc::new(recommender),
        cache_ttl: config.cache_ttl,
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/home", get(home))
        .route("/api/movies/popular", get(popular_movies))
        .route("/api/movies/top-rated", get(top_rated_movies))
        .route("/api/tv/popular", get(popular_tv_shows))
        .route("/api/trending", get(trending))
        .route("/api/search", get(search))
        .route("/api/movie/:id", get(movie_detail))
        .route("/api/tv/:id", get(tv_detail))
        .route(
            "/api/recommendations",
            post(recommend).layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
    page: Option<String>,
}

/// Missing, non-numeric and zero page numbers all mean the first page.
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1)
}

async fn home(State(state): State<AppState>) -> Response {
    let view = views::landing(state.catalog.as_ref()).await;
    cached_json(&state, view)
}

async fn popular_movies(State(state): State<AppState>, Query(q): Query<PageQuery>) -> Response {
    let page = parse_page(q.page.as_deref());
    match state.catalog.popular_movies(page).await {
        Ok(data) => cached_json(&state, data),
        Err(e) => {
            error!("/api/movies/popular failed: {}", e);
            failure_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch popular movies",
                &e,
            )
        }
    }
}

async fn top_rated_movies(State(state): State<AppState>, Query(q): Query<PageQuery>) -> Response {
    let page = parse_page(q.page.as_deref());
    match state.catalog.top_rated_movies(page).await {
        Ok(data) => cached_json(&state, data),
        Err(e) => {
            error!("/api/movies/top-rated failed: {}", e);
            failure_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch top rated movies",
                &e,
            )
        }
    }
}

async fn popular_tv_shows(State(state): State<AppState>, Query(q): Query<PageQuery>) -> Response {
    let page = parse_page(q.page.as_deref());
    match state.catalog.popular_tv_shows(page).await {
        Ok(data) => cached_json(&state, data),
        Err(e) => {
            error!("/api/tv/popular failed: {}", e);
            failure_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch popular TV shows",
                &e,
            )
        }
    }
}

async fn trending(State(state): State<AppState>, Query(q): Query<PageQuery>) -> Response {
    let page = parse_page(q.page.as_deref());
    match state.catalog.trending_all_week(page).await {
        Ok(data) => cached_json(&state, data),
        Err(e) => {
            error!("/api/trending failed: {}", e);
            failure_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch trending content",
                &e,
            )
        }
    }
}

async fn search(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> Response {
    let page = parse_page(q.page.as_deref());
    let query = q.q.unwrap_or_default();
    let view = views::search(state.catalog.as_ref(), &query, page).await;
    if view.error.is_some() {
        return Json(view).into_response();
    }
    cached_json(&state, view)
}

async fn movie_detail(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    detail_response(&state, MediaType::Movie, id).await
}

async fn tv_detail(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    detail_response(&state, MediaType::Tv, id).await
}

async fn detail_response(state: &AppState, media_type: MediaType, id: u64) -> Response {
    match views::detail(state.catalog.as_ref(), media_type, id).await {
        Ok(view) => cached_json(state, view),
        Err(e) if e.is_not_found() => {
            warn!("No catalog entry for {} {}", media_type, id);
            failure_response(StatusCode::NOT_FOUND, not_found_message(media_type), &e)
        }
        Err(e) => {
            error!("Failed to load {} details for ID {}: {}", media_type, id, e);
            failure_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                not_found_message(media_type),
                &e,
            )
        }
    }
}

fn not_found_message(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Movie => "Movie Not Found",
        MediaType::Tv => "TV Show Not Found",
    }
}

async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> Response {
    let result = match request.validate() {
        Ok(()) => state.recommender.recommend(&request).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(out) => Json(out).into_response(),
        Err(e @ RecommendError::Validation { field, .. }) => {
            warn!("Rejected recommendation request: {}", e);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "message": e.to_string(), "field": field })),
            )
                .into_response()
        }
        Err(e) => {
            error!("Recommendation request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to get recommendations. Please try again.",
                    "error": e.to_string()
                })),
            )
                .into_response()
        }
    }
}

fn failure_response(status: StatusCode, message: &str, err: &CatalogError) -> Response {
    (
        status,
        Json(json!({ "message": message, "error": err.to_string() })),
    )
        .into_response()
}

fn cached_json<T: Serialize>(state: &AppState, body: T) -> Response {
    let mut res = Json(body).into_response();
    let directive = if state.cache_ttl.is_zero() {
        "no-store".to_string()
    } else {
        format!("public, max-age={}", state.cache_ttl.as_secs())
    };
    if let Ok(value) = HeaderValue::from_str(&directive) {
        res.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    res
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
