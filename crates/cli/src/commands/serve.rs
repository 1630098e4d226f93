use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use geoblog_sitemap::SitemapGenerator;
use geoblog_wordpress::{HttpTransport, PostFetcher, Transport};
use serde::Deserialize;
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

use super::load_config;

const SITEMAP_CACHE_CONTROL: &str = "public, max-age=3600, s-maxage=3600";
const INTERNAL_ERROR_MESSAGE: &str = "Erro interno do servidor";
const DEFAULT_CATEGORY_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

pub struct AppState<T> {
    fetcher: Arc<PostFetcher<T>>,
    sitemap: Arc<SitemapGenerator<T>>,
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            sitemap: Arc::clone(&self.sitemap),
        }
    }
}

impl<T> AppState<T> {
    pub fn new(fetcher: PostFetcher<T>, sitemap: SitemapGenerator<T>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            sitemap: Arc::new(sitemap),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

/// Serve the dynamic sitemap and the read-only JSON API.
pub async fn run(config_path: &std::path::Path, host: IpAddr, port: u16) -> Result<()> {
    println!("🌐 Starting geoblog server...");

    let config = load_config(config_path)?;
    println!("   Upstream: {}", config.api.base_url);
    println!("   Site: {}", config.site.base_url);

    let transport = HttpTransport::new(&config.api).context("Failed to create HTTP client")?;
    let fetcher =
        PostFetcher::new(config.clone(), transport.clone()).context("Invalid configuration")?;
    let sitemap = SitemapGenerator::new(config, transport).context("Invalid configuration")?;

    let app = router(AppState::new(fetcher, sitemap));

    let addr = SocketAddr::from((host, port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Listening on http://{}", addr);
    println!("   Sitemap: http://{}/sitemap.xml", addr);
    println!("   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

pub fn router<T: Transport + 'static>(state: AppState<T>) -> Router {
    Router::new()
        .route("/sitemap.xml", get(sitemap_xml::<T>))
        .route("/api/posts/featured", get(featured_posts::<T>))
        .route("/api/posts/{slug}", get(post_by_slug::<T>))
        .route("/api/categories", get(categories::<T>))
        .route("/api/categories/{slug}/posts", get(category_posts::<T>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn sitemap_xml<T: Transport + 'static>(State(state): State<AppState<T>>) -> Response {
    match state.sitemap.generate().await {
        Ok(xml) => (
            [
                (header::CONTENT_TYPE, "application/xml"),
                (header::CACHE_CONTROL, SITEMAP_CACHE_CONTROL),
            ],
            xml,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "sitemap generation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
        }
    }
}

async fn featured_posts<T: Transport + 'static>(
    State(state): State<AppState<T>>,
    Query(query): Query<LimitQuery>,
) -> Response {
    let limit = query
        .limit
        .unwrap_or(state.fetcher.config().site.featured_limit)
        .min(MAX_LIMIT);

    let report = state.fetcher.featured_report(limit).await;
    if report.all_failed() {
        return error_response(StatusCode::BAD_GATEWAY, "Erro ao carregar posts em destaque");
    }
    Json(report.posts).into_response()
}

async fn post_by_slug<T: Transport + 'static>(
    State(state): State<AppState<T>>,
    Path(slug): Path<String>,
) -> Response {
    match state.fetcher.try_post_by_slug(&slug).await {
        Ok(Some(post)) => Json(post).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Post não encontrado"),
        Err(e) => {
            error!(slug = %slug, error = %e, "post lookup failed");
            error_response(StatusCode::BAD_GATEWAY, "Erro ao carregar o post")
        }
    }
}

async fn categories<T: Transport + 'static>(State(state): State<AppState<T>>) -> Response {
    match state.fetcher.try_categories().await {
        Ok(categories) => Json(categories).into_response(),
        Err(e) => {
            error!(error = %e, "category listing failed");
            error_response(StatusCode::BAD_GATEWAY, "Erro ao carregar categorias")
        }
    }
}

/// Accepts a numeric category id or a slug; slugs are resolved through the
/// category listing since WordPress filters posts by id.
async fn category_posts<T: Transport + 'static>(
    State(state): State<AppState<T>>,
    Path(slug): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_CATEGORY_LIMIT).min(MAX_LIMIT);

    let category_id = match slug.parse::<u64>() {
        Ok(id) => id,
        Err(_) => match state.fetcher.try_categories().await {
            Ok(categories) => match categories.iter().find(|c| c.slug == slug) {
                Some(category) => category.id,
                None => return error_response(StatusCode::NOT_FOUND, "Categoria não encontrada"),
            },
            Err(e) => {
                error!(slug = %slug, error = %e, "category lookup failed");
                return error_response(StatusCode::BAD_GATEWAY, "Erro ao carregar categorias");
            }
        },
    };

    match state
        .fetcher
        .try_posts_by_category(&category_id.to_string(), limit)
        .await
    {
        Ok(posts) => Json(posts).into_response(),
        Err(e) => {
            error!(category_id, error = %e, "category posts failed");
            error_response(
                StatusCode::BAD_GATEWAY,
                &format!("Erro ao carregar posts da categoria {}", slug),
            )
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
