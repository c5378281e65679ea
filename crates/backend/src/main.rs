mod graphql;
mod regions;

use std::path::{Path, PathBuf};

use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::http::HeaderValue;
use axum::{extract::State, response::Html, routing::get, Router};
use birdmap_core::dataset::DatasetCache;
use birdmap_core::ingest::{LoadOptions, RowPolicy};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use graphql::Schema;

async fn graphql_handler(State(schema): State<Schema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphiql() -> Html<String> {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/graphql")
            .finish(),
    )
}

/// Build a cache-controlled static file router.
///
/// Separated so tests can exercise the caching layer with arbitrary directories.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";

/// Build the full application router.
fn build_app(schema: Schema, data_dir: &Path) -> Router {
    // Static file routers are stateless, merge them before adding app state
    let static_files = Router::new().nest("/data", cached_static_router(data_dir, CACHE_1DAY));

    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/", get(landing))
        .with_state(schema)
        .merge(static_files)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let data_path = PathBuf::from(
        std::env::var("DATA_PATH").unwrap_or_else(|_| "data/observations.txt".to_string()),
    );
    let row_limit: usize = std::env::var("ROW_LIMIT")
        .unwrap_or_else(|_| "20000".to_string())
        .parse()
        .expect("ROW_LIMIT must be a non-negative integer");
    let policy = match std::env::var("ROW_POLICY")
        .unwrap_or_else(|_| "skip".to_string())
        .as_str()
    {
        "skip" => RowPolicy::Skip,
        "abort" => RowPolicy::Abort,
        other => panic!("ROW_POLICY must be \"skip\" or \"abort\", got {:?}", other),
    };
    let options = LoadOptions {
        // ROW_LIMIT=0 disables truncation
        limit: (row_limit > 0).then_some(row_limit),
        policy,
    };

    let cache = DatasetCache::new();
    let dataset = cache.get_or_load(&data_path, &options).unwrap_or_else(|e| {
        panic!(
            "Failed to load observations from {}: {}",
            data_path.display(),
            e
        )
    });
    let stats = dataset.stats();
    tracing::info!(
        observations = stats.observations,
        species = stats.species,
        regions = stats.regions,
        "Dataset ready"
    );

    let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));
    let reference_path = data_dir.join("swedish_regions.geojson");
    if reference_path.exists() {
        match regions::RegionReference::load(&reference_path) {
            Ok(reference) => {
                let unmatched =
                    reference.unmatched(dataset.observations().iter().map(|o| o.region.as_str()));
                if !unmatched.is_empty() {
                    tracing::warn!(?unmatched, "Region keys with no reference polygon");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Region reference unavailable"),
        }
    }

    let schema = graphql::build_schema(dataset);
    let app = build_app(schema, &data_dir);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);
    println!("Server running at http://localhost:{}", port);
    println!("GraphiQL playground at http://localhost:{}/graphql", port);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn landing() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>Birds of Sweden</title></head>
<body>
<h1>Birds of Sweden</h1>
<p>Observation data API. Visit <a href="/graphql">GraphiQL</a> to explore the queries,
or fetch the region polygons from <a href="/data/swedish_regions.geojson">/data</a>.</p>
</body>
</html>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use birdmap_core::dataset::Dataset;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Build a test app serving reference data from the given temp directory.
    fn test_app(data_dir: &Path) -> Router {
        let schema = graphql::build_schema(Arc::new(Dataset::default()));
        build_app(schema, data_dir)
    }

    /// Create a temp dir with a test file and return the dir path.
    fn temp_dir_with_file(file_name: &str, content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(file_name), content).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_data_files_have_1day_cache() {
        let data_dir = temp_dir_with_file("swedish_regions.geojson", "{}");
        let app = test_app(data_dir.path());

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/data/swedish_regions.geojson")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=86400, must-revalidate"
        );
    }

    #[tokio::test]
    async fn test_missing_data_file_returns_404() {
        let data_dir = temp_dir_with_file("swedish_regions.geojson", "{}");
        let app = test_app(data_dir.path());

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/data/nonexistent.txt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_landing_page_links_playground() {
        let data_dir = tempfile::tempdir().unwrap();
        let app = test_app(data_dir.path());

        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("/graphql"));
    }

    #[tokio::test]
    async fn test_graphql_post_resolves_queries() {
        let data_dir = tempfile::tempdir().unwrap();
        let app = test_app(data_dir.path());

        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/graphql")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query":"{ stats { observations } }"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains(r#""observations":0"#));
    }
}
