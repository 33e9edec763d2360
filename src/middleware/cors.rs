// CORS configuration

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// `*` (or an empty list) allows every origin; otherwise only the listed ones
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

pub fn apply_cors(router: Router, allowed_origins: &[String]) -> Router {
    router.layer(cors_layer(allowed_origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    async fn allow_origin_for(allowed: &[String], origin: &str) -> Option<String> {
        let app = apply_cors(Router::new().route("/", get(|| async { "ok" })), allowed);
        let request = Request::get("/")
            .header("origin", origin)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        response
            .headers()
            .get("access-control-allow-origin")
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_wildcard_allows_any_origin() {
        let allowed = vec!["*".to_string()];
        assert_eq!(allow_origin_for(&allowed, "https://app.test").await.as_deref(), Some("*"));
    }

    #[tokio::test]
    async fn test_listed_origins_only() {
        let allowed = vec!["https://app.test".to_string()];
        assert_eq!(
            allow_origin_for(&allowed, "https://app.test").await.as_deref(),
            Some("https://app.test")
        );
        assert_eq!(allow_origin_for(&allowed, "https://other.test").await, None);
    }
}
