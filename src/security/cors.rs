use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use log::{info, warn};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Headers the browser client sends with function calls.
pub const EDGE_FUNCTION_HEADERS: [&str; 4] =
    ["authorization", "x-client-info", "apikey", "content-type"];

pub const PREFLIGHT_MAX_AGE_SECS: u64 = 86400;

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<String>,
    pub max_age_secs: u64,
}

impl CorsConfig {
    /// Policy for the edge-function routes: one front-end origin, `POST` and
    /// preflight only.
    pub fn edge_functions(frontend_url: &str) -> Self {
        Self {
            allowed_origins: vec![frontend_url.trim_end_matches('/').to_string()],
            allowed_methods: vec![Method::POST, Method::OPTIONS],
            allowed_headers: EDGE_FUNCTION_HEADERS.iter().map(|h| h.to_string()).collect(),
            max_age_secs: PREFLIGHT_MAX_AGE_SECS,
        }
    }

    fn origin_values(&self) -> Vec<HeaderValue> {
        self.allowed_origins
            .iter()
            .filter(|o| {
                let ok = is_valid_origin_format(o);
                if !ok {
                    warn!("Ignoring invalid CORS origin: {o}");
                }
                ok
            })
            .filter_map(|o| o.parse().ok())
            .collect()
    }

    /// Headers sent on a plain `OPTIONS` reply, which is answered by a handler
    /// rather than the layer.
    pub fn preflight_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(origin) = self.origin_values().into_iter().next() {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        }
        let methods: Vec<&str> = self.allowed_methods.iter().map(Method::as_str).collect();
        let pairs = [
            (header::ACCESS_CONTROL_ALLOW_METHODS, methods.join(", ")),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, self.allowed_headers.join(", ")),
            (header::ACCESS_CONTROL_MAX_AGE, self.max_age_secs.to_string()),
        ];
        for (name, value) in pairs {
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(name, value);
            }
        }
        headers
    }

    pub fn build(self) -> CorsLayer {
        let origins = self.origin_values();

        let allow_origin = if origins.len() == 1 {
            AllowOrigin::exact(origins[0].clone())
        } else {
            AllowOrigin::list(origins)
        };

        let headers: Vec<HeaderName> = self
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(self.allowed_methods)
            .allow_headers(headers)
            .max_age(Duration::from_secs(self.max_age_secs))
    }
}

fn is_valid_origin_format(origin: &str) -> bool {
    let Some(rest) = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
    else {
        return false;
    };
    !rest.is_empty() && !rest.contains("//") && !rest.contains("..")
}

pub fn create_cors_layer(frontend_url: &str) -> CorsLayer {
    info!("Creating CORS layer for origin {frontend_url}");
    CorsConfig::edge_functions(frontend_url).build()
}
