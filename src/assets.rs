use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderMap, HeaderName};
use axum::response::Response;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::{Config, Mode};
use crate::error::AppError;
use crate::state::SharedState;

/// Where page and asset requests are answered from.
pub enum Assets {
    /// Pre-built bundle on disk, with `index.html` for every unknown path so
    /// client-side routes resolve.
    Static(ServeDir<ServeFile>),
    /// Live-reloading bundler running next to us.
    Proxy(DevProxy),
}

pub struct DevProxy {
    client: reqwest::Client,
    upstream: String,
    max_body_size: usize,
}

impl Assets {
    pub fn from_config(config: &Config) -> Result<Self, String> {
        match config.mode {
            Mode::Production => {
                let index = config.static_dir.join("index.html");
                if !index.is_file() {
                    return Err(format!(
                        "Could not find the build directory: {}, make sure to build the client first",
                        config.static_dir.display()
                    ));
                }
                Ok(Assets::Static(
                    ServeDir::new(&config.static_dir).fallback(ServeFile::new(index)),
                ))
            }
            Mode::Development => {
                let client = reqwest::Client::builder()
                    .redirect(reqwest::redirect::Policy::none())
                    .build()
                    .map_err(|e| format!("Failed to build proxy client: {e}"))?;
                Ok(Assets::Proxy(DevProxy {
                    client,
                    upstream: config.dev_server_url.clone(),
                    max_body_size: config.max_body_size,
                }))
            }
        }
    }
}

/// Fallback for everything the API router does not claim.
pub async fn serve(State(state): State<SharedState>, req: Request) -> Result<Response, AppError> {
    let path = req.uri().path();
    if path == "/api" || path.starts_with("/api/") {
        return Err(AppError::NotFound(format!("No API route for {path}")));
    }

    match &state.assets {
        Assets::Static(dir) => {
            let Ok(response) = dir.clone().oneshot(req).await;
            Ok(response.map(Body::new))
        }
        Assets::Proxy(proxy) => proxy.forward(req).await,
    }
}

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

impl DevProxy {
    async fn forward(&self, req: Request) -> Result<Response, AppError> {
        let (parts, body) = req.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = format!("{}{}", self.upstream, path_and_query);

        let body = axum::body::to_bytes(body, self.max_body_size)
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read request body: {e}")))?;

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);

        let upstream = self
            .client
            .request(parts.method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::BadGateway(format!("{url}: {e}")))?;

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
