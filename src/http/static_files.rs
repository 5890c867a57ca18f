//! Static site served for requests that match no route.

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::StaticFilesConfig;

/// Files under a root directory, with an optional single-page-app fallback.
#[derive(Debug, Clone)]
pub struct StaticSite {
    root: PathBuf,
    dir: ServeDir,
    index: ServeFile,
    spa_fallback: bool,
}

impl StaticSite {
    pub fn new(root: impl AsRef<Path>, spa_fallback: bool) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            dir: ServeDir::new(&root),
            index: ServeFile::new(root.join("index.html")),
            root,
            spa_fallback,
        }
    }

    pub fn from_config(config: &StaticFilesConfig) -> Self {
        Self::new(&config.root, config.spa_fallback)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` is answered with `index.html`.
    ///
    /// Client-side routes (`/`, `/dashboard/settings`) carry no extension;
    /// asset paths (`/app.js`) do.
    pub fn wants_index(&self, path: &str) -> bool {
        self.spa_fallback && (path.is_empty() || path == "/" || !path.contains('.'))
    }

    pub async fn serve(&self, request: Request<Body>) -> Response {
        let result = if self.wants_index(request.uri().path()) {
            self.index.clone().oneshot(request).await.map(|response| response.map(Body::new))
        } else {
            self.dir.clone().oneshot(request).await.map(|response| response.map(Body::new))
        };

        match result {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}
