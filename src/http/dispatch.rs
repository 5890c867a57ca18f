//! Per-request dispatch: stages → lookup → rewrite → forward → relay.
//!
//! # Outcomes
//! - No route: `404 Not found` (or the static site, when configured); no
//!   backend call
//! - Forward succeeds: backend response relayed
//! - Forward fails: `502 Bad Gateway` or `504 Gateway Timeout`, logged with
//!   the target URL and original path; never retried
//!
//! The dispatcher owns the route table. It is built before the listener
//! starts and only read afterwards, so no locking is involved.

use std::net::SocketAddr;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::{ConfigError, GatewayConfig};
use crate::http::forwarder::{ForwardContext, RequestForwarder};
use crate::http::stages::{Stage, Stages};
use crate::http::static_files::StaticSite;
use crate::observability::metrics;
use crate::routing::{outbound_path, RouteTable};

/// Body of the no-route response.
pub const NOT_FOUND_BODY: &str = "Not found";

pub struct Dispatcher {
    routes: RouteTable,
    forwarder: RequestForwarder,
    static_site: Option<StaticSite>,
    stages: Stages,
}

impl Dispatcher {
    pub fn new(routes: RouteTable, forwarder: RequestForwarder) -> Self {
        Self {
            routes,
            forwarder,
            static_site: None,
            stages: Stages::default(),
        }
    }

    /// Build routes, forwarder and static site from a validated config.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let route_configs = config
            .route_configs()
            .map_err(|e| ConfigError::Validation(vec![e.into()]))?;
        let routes = RouteTable::from_config(&route_configs)?;
        let forwarder = RequestForwarder::new(&config.upstream)?;

        let mut dispatcher = Self::new(routes, forwarder);
        if let Some(static_files) = &config.static_files {
            dispatcher = dispatcher.with_static_site(StaticSite::from_config(static_files));
        }
        Ok(dispatcher)
    }

    pub fn with_static_site(mut self, site: StaticSite) -> Self {
        self.static_site = Some(site);
        self
    }

    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn static_site(&self) -> Option<&StaticSite> {
        self.static_site.as_ref()
    }

    pub async fn dispatch(&self, mut request: Request<Body>, client_addr: SocketAddr) -> Response {
        let start = Instant::now();

        let (continued, answer) = self.stages.run_request(&mut request);
        if let Some(mut response) = answer {
            self.stages.run_response(continued, &mut response);
            metrics::record_request("stage", response.status().as_u16(), start);
            return response;
        }

        let mut response = self.route(request, client_addr, start).await;
        self.stages.run_response(continued, &mut response);
        response
    }

    async fn route(&self, request: Request<Body>, client_addr: SocketAddr, start: Instant) -> Response {
        let path = request.uri().path().to_string();

        let Some(route) = self.routes.find_match(&path) else {
            return match &self.static_site {
                Some(site) => {
                    let response = site.serve(request).await;
                    metrics::record_request("static", response.status().as_u16(), start);
                    response
                }
                None => {
                    tracing::debug!(path = %path, client = %client_addr, "No route matched");
                    metrics::record_request("none", StatusCode::NOT_FOUND.as_u16(), start);
                    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
                }
            };
        };

        let outbound = outbound_path(&path, route.rewrite());
        let target = route.backend().join(&outbound, request.uri().query());
        tracing::debug!(
            route = %route.name(),
            path = %path,
            url = %target,
            method = %request.method(),
            "Forwarding request"
        );

        let context = ForwardContext::new(request, client_addr);
        match self.forwarder.forward(&target, context).await {
            Ok(result) => {
                metrics::record_request(route.name(), result.status().as_u16(), start);
                result.into_response(target, route.name().to_string())
            }
            Err(e) => {
                let status = e.status();
                tracing::error!(
                    route = %route.name(),
                    path = %path,
                    url = %target,
                    client = %client_addr,
                    error = %e,
                    status = status.as_u16(),
                    "Forwarding failed"
                );
                metrics::record_forward_failure(route.name(), e.kind());
                metrics::record_request(route.name(), status.as_u16(), start);
                (status, status.canonical_reason().unwrap_or("Bad Gateway")).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::config::UpstreamConfig;
    use crate::http::stages::StageOutcome;
    use crate::routing::RouteEntry;

    fn client() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    fn forwarder() -> RequestForwarder {
        RequestForwarder::new(&UpstreamConfig::default()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn unmatched_path_is_not_found() {
        let mut routes = RouteTable::new();
        routes.add(RouteEntry::new("/api", "http://127.0.0.1:9").unwrap());
        let dispatcher = Dispatcher::new(routes, forwarder());

        let request = Request::get("/other").body(Body::empty()).unwrap();
        let response = dispatcher.dispatch(request, client()).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Not found");
    }

    #[tokio::test]
    async fn unreachable_backend_is_bad_gateway() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let closed = listener.local_addr().unwrap();
        drop(listener);

        let mut routes = RouteTable::new();
        routes.add(RouteEntry::new("/", &format!("http://{closed}")).unwrap());
        let dispatcher = Dispatcher::new(routes, forwarder());

        let request = Request::get("/x").body(Body::empty()).unwrap();
        let response = dispatcher.dispatch(request, client()).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_text(response).await, "Bad Gateway");
    }

    struct Deny;

    impl Stage for Deny {
        fn name(&self) -> &str {
            "deny"
        }

        fn on_request(&self, _request: &mut Request<Body>) -> StageOutcome {
            StageOutcome::Respond((StatusCode::FORBIDDEN, "denied").into_response())
        }
    }

    #[tokio::test]
    async fn stage_answer_skips_routing() {
        let mut routes = RouteTable::new();
        routes.add(RouteEntry::new("/", "http://127.0.0.1:9").unwrap());
        let dispatcher = Dispatcher::new(routes, forwarder()).with_stage(Deny);

        let request = Request::get("/anything").body(Body::empty()).unwrap();
        let response = dispatcher.dispatch(request, client()).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_text(response).await, "denied");
    }

    struct CountResponses(Arc<AtomicUsize>);

    impl Stage for CountResponses {
        fn name(&self) -> &str {
            "count"
        }

        fn on_request(&self, _request: &mut Request<Body>) -> StageOutcome {
            StageOutcome::Continue
        }

        fn on_response(&self, _response: &mut Response) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn stage_answer_runs_earlier_response_hooks() {
        let hits = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(RouteTable::new(), forwarder())
            .with_stage(CountResponses(hits.clone()))
            .with_stage(Deny)
            .with_stage(CountResponses(hits.clone()));

        let request = Request::get("/anything").body(Body::empty()).unwrap();
        let response = dispatcher.dispatch(request, client()).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn timeout_is_gateway_timeout_and_logged() {
        // Accepted by the kernel backlog but never answered.
        let silent = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let backend = silent.local_addr().unwrap();

        let upstream = UpstreamConfig {
            timeout_secs: 1,
            ..UpstreamConfig::default()
        };
        let mut routes = RouteTable::new();
        routes.add(RouteEntry::new("/", &format!("http://{backend}")).unwrap());
        let dispatcher = Dispatcher::new(routes, RequestForwarder::new(&upstream).unwrap());

        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let request = Request::get("/slow?q=1").body(Body::empty()).unwrap();
        let response = dispatcher.dispatch(request, client()).await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body_text(response).await, "Gateway Timeout");

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Forwarding failed"), "{output}");
        assert!(output.contains(&format!("url=http://{backend}/slow?q=1")), "{output}");
        assert!(output.contains("path=/slow"), "{output}");
        drop(silent);
    }

    #[test]
    fn from_config_builds_routes_in_order() {
        let mut config = GatewayConfig::default();
        config.routes.push(crate::config::RouteConfig::new("/a", "http://a.local"));
        config.proxy_map = Some("/b|http://b.local".into());

        let dispatcher = Dispatcher::from_config(&config).unwrap();
        let prefixes: Vec<&str> = dispatcher.routes().iter().map(RouteEntry::match_prefix).collect();
        assert_eq!(prefixes, vec!["/a", "/b"]);
        assert!(dispatcher.static_site().is_none());
    }
}
