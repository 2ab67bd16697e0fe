use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::Service;
use tracing::{info, warn};

use crate::config::PrismConfig;
use crate::error::PrismError;
use crate::query::{Coordinates, Query, TimePeriod, Variables};
use crate::session::PrismSession;
use crate::traits::FormDriver;

/// One query, run in a fresh browser session.
#[derive(Debug, Clone)]
pub struct PrismRequest {
    pub query: Query,
    pub config: PrismConfig,
}

impl PrismRequest {
    pub fn new(coordinates: Coordinates, period: TimePeriod) -> Self {
        Self {
            query: Query::new(coordinates, period, Variables::default()),
            config: PrismConfig::default(),
        }
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.query.variables = variables;
        self
    }

    pub fn with_download_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.download_dir = path.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }
}

/// A downloaded file and its bytes.
#[derive(Debug)]
pub struct PrismResult {
    pub path: PathBuf,
    pub content: Vec<u8>,
}

impl PrismResult {
    pub fn new(path: PathBuf) -> std::io::Result<Self> {
        let content = std::fs::read(&path)?;
        Ok(Self { path, content })
    }
}

/// Submits the query, then closes the session whether or not it succeeded.
pub async fn fetch<D: FormDriver>(
    session: &mut PrismSession<D>,
    query: &Query,
) -> Result<PrismResult, PrismError> {
    let outcome = session.submit_coordinates(query).await;

    if let Err(e) = session.close().await {
        warn!("Failed to close session: {}", e);
    }

    Ok(PrismResult::new(outcome?)?)
}

/// `tower::Service` wrapper that launches a browser per request.
#[derive(Debug, Clone, Default)]
pub struct PrismService {}

impl PrismService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<PrismRequest> for PrismService {
    type Response = PrismResult;
    type Error = PrismError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: PrismRequest) -> Self::Future {
        info!(
            "PRISM request received: {} at {}",
            req.query.period.name(),
            req.query.coordinates
        );

        Box::pin(async move {
            let mut session = PrismSession::new(req.config).await?;
            let result = fetch(&mut session, &req.query).await?;

            info!(
                "PRISM request done: path={:?}, size={}bytes",
                result.path,
                result.content.len()
            );

            Ok(result)
        })
    }
}
