//! In-memory doubles for driving the client and pipeline without a network.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::observer::PipelineObserver;
use crate::pipeline::PageReport;
use crate::render::Renderer;
use crate::types::{ItemDetail, PageIndex};

/// Transport answering from a table keyed by full request URL.
///
/// Unknown URLs get an empty 404. Each call yields to the scheduler once
/// before answering, so concurrent requests interleave.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, Result<HttpResponse, ApiError>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: impl Into<String>, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .insert(url.into(), Ok(HttpResponse::new(status, body)));
    }

    pub fn respond_json(&self, url: impl Into<String>, body: &serde_json::Value) {
        self.respond(url, 200, body.to_string());
    }

    /// Make requests to `url` fail at the transport level.
    pub fn fail(&self, url: impl Into<String>, error: ApiError) {
        self.routes.lock().insert(url.into(), Err(error));
    }

    /// Every URL requested so far, in call order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of requests whose URL contains `fragment`.
    pub fn requests_matching(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|url| url.contains(fragment))
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().push(request.url.clone());
        tokio::task::yield_now().await;
        let answer = self.routes.lock().get(&request.url).cloned();
        answer.unwrap_or_else(|| Ok(HttpResponse::new(404, "")))
    }
}

/// Renderer that records the ids it was asked to render.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    rendered: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make rendering `id` fail with `ApiError::Render`.
    pub fn fail_on(&self, id: impl Into<String>) {
        self.failing.lock().insert(id.into());
    }

    /// Ids rendered successfully, in completion order.
    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().clone()
    }
}

#[async_trait]
impl Renderer for RecordingRenderer {
    async fn render(&self, detail: &ItemDetail) -> Result<(), ApiError> {
        tokio::task::yield_now().await;
        if self.failing.lock().contains(&detail.id) {
            return Err(ApiError::Render(format!("{} refused", detail.id)));
        }
        self.rendered.lock().push(detail.id.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    ListingFailed {
        page: PageIndex,
        error: ApiError,
    },
    ItemFailed {
        page: PageIndex,
        item_id: String,
        error: ApiError,
    },
    PageComplete(PageReport),
}

/// Observer that keeps every event it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().clone()
    }

    pub fn completions(&self) -> Vec<PageReport> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                PipelineEvent::PageComplete(report) => Some(report.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn listing_failures(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, PipelineEvent::ListingFailed { .. }))
            .count()
    }
}

impl PipelineObserver for RecordingObserver {
    fn listing_failed(&self, page: PageIndex, error: &ApiError) {
        self.events.lock().push(PipelineEvent::ListingFailed {
            page,
            error: error.clone(),
        });
    }

    fn item_failed(&self, page: PageIndex, item_id: &str, error: &ApiError) {
        self.events.lock().push(PipelineEvent::ItemFailed {
            page,
            item_id: item_id.to_string(),
            error: error.clone(),
        });
    }

    fn page_complete(&self, report: &PageReport) {
        self.events
            .lock()
            .push(PipelineEvent::PageComplete(report.clone()));
    }
}
