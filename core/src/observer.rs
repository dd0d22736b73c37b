//! Hooks the pipeline reports through.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::pipeline::PageReport;
use crate::types::PageIndex;

/// Receives pipeline outcomes. Every method has a no-op default.
///
/// For each page run exactly one of `listing_failed` or `page_complete` is
/// called, and `page_complete` only after every item has settled.
pub trait PipelineObserver: Send + Sync {
    fn listing_failed(&self, page: PageIndex, error: &ApiError) {
        let _ = (page, error);
    }

    fn item_failed(&self, page: PageIndex, item_id: &str, error: &ApiError) {
        let _ = (page, item_id, error);
    }

    fn page_complete(&self, report: &PageReport) {
        let _ = report;
    }
}

impl<O: PipelineObserver + ?Sized> PipelineObserver for Arc<O> {
    fn listing_failed(&self, page: PageIndex, error: &ApiError) {
        (**self).listing_failed(page, error);
    }

    fn item_failed(&self, page: PageIndex, item_id: &str, error: &ApiError) {
        (**self).item_failed(page, item_id, error);
    }

    fn page_complete(&self, report: &PageReport) {
        (**self).page_complete(report);
    }
}

/// Default observer: reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl PipelineObserver for LogObserver {
    fn listing_failed(&self, page: PageIndex, err: &ApiError) {
        error!(page = page.get(), error = %err, "listing failed");
    }

    fn item_failed(&self, page: PageIndex, item_id: &str, err: &ApiError) {
        warn!(page = page.get(), item = item_id, error = %err, "item failed");
    }

    fn page_complete(&self, report: &PageReport) {
        info!(
            page = report.page.get(),
            attempted = report.attempted,
            rendered = report.rendered,
            failed = report.failures.len(),
            "success"
        );
    }
}
