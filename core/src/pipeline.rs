//! Page-at-a-time fetch-and-render pipeline.
//!
//! # Design
//! `PagingPipeline` owns the only mutable state, the current `PageIndex`.
//! `load_next_page` takes `&mut self`, so a second page cannot start while
//! one is in flight. Within a page every item runs fetch-detail-then-render
//! concurrently on the calling task (`join_all`); there is no concurrency
//! cap, no cancellation and no timeout.
//!
//! Completion counts attempts: an item that fails still settles, and the page
//! completes once every item has settled. Failures are reported one by one
//! and collected in the `PageReport`. A failed listing aborts the page
//! without issuing detail requests; the index is not rolled back.

use futures::future::join_all;
use tracing::{debug, info_span, Instrument};

use crate::client::NeoClient;
use crate::error::ApiError;
use crate::http::Transport;
use crate::observer::{LogObserver, PipelineObserver};
use crate::render::Renderer;
use crate::types::{ItemSummary, PageIndex};

/// Outcome of one fully drained page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    pub page: PageIndex,
    /// Items in the listing; every one was attempted.
    pub attempted: usize,
    pub rendered: usize,
    /// Failed items, in listing order.
    pub failures: Vec<ItemFailure>,
    /// Whether the listing said nothing follows this page.
    pub last_page: bool,
}

impl PageReport {
    /// True when every item was fetched and rendered.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    pub id: String,
    pub error: ApiError,
}

pub struct PagingPipeline<T, R> {
    client: NeoClient,
    transport: T,
    renderer: R,
    observer: Box<dyn PipelineObserver>,
    page: PageIndex,
}

impl<T, R> PagingPipeline<T, R>
where
    T: Transport,
    R: Renderer,
{
    /// New pipeline with nothing fetched yet; the first `load_next_page`
    /// requests page 1.
    pub fn new(client: NeoClient, transport: T, renderer: R) -> Self {
        Self {
            client,
            transport,
            renderer,
            observer: Box::new(LogObserver),
            page: PageIndex::NONE,
        }
    }

    /// Start from `page`; the next `load_next_page` requests `page + 1`.
    #[must_use]
    pub fn starting_at(mut self, page: PageIndex) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl PipelineObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Last page index handed to the listing endpoint.
    pub fn page(&self) -> PageIndex {
        self.page
    }

    pub fn client(&self) -> &NeoClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Advance the page index and drain that page.
    pub async fn load_next_page(&mut self) -> Result<PageReport, ApiError> {
        self.page = self.page.next();
        self.run_page(self.page).await
    }

    /// Drain the current page again without advancing, e.g. after its
    /// listing failed. Before any page was loaded this loads page 1.
    pub async fn reload_current_page(&mut self) -> Result<PageReport, ApiError> {
        if self.page.is_none() {
            return self.load_next_page().await;
        }
        self.run_page(self.page).await
    }

    async fn run_page(&self, page: PageIndex) -> Result<PageReport, ApiError> {
        async move {
            let listing = match self.client.fetch_listing(&self.transport, Some(page)).await {
                Ok(listing) => listing,
                Err(err) => {
                    self.observer.listing_failed(page, &err);
                    return Err(err);
                }
            };
            debug!(items = listing.len(), "listing received");

            let items = &listing.near_earth_objects;
            let outcomes = join_all(items.iter().map(|item| self.run_item(page, item))).await;

            let failures: Vec<ItemFailure> = items
                .iter()
                .zip(outcomes)
                .filter_map(|(item, outcome)| {
                    outcome.err().map(|error| ItemFailure {
                        id: item.id.clone(),
                        error,
                    })
                })
                .collect();
            let report = PageReport {
                page,
                attempted: items.len(),
                rendered: items.len() - failures.len(),
                failures,
                last_page: listing.is_last_page(),
            };
            self.observer.page_complete(&report);
            Ok(report)
        }
        .instrument(info_span!("page", number = page.get()))
        .await
    }

    async fn run_item(&self, page: PageIndex, item: &ItemSummary) -> Result<(), ApiError> {
        let result = async {
            let detail = self.client.fetch_detail(&self.transport, &item.id).await?;
            self.renderer.render(&detail).await
        }
        .await;
        if let Err(err) = &result {
            self.observer.item_failed(page, &item.id, err);
        }
        result
    }
}
