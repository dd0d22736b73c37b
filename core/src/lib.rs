//! Async client and paging pipeline for NASA's Near Earth Object web service.
//!
//! # Overview
//! Pages through the NeoWs `browse` listing, fetches the detail record of
//! every object on a page, and hands each record to a `Renderer`. A page is
//! fully drained before the next one can start.
//!
//! # Design
//! - `NeoClient` is stateless and does no I/O itself: `build_*` produces an
//!   `HttpRequest`, `parse_*` consumes an `HttpResponse`, and a pluggable
//!   `Transport` executes the round-trip (host-does-IO pattern).
//! - `PagingPipeline` owns the page index and fans out the items of a page as
//!   concurrent futures on the calling task.
//! - `RenderParams` is the pure mapping from a detail record to animation
//!   parameters; `SceneRenderer` turns them into HTML fragments.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod observer;
pub mod pipeline;
pub mod render;
pub mod testing;
#[cfg(feature = "reqwest")]
pub mod transport;
pub mod types;

pub use client::NeoClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use http::{HttpRequest, HttpResponse, Transport};
pub use observer::{LogObserver, PipelineObserver};
pub use pipeline::{ItemFailure, PageReport, PagingPipeline};
pub use render::{RenderParams, Renderer, SceneRenderer};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use types::{ApiKey, ItemDetail, ItemSummary, PageIndex, PageListing};
