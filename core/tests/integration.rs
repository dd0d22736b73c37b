//! Client and pipeline against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises the client over
//! real HTTP twice: once through a ureq-backed host transport (the caller
//! executes the request the core built) and once through `ReqwestTransport`
//! driving the whole paging pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use mock_server::{Catalog, Neo};
use neo_core::testing::RecordingObserver;
use neo_core::{
    ApiError, ApiKey, HttpRequest, HttpResponse, NeoClient, PageIndex, PagingPipeline,
    ReqwestTransport, SceneRenderer, Transport,
};

/// Executes requests with blocking ureq on tokio's blocking pool.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// client handle status interpretation.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || {
            let mut builder = agent.get(&request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            let mut response = builder
                .call()
                .map_err(|e| ApiError::Network(e.to_string()))?;
            let status = response.status().as_u16();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ApiError::Network(e.to_string()))?;
            Ok(HttpResponse::new(status, body))
        })
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?
    }
}

/// Start the mock server with `catalog` on a background thread.
fn spawn_server(catalog: Catalog) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, catalog).await
        })
        .unwrap();
    });

    addr
}

fn rock(i: usize) -> Neo {
    Neo::new(&format!("{}", 3_000_000 + i), &format!("Rock {i}"))
        .with_diameter(10.0, 100.0 + i as f64)
        .with_approach("2024-01-01", "7.5")
        .with_orbit("0.31", "1.5")
}

#[tokio::test]
async fn client_lifecycle_over_host_transport() {
    let addr = spawn_server(Catalog::sample());
    let client = NeoClient::new(ApiKey::demo(), &format!("http://{addr}")).unwrap();
    let transport = UreqTransport::new();

    // Step 1: first page via the default index.
    let listing = client.fetch_listing(&transport, None).await.unwrap();
    assert_eq!(listing.len(), 3);
    assert!(listing.is_last_page());
    let first = &listing.near_earth_objects[0];
    assert_eq!(first.id, "2000433");
    assert_eq!(first.detail_url(), Some("/2000433?api_key=DEMO_KEY"));

    // Step 2: detail for every listed object.
    for item in &listing.near_earth_objects {
        let detail = client.fetch_detail(&transport, &item.id).await.unwrap();
        assert_eq!(detail.id, item.id);
        assert_eq!(detail.name, item.name);
    }

    // Step 3: measurements survive the string encoding.
    let eros = client.fetch_detail(&transport, "2000433").await.unwrap();
    let params = neo_core::RenderParams::from_detail(&eros).unwrap();
    assert_eq!(params.eccentricity_index, 2);
    assert!((params.speed - 5.5786).abs() < 1e-9);

    // Step 4: unknown id is a request error carrying the status text.
    let err = client.fetch_detail(&transport, "404404").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Request {
            status: 404,
            status_text: "Not Found".to_string()
        }
    );

    // Step 5: the callback sees exactly what the caller gets.
    let mut notified = Vec::new();
    let result = client
        .fetch_listing_notify(&transport, Some(PageIndex::new(2)), |r| {
            notified.push(r.map(|l| l.len()).map_err(Clone::clone));
        })
        .await
        .map(|l| l.len());
    assert_eq!(notified, vec![result.clone()]);
    assert_eq!(result, Ok(0));
}

#[tokio::test]
async fn missing_key_is_forbidden() {
    let addr = spawn_server(Catalog::sample());
    let client = NeoClient::new(ApiKey::new(""), &format!("http://{addr}")).unwrap();

    let err = client
        .fetch_listing(&UreqTransport::new(), None)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert!(matches!(err, ApiError::Request { ref status_text, .. } if status_text == "Forbidden"));
}

#[tokio::test]
async fn pipeline_drains_every_page_over_reqwest() {
    let catalog = (1..=5).fold(Catalog::new(2), |c, i| c.with(rock(i)));
    let addr = spawn_server(catalog);
    let client = NeoClient::new(ApiKey::new("live"), &format!("http://{addr}")).unwrap();
    let observer = Arc::new(RecordingObserver::new());
    let mut pipeline = PagingPipeline::new(client, ReqwestTransport::new(), SceneRenderer::seeded(11))
        .with_observer(observer.clone());

    let mut reports = Vec::new();
    loop {
        let report = pipeline.load_next_page().await.unwrap();
        let last = report.last_page;
        reports.push(report);
        if last {
            break;
        }
    }

    let attempted: Vec<usize> = reports.iter().map(|r| r.attempted).collect();
    assert_eq!(attempted, vec![2, 2, 1]);
    assert!(reports.iter().all(|r| r.is_clean()));
    assert_eq!(pipeline.page(), PageIndex::new(3));
    assert_eq!(pipeline.renderer().len(), 5);
    assert_eq!(observer.completions().len(), 3);

    // Past the end the listing is empty and the page completes immediately.
    let beyond = pipeline.load_next_page().await.unwrap();
    assert_eq!(beyond.attempted, 0);
    assert!(beyond.last_page);
}

#[tokio::test]
async fn pipeline_reports_malformed_record_and_continues() {
    let catalog = Catalog::new(10)
        .with(rock(1))
        .with(Neo::new("broken", "No orbit").without_orbit())
        .with(rock(2));
    let addr = spawn_server(catalog);
    let client = NeoClient::new(ApiKey::new("live"), &format!("http://{addr}")).unwrap();
    let mut pipeline = PagingPipeline::new(client, ReqwestTransport::new(), SceneRenderer::seeded(5));

    let report = pipeline.load_next_page().await.unwrap();

    assert_eq!(report.attempted, 3);
    assert_eq!(report.rendered, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, "broken");
    assert!(matches!(report.failures[0].error, ApiError::MalformedData(_)));
}

#[tokio::test]
async fn unreachable_server_fails_the_listing() {
    // Bind then drop to get a port nothing listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let client = NeoClient::new(ApiKey::demo(), &format!("http://{addr}")).unwrap();
    let observer = Arc::new(RecordingObserver::new());
    let mut pipeline = PagingPipeline::new(client, ReqwestTransport::new(), SceneRenderer::seeded(1))
        .with_observer(observer.clone());

    let err = pipeline.load_next_page().await.unwrap_err();

    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(observer.listing_failures(), 1);
    assert!(pipeline.renderer().is_empty());
}
