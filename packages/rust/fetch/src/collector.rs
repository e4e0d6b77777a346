//! Paginated collection of the similar-artists listing.
//!
//! Pages `O+1 ..= O+P` are read either one after another or by a pool of
//! `W` workers that claim page numbers from a shared atomic counter. The
//! merged list is ordered by page number, then by document order.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use bandmeta_shared::{BandMetaError, MAX_PAGES, QueryConfig, Result};

use crate::client::CatalogClient;

/// Artists per listing page on the site; used to pre-size the merge buffer.
pub const PAGE_SIZE: usize = 10;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Page range and worker pool settings for one collection.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Number of pages to read (`P`).
    pub pages: u32,
    /// Pages skipped before the first one read (`O`).
    pub offset: u32,
    /// Worker count (`W`); 1 reads sequentially.
    pub workers: u32,
    /// Overall deadline of a concurrent collection.
    pub deadline: Duration,
}

impl CollectOptions {
    /// True when pages are read by the worker pool.
    pub fn is_concurrent(&self) -> bool {
        self.workers > 1
    }

    /// Pages `O+1 ..= O+P`.
    ///
    /// Fails for more than [`MAX_PAGES`] pages or a range past `u32::MAX`.
    pub fn page_range(&self) -> Result<RangeInclusive<u32>> {
        if self.pages > MAX_PAGES {
            return Err(BandMetaError::validation(format!(
                "similar artists pages must be at most {MAX_PAGES}, got {}",
                self.pages
            )));
        }
        if self.pages == 0 {
            return Ok(1..=0);
        }
        let last = self.offset.checked_add(self.pages).ok_or_else(|| {
            BandMetaError::validation(format!(
                "page offset {} plus {} pages is out of range",
                self.offset, self.pages
            ))
        })?;
        Ok(self.offset + 1..=last)
    }
}

impl From<&QueryConfig> for CollectOptions {
    fn from(config: &QueryConfig) -> Self {
        Self {
            pages: config.pages,
            offset: config.page_offset,
            workers: config.workers,
            deadline: Duration::from_secs(config.http.collect_deadline_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Collect similar artists, concurrently when more than one worker is set.
pub async fn collect_similar_artists(
    client: &CatalogClient,
    band: &str,
    opts: &CollectOptions,
) -> Result<Vec<String>> {
    if opts.is_concurrent() {
        collect_concurrent(client, band, opts).await
    } else {
        collect_sequential(client, band, opts).await
    }
}

/// Read pages in increasing order; the first failing page aborts.
#[instrument(skip_all, fields(band = %band, pages = opts.pages, offset = opts.offset))]
pub async fn collect_sequential(
    client: &CatalogClient,
    band: &str,
    opts: &CollectOptions,
) -> Result<Vec<String>> {
    let mut artists = Vec::new();

    for page in opts.page_range()? {
        let names = client.read_similar_page(band, page).await?;
        debug!(page, count = names.len(), "listing page collected");
        artists.extend(names);
    }

    info!(count = artists.len(), "similar artists collected");
    Ok(artists)
}

/// Read pages with a pool of `opts.workers` tasks.
///
/// A worker stops claiming pages after an empty (past-the-end) page. Worker
/// errors do not stop siblings; once every worker has finished, the first
/// error observed fails the whole call and all collected pages are dropped.
#[instrument(
    skip_all,
    fields(band = %band, pages = opts.pages, offset = opts.offset, workers = opts.workers)
)]
pub async fn collect_concurrent(
    client: &CatalogClient,
    band: &str,
    opts: &CollectOptions,
) -> Result<Vec<String>> {
    let range = opts.page_range()?;
    let (first_page, last_page) = (*range.start(), *range.end());

    let deadline = Instant::now() + opts.deadline;
    // Wide enough that claims past `last_page` never wrap.
    let next_page = Arc::new(AtomicU64::new(u64::from(opts.offset)));
    let band: Arc<str> = Arc::from(band);

    let (pages_tx, mut pages_rx) = mpsc::channel::<(u32, Vec<String>)>(1);
    let (errors_tx, mut errors_rx) = mpsc::channel::<BandMetaError>(1);

    let mut workers = JoinSet::new();
    // A worker beyond one per page would never claim anything.
    for worker in 0..opts.workers.min(opts.pages) {
        let client = client.clone();
        let band = Arc::clone(&band);
        let next_page = Arc::clone(&next_page);
        let pages_tx = pages_tx.clone();
        let errors_tx = errors_tx.clone();

        workers.spawn(
            async move {
                loop {
                    let claimed = next_page.fetch_add(1, Ordering::SeqCst) + 1;
                    let Some(page) = u32::try_from(claimed).ok().filter(|p| *p <= last_page) else {
                        break;
                    };

                    let read = timeout_at(deadline, client.read_similar_page(&band, page))
                        .await
                        .unwrap_or_else(|_| {
                            Err(BandMetaError::Transport(format!(
                                "similar artists page {page}: collection deadline exceeded"
                            )))
                        });

                    match read {
                        Ok(names) if names.is_empty() => {
                            debug!(page, "past the last listing page, worker done");
                            break;
                        }
                        Ok(names) => {
                            if pages_tx.send((page, names)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(page, error = %e, "listing page failed");
                            if errors_tx.send(e).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
            .instrument(info_span!("collector_worker", worker)),
        );
    }

    // Workers hold the only remaining senders: both channels close once
    // every worker has finished.
    drop(pages_tx);
    drop(errors_tx);

    let mut slots: Vec<Option<Vec<String>>> = vec![None; opts.pages as usize];
    let mut errors: Vec<BandMetaError> = Vec::new();

    loop {
        tokio::select! {
            Some((page, names)) = pages_rx.recv() => {
                let index = (page - first_page) as usize;
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(names);
                }
            }
            Some(err) = errors_rx.recv() => errors.push(err),
            else => break,
        }
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            errors.push(BandMetaError::Task(e.to_string()));
        }
    }

    if let Some(first) = errors.into_iter().next() {
        return Err(first);
    }

    let mut artists = Vec::with_capacity(PAGE_SIZE * opts.pages as usize);
    artists.extend(slots.into_iter().flatten().flatten());

    info!(count = artists.len(), "similar artists collected");
    Ok(artists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandmeta_shared::HttpConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LISTING: &str = "/music/Slowdive/+similar";

    /// A listing page whose artists are `p<page>-a<i>`.
    fn listing(page: u32, count: usize) -> String {
        let items: String = (0..count)
            .map(|i| {
                format!(r#"<li><a class="link-block-target" href="/music/x">p{page}-a{i}</a></li>"#)
            })
            .collect();
        format!(r#"<html><body><ol class="similar-artists">{items}</ol></body></html>"#)
    }

    /// Serve pages `1..=available`; later pages redirect to the last one.
    async fn mount_listing(server: &MockServer, available: u32, requested_up_to: u32) {
        for page in 1..=requested_up_to {
            let response = if page <= available {
                ResponseTemplate::new(200).set_body_string(listing(page, 3))
            } else {
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("{LISTING}?page={available}").as_str())
            };
            Mock::given(method("GET"))
                .and(path(LISTING))
                .and(query_param("page", page.to_string().as_str()))
                .respond_with(response)
                .mount(server)
                .await;
        }
    }

    fn client_for(server: &MockServer) -> CatalogClient {
        CatalogClient::new(&HttpConfig {
            base_url: server.uri(),
            ..Default::default()
        })
        .unwrap()
    }

    fn opts(pages: u32, offset: u32, workers: u32) -> CollectOptions {
        CollectOptions {
            pages,
            offset,
            workers,
            deadline: Duration::from_secs(30),
        }
    }

    fn expected(pages: std::ops::RangeInclusive<u32>) -> Vec<String> {
        pages
            .flat_map(|p| (0..3).map(move |i| format!("p{p}-a{i}")))
            .collect()
    }

    #[test]
    fn options_from_query_config() {
        let mut query = QueryConfig::new("Slowdive", &Default::default());
        query.pages = 7;
        query.page_offset = 2;
        query.workers = 3;
        let opts = CollectOptions::from(&query);
        assert_eq!(opts.page_range().unwrap(), 3..=9);
        assert!(opts.is_concurrent());
        assert_eq!(opts.deadline, Duration::from_secs(30));
    }

    #[test]
    fn page_range_rejects_unbounded_ranges() {
        let err = opts(u32::MAX, 1, 1).page_range().unwrap_err();
        assert!(matches!(err, BandMetaError::Validation { .. }));

        let err = opts(10, u32::MAX - 5, 1).page_range().unwrap_err();
        assert!(err.to_string().contains("out of range"));

        assert_eq!(opts(5, u32::MAX - 5, 1).page_range().unwrap().count(), 5);
        assert_eq!(opts(0, u32::MAX, 1).page_range().unwrap().count(), 0);
    }

    #[tokio::test]
    async fn oversized_ranges_fail_before_any_request() {
        let server = MockServer::start().await;
        mount_listing(&server, 1, 1).await;
        let client = client_for(&server);

        let err = collect_sequential(&client, "Slowdive", &opts(u32::MAX, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, BandMetaError::Validation { .. }));

        let err = collect_concurrent(&client, "Slowdive", &opts(u32::MAX, 1, 4))
            .await
            .unwrap_err();
        assert!(matches!(err, BandMetaError::Validation { .. }));

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn range_ending_at_u32_max_terminates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTING))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing(0, 1)))
            .mount(&server)
            .await;

        let options = opts(3, u32::MAX - 3, 3);
        let artists = collect_concurrent(&client_for(&server), "Slowdive", &options)
            .await
            .unwrap();
        // Claims past u32::MAX stop the workers instead of wrapping to page 1.
        assert_eq!(artists.len(), 3);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn sequential_concatenates_in_page_order() {
        let server = MockServer::start().await;
        mount_listing(&server, 3, 5).await;

        let artists = collect_sequential(&client_for(&server), "Slowdive", &opts(5, 0, 1))
            .await
            .unwrap();
        assert_eq!(artists, expected(1..=3));
    }

    #[tokio::test]
    async fn sequential_respects_offset() {
        let server = MockServer::start().await;
        mount_listing(&server, 5, 5).await;

        let artists = collect_sequential(&client_for(&server), "Slowdive", &opts(2, 1, 1))
            .await
            .unwrap();
        assert_eq!(artists, expected(2..=3));
    }

    #[tokio::test]
    async fn sequential_aborts_on_first_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTING))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_listing(&server, 5, 5).await;

        let err = collect_sequential(&client_for(&server), "Slowdive", &opts(5, 0, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, BandMetaError::UnexpectedStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn concurrent_matches_sequential_when_listing_is_short() {
        let server = MockServer::start().await;
        mount_listing(&server, 3, 8).await;
        let client = client_for(&server);

        let sequential = collect_sequential(&client, "Slowdive", &opts(8, 0, 1))
            .await
            .unwrap();
        for workers in [2, 3, 4, 8] {
            let concurrent = collect_concurrent(&client, "Slowdive", &opts(8, 0, workers))
                .await
                .unwrap();
            assert_eq!(concurrent, sequential, "workers = {workers}");
        }
    }

    #[tokio::test]
    async fn concurrent_orders_by_page_number() {
        let server = MockServer::start().await;
        // Early pages answer last.
        for page in 1..=4u32 {
            Mock::given(method("GET"))
                .and(path(LISTING))
                .and(query_param("page", page.to_string().as_str()))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(listing(page, 3))
                        .set_delay(Duration::from_millis(u64::from(5 - page) * 40)),
                )
                .mount(&server)
                .await;
        }

        let artists = collect_concurrent(&client_for(&server), "Slowdive", &opts(4, 0, 4))
            .await
            .unwrap();
        assert_eq!(artists, expected(1..=4));
    }

    #[tokio::test]
    async fn concurrent_uses_offset_like_sequential() {
        let server = MockServer::start().await;
        mount_listing(&server, 6, 6).await;

        let artists = collect_concurrent(&client_for(&server), "Slowdive", &opts(3, 2, 2))
            .await
            .unwrap();
        assert_eq!(artists, expected(3..=5));
    }

    #[tokio::test]
    async fn concurrent_single_failure_fails_the_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTING))
            .and(query_param("page", "5"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        mount_listing(&server, 8, 8).await;

        let err = collect_concurrent(&client_for(&server), "Slowdive", &opts(8, 0, 4))
            .await
            .unwrap_err();
        assert!(matches!(err, BandMetaError::UnexpectedStatus { status: 500, .. }));

        // Every page was still requested: no early cancellation.
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 8);
    }

    #[tokio::test]
    async fn concurrent_deadline_fails_the_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LISTING))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(listing(1, 3))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let mut options = opts(2, 0, 2);
        options.deadline = Duration::from_millis(200);

        let err = collect_concurrent(&client_for(&server), "Slowdive", &options)
            .await
            .unwrap_err();
        assert!(matches!(err, BandMetaError::Transport(msg) if msg.contains("deadline")));
    }

    #[tokio::test]
    async fn dispatches_on_worker_count() {
        let server = MockServer::start().await;
        mount_listing(&server, 2, 2).await;
        let client = client_for(&server);

        for workers in [1, 2] {
            let artists = collect_similar_artists(&client, "Slowdive", &opts(2, 0, workers))
                .await
                .unwrap();
            assert_eq!(artists, expected(1..=2));
        }
    }
}
