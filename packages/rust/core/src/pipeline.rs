//! End-to-end band query: overview → wiki → tags → similar artists → events.

use std::time::Instant;

use tracing::{info, instrument};

use bandmeta_extract::RefFormat;
use bandmeta_fetch::{CatalogClient, CollectOptions, collect_similar_artists};
use bandmeta_shared::{BandDescription, QueryConfig, Result};

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn phase(&self, name: &str);
    /// Called once the aggregate is complete.
    fn done(&self, result: &BandDescription);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &BandDescription) {}
}

/// Run every requested stage for `config.band` and build the aggregate.
///
/// 1. Overview (always)
/// 2. Wiki
/// 3. Tags, with the sidebar similar artists
/// 4. Similar artists (paginated; replaces the sidebar list)
/// 5. Event years
///
/// The first failing stage aborts the query; no partial aggregate is returned.
#[instrument(skip_all, fields(band = %config.band))]
pub async fn query_band(
    config: &QueryConfig,
    progress: &dyn ProgressReporter,
) -> Result<BandDescription> {
    let start = Instant::now();
    config.validate()?;

    let ref_format = RefFormat::parse(&config.wiki_ref_format)?;
    let client = CatalogClient::new(&config.http)?;
    let band = config.band.as_str();
    let stages = config.stages;

    info!(?stages, "starting band query");

    // --- Stage 1: Overview ---
    progress.phase("Reading overview");
    let mut description = client.read_overview(band).await?;

    // --- Stage 2: Wiki ---
    if stages.wiki {
        progress.phase("Reading wiki");
        description.wiki = Some(client.read_wiki(band, &ref_format).await?);
    }

    // --- Stage 3: Tags ---
    if stages.tags {
        progress.phase("Reading tags");
        let page = client.read_tags(band).await?;
        description.tags = Some(page.tags);
        description.similar_artists = Some(page.similar);
    }

    // --- Stage 4: Similar artists ---
    if stages.similar_artists {
        let opts = CollectOptions::from(config);
        let range = opts.page_range()?;
        progress.phase(&format!(
            "Collecting similar artists (pages {}-{}, {} worker(s))",
            range.start(),
            range.end(),
            opts.workers
        ));
        description.similar_artists = Some(collect_similar_artists(&client, band, &opts).await?);
    }

    // --- Stage 5: Event years ---
    if stages.events {
        progress.phase("Reading event years");
        description.event_years = Some(client.read_event_years(band).await?);
    }

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "band query complete"
    );
    progress.done(&description);

    Ok(description)
}
