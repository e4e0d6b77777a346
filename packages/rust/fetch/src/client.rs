//! HTTP access to the catalogue site.
//!
//! [`CatalogClient`] builds page URLs from the band identifier, performs one
//! GET per page, and hands the body to a [`PageExtractor`].

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use bandmeta_extract::{
    EventYearsExtractor, OverviewExtractor, PageExtractor, RefFormat, SimilarArtistsExtractor,
    TagsExtractor, TagsPage, TokenStream, WikiExtractor,
};
use bandmeta_shared::{BandDescription, BandMetaError, HttpConfig, Result, Wiki};

/// User-Agent string for catalogue requests.
const USER_AGENT: &str = concat!("bandmeta/", env!("CARGO_PKG_VERSION"));

/// Query parameter carrying the listing page number.
const PAGE_PARAM: &str = "page";

// ---------------------------------------------------------------------------
// PageKind
// ---------------------------------------------------------------------------

/// The pages available for one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Overview,
    Wiki,
    Tags,
    /// One page of the similar-artists listing (1-based).
    SimilarArtists(u32),
    Events,
}

impl PageKind {
    fn suffix(self) -> Option<&'static str> {
        match self {
            Self::Overview => None,
            Self::Wiki => Some("+wiki"),
            Self::Tags => Some("+tags"),
            Self::SimilarArtists(_) => Some("+similar"),
            Self::Events => Some("+events"),
        }
    }
}

// ---------------------------------------------------------------------------
// FetchedPage
// ---------------------------------------------------------------------------

/// Raw response for one page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL actually served, after redirects.
    pub url: Url,
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl FetchedPage {
    /// Listing page number of the served URL, if it carries one.
    pub fn served_page(&self) -> Option<u32> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == PAGE_PARAM)
            .and_then(|(_, value)| value.parse().ok())
    }

    /// Fail on any non-success status; 404 on the overview means the band
    /// does not exist.
    pub fn ensure_success(&self, band: &str, kind: PageKind) -> Result<()> {
        if self.status.is_success() {
            return Ok(());
        }
        if kind == PageKind::Overview && self.status == StatusCode::NOT_FOUND {
            return Err(BandMetaError::NotFound {
                band: band.to_string(),
            });
        }
        Err(BandMetaError::UnexpectedStatus {
            url: self.url.to_string(),
            status: self.status.as_u16(),
        })
    }

    pub fn tokens(&self) -> TokenStream {
        TokenStream::from_bytes(&self.body)
    }
}

// ---------------------------------------------------------------------------
// CatalogClient
// ---------------------------------------------------------------------------

/// Cheaply cloneable client shared by all stages and collector workers.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base: Url,
}

impl CatalogClient {
    /// Create a client for the site at `http.base_url`.
    pub fn new(http: &HttpConfig) -> Result<Self> {
        let base = Url::parse(&http.base_url).map_err(|e| {
            BandMetaError::validation(format!("invalid base URL {}: {e}", http.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(BandMetaError::validation(format!(
                "base URL cannot carry a path: {base}"
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(http.max_redirects))
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()
            .map_err(|e| BandMetaError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base })
    }

    /// URL of `kind` for `band`, e.g. `/music/<band>/+similar?page=2`.
    pub fn page_url(&self, band: &str, kind: PageKind) -> Result<Url> {
        if band.is_empty() {
            return Err(BandMetaError::validation("band name is required"));
        }

        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                BandMetaError::validation(format!("base URL cannot carry a path: {}", self.base))
            })?;
            segments.pop_if_empty().push("music").push(band);
            if let Some(suffix) = kind.suffix() {
                segments.push(suffix);
            }
        }
        if let PageKind::SimilarArtists(page) = kind {
            url.query_pairs_mut()
                .append_pair(PAGE_PARAM, &page.to_string());
        }

        Ok(url)
    }

    /// Issue one GET for `kind`; the status is not checked.
    #[instrument(skip_all, fields(band = %band, ?kind))]
    pub async fn fetch(&self, band: &str, kind: PageKind) -> Result<FetchedPage> {
        let url = self.page_url(band, kind)?;
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| BandMetaError::Transport(format!("{url}: {e}")))?;

        let status = response.status();
        let served = response.url().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| BandMetaError::Transport(format!("{url}: body read failed: {e}")))?;

        debug!(%served, %status, bytes = body.len(), "page fetched");

        Ok(FetchedPage {
            url: served,
            status,
            body: body.to_vec(),
        })
    }

    /// Fetch `kind` and run `extractor` over the body.
    pub async fn read<E: PageExtractor>(
        &self,
        band: &str,
        kind: PageKind,
        extractor: &E,
    ) -> Result<E::Output> {
        let page = self.fetch(band, kind).await?;
        page.ensure_success(band, kind)?;
        let mut stream = page.tokens();
        let output = extractor.extract(&mut stream)?;
        debug!(
            extractor = extractor.name(),
            unread_bytes = stream.unread_bytes(),
            "page extracted"
        );
        Ok(output)
    }

    pub async fn read_overview(&self, band: &str) -> Result<BandDescription> {
        self.read(band, PageKind::Overview, &OverviewExtractor).await
    }

    pub async fn read_wiki(&self, band: &str, ref_format: &RefFormat) -> Result<Wiki> {
        let extractor = WikiExtractor::new(ref_format.clone());
        self.read(band, PageKind::Wiki, &extractor).await
    }

    pub async fn read_tags(&self, band: &str) -> Result<TagsPage> {
        self.read(band, PageKind::Tags, &TagsExtractor).await
    }

    pub async fn read_event_years(&self, band: &str) -> Result<Vec<String>> {
        self.read(band, PageKind::Events, &EventYearsExtractor).await
    }

    /// Read one similar-artists listing page.
    ///
    /// When the site redirects to a different page number the requested page
    /// is past the end: the result is empty, not an error.
    pub async fn read_similar_page(&self, band: &str, page: u32) -> Result<Vec<String>> {
        let kind = PageKind::SimilarArtists(page);
        let fetched = self.fetch(band, kind).await?;
        fetched.ensure_success(band, kind)?;

        let served = fetched.served_page();
        if served != Some(page) {
            debug!(requested = page, ?served, "listing page past the end");
            return Ok(Vec::new());
        }

        SimilarArtistsExtractor.extract(&mut fetched.tokens())
    }
}
