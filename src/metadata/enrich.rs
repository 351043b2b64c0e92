use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::extract::{extract, extract_title};
use super::fetcher::{FetchError, PageFetcher};
use super::merge::{merge_create, merge_update, should_refetch};
use crate::models::{Bookmark, BookmarkSubmission, BookmarkUpdate, NewBookmark, PageMetadata};

pub const METADATA_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const TITLE_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Best-effort metadata for the bookmark write path.
///
/// Cheap to clone; holds no per-request state. Fetch failures are logged and
/// turned into `PageMetadata::default()`, never returned to the caller.
#[derive(Clone)]
pub struct Enricher {
    fetcher: Arc<dyn PageFetcher>,
    metadata_timeout: Duration,
    title_timeout: Duration,
}

impl Enricher {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            metadata_timeout: METADATA_FETCH_TIMEOUT,
            title_timeout: TITLE_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, metadata_timeout: Duration, title_timeout: Duration) -> Self {
        self.metadata_timeout = metadata_timeout;
        self.title_timeout = title_timeout;
        self
    }

    /// Full title/description/favicon extraction, surfacing fetch errors.
    pub async fn try_fetch_metadata(&self, url: &str) -> Result<PageMetadata, FetchError> {
        let html = self.fetcher.fetch(url, self.metadata_timeout).await?;
        Ok(extract(&html, url))
    }

    /// Full extraction; a failed fetch yields empty metadata.
    pub async fn fetch_metadata(&self, url: &str) -> PageMetadata {
        match self.try_fetch_metadata(url).await {
            Ok(metadata) => {
                debug!(
                    url = %url,
                    title = ?metadata.title,
                    description_len = metadata.description.chars().count(),
                    favicon = ?metadata.favicon,
                    "Page metadata fetched"
                );
                metadata
            }
            Err(e) => {
                warn!(error = %e, url = %url, "Failed to fetch page metadata");
                PageMetadata::default()
            }
        }
    }

    /// Lighter `<title>`-only lookup on the shorter budget.
    pub async fn fetch_title(&self, url: &str) -> Option<String> {
        match self.fetcher.fetch(url, self.title_timeout).await {
            Ok(html) => extract_title(&html),
            Err(e) => {
                warn!(error = %e, url = %url, "Failed to fetch page title");
                None
            }
        }
    }

    /// Enrich a bookmark being created. Always fetches.
    pub async fn prepare_create(&self, submission: &BookmarkSubmission) -> NewBookmark {
        let fetched = self.fetch_metadata(&submission.url).await;

        let needs_title = submission
            .title
            .as_deref()
            .map_or(true, |t| t.trim().is_empty())
            && fetched.title.as_deref().map_or(true, str::is_empty);

        let fallback_title = if needs_title {
            self.fetch_title(&submission.url).await
        } else {
            None
        };

        merge_create(submission, fetched, fallback_title)
    }

    /// Enrich an update to `current`. Fetches only when the URL changed.
    pub async fn prepare_update(
        &self,
        current: &Bookmark,
        submission: &BookmarkSubmission,
    ) -> BookmarkUpdate {
        let fetched = if should_refetch(&current.url, &submission.url) {
            debug!(
                bookmark_id = %current.id,
                url = %submission.url,
                "URL changed, refetching metadata"
            );
            Some(self.fetch_metadata(&submission.url).await)
        } else {
            None
        };

        merge_update(current, submission, fetched)
    }
}
