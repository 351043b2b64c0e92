//! Precedence rules between user-submitted fields and fetched metadata.
//!
//! Pure functions only; the network side lives in [`super::Enricher`].

use crate::models::{Bookmark, BookmarkSubmission, BookmarkUpdate, NewBookmark, PageMetadata};

use super::extract::UNTITLED;

/// Enrichment runs again only when the stored URL actually changes.
pub fn should_refetch(old_url: &str, new_url: &str) -> bool {
    old_url != new_url
}

/// Values for a new bookmark row.
///
/// User title/description win when non-empty. Otherwise the fetched title,
/// then `fallback_title` (the title-only fetch), then `"Untitled"`.
pub fn merge_create(
    submission: &BookmarkSubmission,
    fetched: PageMetadata,
    fallback_title: Option<String>,
) -> NewBookmark {
    let title = non_empty(submission.title.as_deref())
        .map(str::to_string)
        .or_else(|| fetched.title.filter(|t| !t.is_empty()))
        .or_else(|| fallback_title.filter(|t| !t.is_empty()))
        .unwrap_or_else(|| UNTITLED.to_string());

    let description = non_empty(submission.description.as_deref())
        .map(str::to_string)
        .unwrap_or(fetched.description);

    NewBookmark {
        url: submission.url.clone(),
        title,
        description,
        tags: submission_tags(submission).unwrap_or_default(),
        favicon: fetched.favicon,
    }
}

/// Values for updating `current`.
///
/// `fetched` is `Some` exactly when the URL changed and enrichment ran. On a
/// URL change the fetched title beats the submitted one, while a submitted
/// description still beats the fetched one.
pub fn merge_update(
    current: &Bookmark,
    submission: &BookmarkSubmission,
    fetched: Option<PageMetadata>,
) -> BookmarkUpdate {
    let tags = submission_tags(submission).unwrap_or_else(|| current.tags.clone());

    match fetched {
        Some(fetched) => {
            let title = fetched
                .title
                .filter(|t| !t.is_empty())
                .or_else(|| non_empty(submission.title.as_deref()).map(str::to_string))
                .unwrap_or_else(|| UNTITLED.to_string());

            let description = non_empty(submission.description.as_deref())
                .map(str::to_string)
                .unwrap_or(fetched.description);

            BookmarkUpdate {
                url: submission.url.clone(),
                title,
                description,
                tags,
                favicon: fetched.favicon,
                refetched: true,
            }
        }
        None => {
            let title = non_empty(submission.title.as_deref())
                .map(str::to_string)
                .unwrap_or_else(|| current.title.clone());

            // An explicit empty description clears it.
            let description = submission
                .description
                .as_deref()
                .map(|d| d.trim().to_string())
                .unwrap_or_else(|| current.description.clone());

            BookmarkUpdate {
                url: submission.url.clone(),
                title,
                description,
                tags,
                favicon: current.favicon.clone(),
                refetched: false,
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn submission_tags(submission: &BookmarkSubmission) -> Option<String> {
    submission.tags.as_deref().map(|t| t.trim().to_string())
}
