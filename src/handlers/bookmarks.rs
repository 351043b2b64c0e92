use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::shared::{fetch_owned_bookmark, like_pattern, require_http_url, validation_error};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{Bookmark, BookmarkSubmission, TagSummary},
    state::AppState,
};

// ============================================================================
// Input validation
// ============================================================================

/// Body of both create and update. On update, omitted optional fields keep
/// their stored values.
#[derive(Debug, Deserialize, Validate)]
pub struct BookmarkRequest {
    pub url: String,
    #[validate(length(max = 500, message = "Title must be at most 500 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
}

impl BookmarkRequest {
    fn into_submission(self) -> AppResult<BookmarkSubmission> {
        self.validate().map_err(validation_error)?;

        let url = self.url.trim().to_string();
        require_http_url(&url)?;

        Ok(BookmarkSubmission {
            url,
            title: self.title,
            description: self.description,
            tags: self.tags,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ListBookmarksQuery {
    /// Case-insensitive match against title or tags.
    #[serde(alias = "searchparam")]
    pub search: Option<String>,
    /// Case-insensitive match against tags only.
    pub tag: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/bookmarks
///
/// Always enriches the URL before inserting. Enrichment failures only make
/// the row sparser; they never fail the request.
pub async fn create_bookmark(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<BookmarkRequest>,
) -> AppResult<(StatusCode, Json<Bookmark>)> {
    let submission = req.into_submission()?;
    info!(user_id = %auth.user_id, url = %submission.url, "Creating bookmark");

    let row = state.enricher.prepare_create(&submission).await;

    let bookmark = sqlx::query_as::<_, Bookmark>(
        r#"
        INSERT INTO bookmarks
            (user_id, url, title, description, tags, favicon, metadata_fetched_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW())
        RETURNING *
        "#,
    )
    .bind(auth.user_id)
    .bind(&row.url)
    .bind(&row.title)
    .bind(&row.description)
    .bind(&row.tags)
    .bind(&row.favicon)
    .fetch_one(&state.pool)
    .await?;

    info!(
        bookmark_id = %bookmark.id,
        title = %bookmark.title,
        has_favicon = bookmark.favicon.is_some(),
        "Bookmark created"
    );

    Ok((StatusCode::CREATED, Json(bookmark)))
}

/// GET /api/bookmarks?search=&tag=
pub async fn list_bookmarks(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListBookmarksQuery>,
) -> AppResult<Json<Vec<Bookmark>>> {
    let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM bookmarks WHERE user_id = ");
    query.push_bind(auth.user_id);

    if let Some(search) = params.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        query
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR tags ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(tag) = params.tag.as_deref().filter(|t| !t.trim().is_empty()) {
        query.push(" AND tags ILIKE ").push_bind(like_pattern(tag));
    }

    query.push(" ORDER BY updated_at DESC NULLS LAST, created_at DESC");

    let bookmarks = query
        .build_query_as::<Bookmark>()
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(bookmarks))
}

/// GET /api/bookmarks/tags
pub async fn list_tags(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<TagSummary>> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT tags FROM bookmarks WHERE user_id = $1 AND tags <> ''",
    )
    .bind(auth.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(TagSummary::from_tag_strings(
        rows.iter().map(String::as_str),
    )))
}

/// PUT /api/bookmarks/:id
///
/// Metadata is refetched only when the URL changes; otherwise only the
/// submitted title/description/tags are applied.
pub async fn update_bookmark(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(bookmark_id): Path<Uuid>,
    Json(req): Json<BookmarkRequest>,
) -> AppResult<Json<Bookmark>> {
    let submission = req.into_submission()?;
    let current = fetch_owned_bookmark(&state.pool, bookmark_id, auth.user_id).await?;

    info!(bookmark_id = %bookmark_id, user_id = %auth.user_id, "Updating bookmark");

    let update = state.enricher.prepare_update(&current, &submission).await;

    let bookmark = sqlx::query_as::<_, Bookmark>(
        r#"
        UPDATE bookmarks
        SET url                 = $1,
            title               = $2,
            description         = $3,
            tags                = $4,
            favicon             = $5,
            metadata_fetched_at = CASE WHEN $6 THEN NOW() ELSE metadata_fetched_at END,
            updated_at          = NOW()
        WHERE id = $7 AND user_id = $8
        RETURNING *
        "#,
    )
    .bind(&update.url)
    .bind(&update.title)
    .bind(&update.description)
    .bind(&update.tags)
    .bind(&update.favicon)
    .bind(update.refetched)
    .bind(bookmark_id)
    .bind(auth.user_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Bookmark not found".into()))?;

    Ok(Json(bookmark))
}

/// DELETE /api/bookmarks/:id
pub async fn delete_bookmark(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(bookmark_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let deleted = sqlx::query_scalar::<_, Uuid>(
        "DELETE FROM bookmarks WHERE id = $1 AND user_id = $2 RETURNING id",
    )
    .bind(bookmark_id)
    .bind(auth.user_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Bookmark not found".into()))?;

    info!(bookmark_id = %deleted, user_id = %auth.user_id, "Bookmark deleted");

    Ok(Json(json!({ "deleted_id": deleted })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> BookmarkRequest {
        BookmarkRequest {
            url: url.into(),
            title: None,
            description: None,
            tags: None,
        }
    }

    #[test]
    fn submission_trims_url() {
        let sub = request("  https://example.com/a  ").into_submission().unwrap();
        assert_eq!(sub.url, "https://example.com/a");
    }

    #[test]
    fn submission_rejects_bad_url() {
        assert!(matches!(
            request("example.com").into_submission(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn submission_rejects_long_title() {
        let mut req = request("https://example.com");
        req.title = Some("t".repeat(501));
        assert!(matches!(
            req.into_submission(),
            Err(AppError::Validation(msg)) if msg.contains("500")
        ));
    }

    #[test]
    fn search_param_accepts_legacy_name() {
        let q: ListBookmarksQuery = serde_json::from_value(json!({ "searchparam": "rust" })).unwrap();
        assert_eq!(q.search.as_deref(), Some("rust"));
    }
}
