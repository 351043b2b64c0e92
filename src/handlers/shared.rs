use url::Url;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Bookmark,
};

/// Fetch a bookmark owned by `user_id`.
///
/// Someone else's bookmark is reported as 404, same as a missing one, so ids
/// can't be probed.
pub async fn fetch_owned_bookmark(
    pool: &sqlx::PgPool,
    bookmark_id: Uuid,
    user_id: Uuid,
) -> AppResult<Bookmark> {
    sqlx::query_as::<_, Bookmark>("SELECT * FROM bookmarks WHERE id = $1 AND user_id = $2")
        .bind(bookmark_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Bookmark not found".into()))
}

/// Reject anything that is not an absolute http(s) URL with a host.
pub fn require_http_url(raw: &str) -> AppResult<()> {
    let parsed = Url::parse(raw).map_err(|_| AppError::Validation("Invalid URL".into()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        _ => {
            return Err(AppError::Validation(
                "Only http/https URLs are supported".into(),
            ))
        }
    }

    if parsed.host_str().is_none() {
        return Err(AppError::Validation("URL has no host".into()));
    }

    Ok(())
}

pub fn validation_error(e: validator::ValidationErrors) -> AppError {
    AppError::Validation(
        e.field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |err| match &err.message {
                    Some(message) => message.to_string(),
                    None => format!("{field}: invalid ({})", err.code),
                })
            })
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// `%term%` for ILIKE, with the user's own wildcards escaped.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
