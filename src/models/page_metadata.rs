use serde::{Deserialize, Serialize};

/// Metadata derived from a bookmarked page at write time.
///
/// Never persisted on its own: it is merged into the bookmark row and then
/// dropped. `Default` is the shape produced by a failed fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: String,
    pub favicon: Option<String>,
}
