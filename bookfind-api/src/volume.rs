#[cfg(feature = "json")]
use serde::Deserialize;

/// Author shown when a record carries no author list.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Catalog response body. `items` is optional: its absence means zero
/// results, not an error.
#[cfg_attr(feature = "json", derive(Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPayload {
    #[cfg_attr(feature = "json", serde(default))]
    pub items: Option<Vec<VolumeRecord>>,
}

/// One raw volume record as the catalog sends it.
#[cfg_attr(feature = "json", derive(Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeRecord {
    #[cfg_attr(feature = "json", serde(default))]
    pub id: String,
    #[cfg_attr(feature = "json", serde(rename = "volumeInfo", default))]
    pub volume_info: Option<VolumeInfo>,
}

#[cfg_attr(feature = "json", derive(Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeInfo {
    #[cfg_attr(feature = "json", serde(default))]
    pub title: Option<String>,
    #[cfg_attr(feature = "json", serde(default))]
    pub authors: Option<Vec<String>>,
    #[cfg_attr(feature = "json", serde(rename = "imageLinks", default))]
    pub image_links: Option<ImageLinks>,
    #[cfg_attr(feature = "json", serde(rename = "previewLink", default))]
    pub preview_link: Option<String>,
}

#[cfg_attr(feature = "json", derive(Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageLinks {
    #[cfg_attr(feature = "json", serde(default))]
    pub thumbnail: Option<String>,
}

/// The flattened record the presenter consumes. Never mutated after mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeResult {
    pub id: String,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub preview_url: Option<String>,
}

impl VolumeResult {
    /// Map one raw record. Pure: a missing intermediate object produces
    /// absent fields, never an error. Authors default to
    /// `["Unknown Author"]` only when the source field is absent.
    pub fn from_record(rec: &VolumeRecord) -> Self {
        let info = rec.volume_info.as_ref();
        Self {
            id: rec.id.clone(),
            title: info.and_then(|i| i.title.clone()),
            authors: info
                .and_then(|i| i.authors.clone())
                .unwrap_or_else(|| vec![UNKNOWN_AUTHOR.to_string()]),
            thumbnail_url: info
                .and_then(|i| i.image_links.as_ref())
                .and_then(|l| l.thumbnail.clone()),
            preview_url: info.and_then(|i| i.preview_link.clone()),
        }
    }
}

pub fn map_records(records: &[VolumeRecord]) -> Vec<VolumeResult> {
    records.iter().map(VolumeResult::from_record).collect()
}
