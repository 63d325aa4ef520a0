//! Download tasks and their enumeration

use std::fmt;

use serde::Serialize;

use crate::core::catalog::Catalog;
use crate::core::error::{Error, Result};
use crate::core::source::TileRef;

/// Selector of the full-size image on a `File:` page
pub const FULL_IMAGE_SELECTOR: &str = "#file > a > img";

/// Selector of the current revision's thumbnail in the file history table
pub const HISTORY_THUMBNAIL_SELECTOR: &str =
    "#mw-imagepage-section-filehistory > table > tbody > tr:nth-child(2) > td:nth-child(3) > a > img";

/// Which image on the page to fetch, and whether it is saved as a thumbnail
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SelectorVariant {
    pub selector: String,
    pub thumbnail: bool,
}

impl SelectorVariant {
    pub fn full_image() -> Self {
        Self {
            selector: FULL_IMAGE_SELECTOR.to_string(),
            thumbnail: false,
        }
    }

    pub fn history_thumbnail() -> Self {
        Self {
            selector: HISTORY_THUMBNAIL_SELECTOR.to_string(),
            thumbnail: true,
        }
    }
}

/// The two variants applied to every tile
pub fn default_selectors() -> Vec<SelectorVariant> {
    vec![SelectorVariant::full_image(), SelectorVariant::history_thumbnail()]
}

/// Reject selector sets that would make two tasks write the same file
pub fn validate_selectors(selectors: &[SelectorVariant]) -> Result<()> {
    if selectors.is_empty() {
        return Err(Error::InvalidInput("at least one selector is required".to_string()));
    }
    for flag in [false, true] {
        if selectors.iter().filter(|v| v.thumbnail == flag).count() > 1 {
            return Err(Error::InvalidInput(format!(
                "more than one selector with thumbnail = {flag} would overwrite the same files"
            )));
        }
    }
    Ok(())
}

/// One unit of work: a tile and the image to pull from its page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DownloadTask {
    pub tile: TileRef,
    pub variant: SelectorVariant,
}

impl DownloadTask {
    pub fn new(tile: TileRef, variant: SelectorVariant) -> Self {
        Self { tile, variant }
    }

    pub fn is_other(&self) -> bool {
        matches!(self.tile, TileRef::Other { .. })
    }
}

impl fmt::Display for DownloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variant.thumbnail {
            write!(f, "{} (thumbnail)", self.tile)
        } else {
            write!(f, "{}", self.tile)
        }
    }
}

/// Every task for the catalog: each indexed tile, then each other tile,
/// crossed with every selector variant
pub fn plan_tasks(catalog: &Catalog, selectors: &[SelectorVariant]) -> Result<Vec<DownloadTask>> {
    let mut tasks = Vec::new();

    for category in catalog.valid_categories() {
        for index in catalog.index_range(category)? {
            for variant in selectors {
                tasks.push(DownloadTask::new(TileRef::indexed(category, index), variant.clone()));
            }
        }
    }

    // Other tiles are enumerated once, not once per category.
    for identifier in catalog.other_identifiers() {
        for variant in selectors {
            tasks.push(DownloadTask::new(TileRef::other(identifier.as_str()), variant.clone()));
        }
    }

    Ok(tasks)
}
