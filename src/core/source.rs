//! Source resolution logic for tiles-dl
//!
//! Maps a tile to the wiki page describing it and to the place its image
//! lands on disk. Nothing in here touches the network.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use serde::Serialize;

use crate::core::catalog::{Catalog, Category};
use crate::core::error::{Error, Result};

/// A single tile on the wiki
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TileRef {
    /// Suited or honor tile addressed by index
    Indexed { category: Category, index: u32 },
    /// Named tile from the `other` list
    Other { identifier: String },
}

impl TileRef {
    pub fn indexed(category: Category, index: u32) -> Self {
        TileRef::Indexed { category, index }
    }

    pub fn other(identifier: impl Into<String>) -> Self {
        TileRef::Other {
            identifier: identifier.into(),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            TileRef::Indexed { category, .. } => *category,
            TileRef::Other { .. } => Category::Other,
        }
    }
}

impl std::fmt::Display for TileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TileRef::Indexed { category, index } => write!(f, "{index}{category}"),
            TileRef::Other { identifier } => write!(f, "other/{identifier}"),
        }
    }
}

/// Configuration for the wiki and the on-disk naming scheme
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Prefix of every `File:` page URL
    pub page_base_url: String,

    /// Scheme and host prepended to extracted image paths
    pub domain: String,

    /// Extension of both the wiki file name and the saved file
    pub extension: String,

    /// Prefix of saved history thumbnails
    pub thumb_prefix: String,

    /// Subdirectory holding the `other` tiles
    pub other_dir: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            page_base_url: "http://wiki.lingshangkaihua.com/mediawiki/index.php/File:".to_string(),
            domain: "http://wiki.lingshangkaihua.com".to_string(),
            extension: ".png".to_string(),
            thumb_prefix: "thumb_".to_string(),
            other_dir: "other".to_string(),
        }
    }
}

impl SourceConfig {
    /// Point every URL at another site root, keeping the MediaWiki layout
    pub fn for_site(domain: &str) -> Self {
        let domain = domain.trim_end_matches('/');
        Self {
            page_base_url: format!("{domain}/mediawiki/index.php/File:"),
            domain: domain.to_string(),
            ..Default::default()
        }
    }

    /// Page URL of an indexed tile
    pub fn source_page_url(&self, catalog: &Catalog, category: Category, index: u32) -> Result<String> {
        catalog.contains(category, index)?;
        Ok(format!(
            "{}{}{}{}",
            self.page_base_url, index, category, self.extension
        ))
    }

    /// Page URL of an `other` tile
    pub fn other_source_page_url(&self, identifier: &str) -> String {
        format!("{}{}{}", self.page_base_url, identifier, self.extension)
    }

    /// Saved file name of an indexed tile
    pub fn destination_file_name(
        &self,
        catalog: &Catalog,
        category: Category,
        index: u32,
        thumbnail: bool,
    ) -> Result<String> {
        catalog.contains(category, index)?;
        Ok(format!(
            "{}{}{}{}",
            self.prefix(thumbnail),
            index,
            category,
            self.extension
        ))
    }

    /// Saved file name of an `other` tile
    pub fn other_destination_file_name(&self, identifier: &str, thumbnail: bool) -> String {
        format!("{}{}{}", self.prefix(thumbnail), identifier, self.extension)
    }

    /// Page URL of any tile
    pub fn page_url(&self, catalog: &Catalog, tile: &TileRef) -> Result<String> {
        match tile {
            TileRef::Indexed { category, index } => self.source_page_url(catalog, *category, *index),
            TileRef::Other { identifier } => Ok(self.other_source_page_url(identifier)),
        }
    }

    /// Saved file name of any tile
    pub fn file_name(&self, catalog: &Catalog, tile: &TileRef, thumbnail: bool) -> Result<String> {
        match tile {
            TileRef::Indexed { category, index } => {
                self.destination_file_name(catalog, *category, *index, thumbnail)
            }
            TileRef::Other { identifier } => Ok(self.other_destination_file_name(identifier, thumbnail)),
        }
    }

    /// Directory a tile is saved into, below `base`
    pub fn destination_dir(&self, base: &Path, tile: &TileRef) -> PathBuf {
        let subdir = match tile {
            TileRef::Indexed { category, .. } => category.code(),
            TileRef::Other { .. } => self.other_dir.as_str(),
        };
        normalize_separators(&base.join(subdir))
    }

    /// Absolute URL of an image path extracted from a page
    pub fn image_url(&self, image_path: &str) -> String {
        if image_path.starts_with("http://") || image_path.starts_with("https://") {
            return image_path.to_string();
        }
        if let Some(rest) = image_path.strip_prefix("//") {
            let scheme = self.domain.split("://").next().unwrap_or("http");
            return format!("{scheme}://{rest}");
        }
        format!("{}{}", self.domain, image_path)
    }

    fn prefix(&self, thumbnail: bool) -> &str {
        if thumbnail {
            &self.thumb_prefix
        } else {
            ""
        }
    }
}

/// Resolve a directory against the current working directory, with `/`
/// separators
pub fn resolve_base_directory(relative: impl AsRef<Path>) -> Result<PathBuf> {
    let relative = relative.as_ref();
    let joined = if relative.is_absolute() {
        relative.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(Error::PathResolution)?
            .join(relative)
    };
    Ok(normalize_separators(&joined))
}

fn normalize_separators(path: &Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().replace(MAIN_SEPARATOR, "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_page_url() {
        let config = SourceConfig::default();
        let url = config.source_page_url(&Catalog::default(), Category::M, 5).unwrap();
        assert_eq!(
            url,
            "http://wiki.lingshangkaihua.com/mediawiki/index.php/File:5m.png"
        );
    }

    #[test]
    fn test_other_source_page_url() {
        let config = SourceConfig::default();
        assert_eq!(
            config.other_source_page_url("B"),
            "http://wiki.lingshangkaihua.com/mediawiki/index.php/File:B.png"
        );
    }

    #[test]
    fn test_source_page_url_is_idempotent() {
        let config = SourceConfig::default();
        let catalog = Catalog::default();
        for category in catalog.valid_categories() {
            for index in catalog.index_range(category).unwrap() {
                let first = config.source_page_url(&catalog, category, index).unwrap();
                let second = config.source_page_url(&catalog, category, index).unwrap();
                assert_eq!(first, second);
                let first = config.destination_file_name(&catalog, category, index, true).unwrap();
                let second = config.destination_file_name(&catalog, category, index, true).unwrap();
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn test_thumbnail_file_name() {
        let config = SourceConfig::default();
        let name = config
            .destination_file_name(&Catalog::default(), Category::P, 3, true)
            .unwrap();
        assert_eq!(name, "thumb_3p.png");

        let name = config
            .destination_file_name(&Catalog::default(), Category::P, 3, false)
            .unwrap();
        assert_eq!(name, "3p.png");
    }

    #[test]
    fn test_other_file_name() {
        let config = SourceConfig::default();
        assert_eq!(config.other_destination_file_name("B", false), "B.png");
        assert_eq!(config.other_destination_file_name("B", true), "thumb_B.png");
    }

    #[test]
    fn test_invalid_input_yields_documented_errors() {
        let config = SourceConfig::default();
        let catalog = Catalog::default();

        assert!(matches!(
            config.source_page_url(&catalog, Category::Z, 8),
            Err(Error::InvalidIndex { index: 8, .. })
        ));
        assert!(matches!(
            config.source_page_url(&catalog, Category::Other, 0),
            Err(Error::InvalidCategory(_))
        ));
        assert!(matches!(
            config.destination_file_name(&catalog, Category::Z, 0, false),
            Err(Error::InvalidIndex { index: 0, .. })
        ));
        assert!(matches!(
            config.destination_file_name(&catalog, Category::Other, 1, true),
            Err(Error::InvalidCategory(_))
        ));
    }

    #[test]
    fn test_destination_dir() {
        let config = SourceConfig::default();
        let base = Path::new("/data/images");
        assert_eq!(
            config.destination_dir(base, &TileRef::indexed(Category::S, 1)),
            PathBuf::from("/data/images/s")
        );
        assert_eq!(
            config.destination_dir(base, &TileRef::other("B")),
            PathBuf::from("/data/images/other")
        );
    }

    #[test]
    fn test_image_url() {
        let config = SourceConfig::default();
        assert_eq!(
            config.image_url("/mediawiki/images/a/ab/1m.png"),
            "http://wiki.lingshangkaihua.com/mediawiki/images/a/ab/1m.png"
        );
        assert_eq!(
            config.image_url("https://cdn.example.org/1m.png"),
            "https://cdn.example.org/1m.png"
        );
        assert_eq!(
            config.image_url("//cdn.example.org/1m.png"),
            "http://cdn.example.org/1m.png"
        );
    }

    #[test]
    fn test_for_site() {
        let config = SourceConfig::for_site("http://127.0.0.1:8080/");
        assert_eq!(config.domain, "http://127.0.0.1:8080");
        assert_eq!(
            config.other_source_page_url("B"),
            "http://127.0.0.1:8080/mediawiki/index.php/File:B.png"
        );
    }

    #[test]
    fn test_resolve_base_directory() {
        let resolved = resolve_base_directory("images").unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.to_string_lossy().ends_with("/images"));
        assert!(!resolved.to_string_lossy().contains('\\'));
    }

    #[test]
    fn test_tile_display() {
        assert_eq!(TileRef::indexed(Category::Z, 7).to_string(), "7z");
        assert_eq!(TileRef::other("B").to_string(), "other/B");
    }
}
