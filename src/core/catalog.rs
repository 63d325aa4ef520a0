//! Static catalog of downloadable tiles
//!
//! The catalog is fixed: four suited/honor categories addressed by index,
//! plus a short list of "other" tiles addressed by name.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::Serialize;

use crate::core::error::{Error, Result};

/// Tile category on the wiki
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Characters (万)
    M,
    /// Dots (筒)
    P,
    /// Bamboo (索)
    S,
    /// Honors (字)
    Z,
    /// Named tiles outside the indexed suits
    Other,
}

impl Category {
    /// Code used in page URLs, file names and directory names
    pub fn code(&self) -> &'static str {
        match self {
            Category::M => "m",
            Category::P => "p",
            Category::S => "s",
            Category::Z => "z",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "m" => Ok(Category::M),
            "p" => Ok(Category::P),
            "s" => Ok(Category::S),
            "z" => Ok(Category::Z),
            "other" => Ok(Category::Other),
            unknown => Err(Error::InvalidCategory(unknown.to_string())),
        }
    }
}

/// The full set of tiles to harvest
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    ranges: Vec<(Category, RangeInclusive<u32>)>,
    others: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            ranges: vec![
                (Category::M, 0..=9),
                (Category::P, 0..=9),
                (Category::S, 0..=9),
                (Category::Z, 1..=7),
            ],
            others: vec!["B".to_string()],
        }
    }
}

impl Catalog {
    /// Build a catalog, rejecting empty ranges, a ranged `Other`, duplicate
    /// categories or identifiers, and an empty list of other tiles.
    pub fn new(ranges: Vec<(Category, RangeInclusive<u32>)>, others: Vec<String>) -> Result<Self> {
        for (i, (category, range)) in ranges.iter().enumerate() {
            if *category == Category::Other {
                return Err(Error::InvalidInput(
                    "the 'other' category is addressed by name, not by index".to_string(),
                ));
            }
            if range.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "index range for category '{category}' is empty"
                )));
            }
            if ranges[..i].iter().any(|(seen, _)| seen == category) {
                return Err(Error::InvalidInput(format!(
                    "category '{category}' is listed twice"
                )));
            }
        }

        if others.is_empty() {
            return Err(Error::InvalidInput("list of other tiles is empty".to_string()));
        }
        if let Some(blank) = others.iter().find(|s| s.trim().is_empty() || s.contains('/')) {
            return Err(Error::InvalidInput(format!("invalid other tile identifier '{blank}'")));
        }
        for (i, identifier) in others.iter().enumerate() {
            if others[..i].contains(identifier) {
                return Err(Error::InvalidInput(format!(
                    "other tile '{identifier}' is listed twice"
                )));
            }
        }

        Ok(Self { ranges, others })
    }

    /// Categories addressed by index, in catalog order
    pub fn valid_categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.ranges.iter().map(|(category, _)| *category)
    }

    /// Inclusive index range of a category
    pub fn index_range(&self, category: Category) -> Result<RangeInclusive<u32>> {
        self.ranges
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, range)| range.clone())
            .ok_or_else(|| Error::InvalidCategory(category.to_string()))
    }

    /// Identifiers of the tiles in the `Other` category, in order
    pub fn other_identifiers(&self) -> &[String] {
        &self.others
    }

    /// Check that `index` is a valid tile of `category`
    pub fn contains(&self, category: Category, index: u32) -> Result<()> {
        let range = self.index_range(category)?;
        if !range.contains(&index) {
            return Err(Error::InvalidIndex {
                category: category.to_string(),
                index,
            });
        }
        Ok(())
    }
}
