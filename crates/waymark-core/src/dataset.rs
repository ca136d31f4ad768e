// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A single point of interest, as emitted by the offline data pipeline.
///
/// `coordinates` is stored `[longitude, latitude]`. Rendering wants
/// (lat, lon); always go through [`Place::lat_lon`] for that swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub category: String,
    pub coordinates: [f64; 2],
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub img: Vec<String>,
}

impl Place {
    pub fn lat_lon(&self) -> (f64, f64) {
        (self.coordinates[1], self.coordinates[0])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    places: HashMap<String, Place>,
    #[serde(default)]
    categories: HashMap<String, Category>,
}

impl Dataset {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let dataset = Self::from_json(&content)?;
        log::info!(
            "Loaded {} places in {} categories from {:?}",
            dataset.places.len(),
            dataset.categories.len(),
            path.as_ref()
        );
        Ok(dataset)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Looks up a place by id. Empty or unknown ids resolve to `None`,
    /// never an error.
    pub fn place(&self, id: &str) -> Option<&Place> {
        if id.is_empty() {
            return None;
        }
        self.places.get(id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.get(id)
    }

    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.places.values()
    }

    pub fn category_ids(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Categories sorted by display name, for stable list rendering.
    pub fn categories_sorted(&self) -> Vec<(&str, &Category)> {
        let mut list: Vec<(&str, &Category)> = self
            .categories
            .iter()
            .map(|(id, cat)| (id.as_str(), cat))
            .collect();
        list.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        list
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "places": {
            "old-mill": {
                "id": "old-mill",
                "name": "Old Mill",
                "category": "museum",
                "coordinates": [10.0, 20.0],
                "description": "A mill. See https://example.org/mill for hours."
            },
            "north-beach": {
                "id": "north-beach",
                "name": "North Beach",
                "category": "beach",
                "coordinates": [10.5, 20.5],
                "img": ["https://example.org/a.jpg", "https://example.org/b.jpg"]
            }
        },
        "categories": {
            "museum": {"name": "Museums", "count": 1},
            "beach": {"name": "Beaches", "count": 1}
        }
    }"#;

    #[test]
    fn test_parse_pipeline_shape() {
        let ds = Dataset::from_json(SAMPLE).unwrap();
        assert_eq!(ds.len(), 2);

        let mill = ds.place("old-mill").unwrap();
        assert_eq!(mill.name, "Old Mill");
        assert_eq!(mill.category, "museum");
        assert!(mill.img.is_empty());

        let beach = ds.place("north-beach").unwrap();
        assert_eq!(beach.img.len(), 2);
        assert!(beach.description.is_none());

        assert_eq!(ds.category("museum").unwrap().count, 1);
    }

    #[test]
    fn test_lat_lon_swaps_axes() {
        let ds = Dataset::from_json(SAMPLE).unwrap();
        // Stored [lon, lat] = [10, 20]; rendered (lat, lon) = (20, 10).
        assert_eq!(ds.place("old-mill").unwrap().lat_lon(), (20.0, 10.0));
    }

    #[test]
    fn test_lookup_degrades_to_none() {
        let ds = Dataset::from_json(SAMPLE).unwrap();
        assert!(ds.place("").is_none());
        assert!(ds.place("no-such-place").is_none());
        assert!(ds.category("no-such-category").is_none());
    }

    #[test]
    fn test_categories_sorted_by_name() {
        let ds = Dataset::from_json(SAMPLE).unwrap();
        let names: Vec<&str> = ds
            .categories_sorted()
            .iter()
            .map(|(_, c)| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Beaches", "Museums"]);
    }

    #[test]
    fn test_missing_maps_default_empty() {
        let ds = Dataset::from_json("{}").unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.categories_sorted().len(), 0);
    }
}
