// SPDX-License-Identifier: MIT

use crate::dataset::{Dataset, Place};
use std::collections::HashSet;

/// The set of category ids currently shown on the map.
///
/// Plain in-memory state: filters are deliberately not part of the
/// shareable fragment, so toggles survive entering and leaving a place
/// detail view but not an app restart.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    active: HashSet<String>,
}

impl CategoryFilter {
    /// All known categories enabled, the startup state.
    pub fn all(dataset: &Dataset) -> Self {
        Self {
            active: dataset.category_ids().map(str::to_string).collect(),
        }
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains(id)
    }

    /// Set semantics: removes the id if present, inserts it otherwise.
    pub fn toggle(&mut self, id: &str) {
        if !self.active.remove(id) {
            self.active.insert(id.to_string());
        }
    }

    /// Places whose category is active, sorted by name for stable
    /// presentation.
    pub fn filtered<'a>(&self, dataset: &'a Dataset) -> Vec<&'a Place> {
        let mut places: Vec<&Place> = dataset
            .places()
            .filter(|p| self.active.contains(&p.category))
            .collect();
        places.sort_by(|a, b| a.name.cmp(&b.name));
        places
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    fn dataset() -> Dataset {
        Dataset::from_json(
            r#"{
                "places": {
                    "m1": {"id": "m1", "name": "Mill", "category": "museum", "coordinates": [1.0, 2.0]},
                    "m2": {"id": "m2", "name": "Fort", "category": "museum", "coordinates": [3.0, 4.0]},
                    "b1": {"id": "b1", "name": "Cove", "category": "beach", "coordinates": [5.0, 6.0]}
                },
                "categories": {
                    "museum": {"name": "Museums", "count": 2},
                    "beach": {"name": "Beaches", "count": 1}
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_all_categories_active_at_start() {
        let ds = dataset();
        let filter = CategoryFilter::all(&ds);
        assert!(filter.is_active("museum"));
        assert!(filter.is_active("beach"));
        assert_eq!(filter.filtered(&ds).len(), 3);
    }

    #[test]
    fn test_toggle_removes_and_restores() {
        let ds = dataset();
        let mut filter = CategoryFilter::all(&ds);

        filter.toggle("museum");
        let shown = filter.filtered(&ds);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id, "b1");

        filter.toggle("museum");
        assert_eq!(filter.filtered(&ds).len(), 3);
    }

    #[test]
    fn test_toggle_order_independent() {
        let ds = dataset();
        let mut a = CategoryFilter::all(&ds);
        let mut b = CategoryFilter::all(&ds);

        a.toggle("museum");
        a.toggle("beach");
        a.toggle("museum");

        b.toggle("beach");

        assert_eq!(
            a.filtered(&ds)
                .iter()
                .map(|p| p.id.as_str())
                .collect::<Vec<_>>(),
            b.filtered(&ds)
                .iter()
                .map(|p| p.id.as_str())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_unknown_id_is_tolerated() {
        let ds = dataset();
        let mut filter = CategoryFilter::all(&ds);
        filter.toggle("no-such-category");
        assert_eq!(filter.filtered(&ds).len(), 3);
        filter.toggle("no-such-category");
        assert_eq!(filter.filtered(&ds).len(), 3);
    }

    #[test]
    fn test_filtered_sorted_by_name() {
        let ds = dataset();
        let filter = CategoryFilter::all(&ds);
        let names: Vec<&str> = filter.filtered(&ds).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Cove", "Fort", "Mill"]);
    }
}
