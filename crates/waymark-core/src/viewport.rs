// SPDX-License-Identifier: MIT

use crate::dataset::Place;

pub const WORLD_ZOOM: f64 = 2.0;
pub const PLACE_ZOOM: f64 = 16.0;

/// Initial map framing: center (lat, lon) and zoom level.
///
/// Only a hint for first render after a selection change; once the user
/// pans or zooms, the map owns its own camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: (f64, f64),
    pub zoom: f64,
}

impl Viewport {
    pub fn world() -> Self {
        Self {
            center: (0.0, 0.0),
            zoom: WORLD_ZOOM,
        }
    }

    pub fn for_place(place: &Place) -> Self {
        Self {
            center: place.lat_lon(),
            zoom: PLACE_ZOOM,
        }
    }

    pub fn for_selection(selection: Option<&Place>) -> Self {
        match selection {
            Some(place) => Self::for_place(place),
            None => Self::world(),
        }
    }
}
