use foundation::bounds::Aabb2;
use foundation::math::{Vec2, rings_area};
use formats::BoundaryFeature;
use tracing::{debug, warn};

use crate::value::ValueTable;

/// One drawable administrative area.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Display name; hover identity and value-table key.
    pub id: String,
    /// Occupancy percentage. 0 means no data.
    pub value: u32,
    /// Outer rings as `(lng, lat)`; closed implicitly.
    pub polygons: Vec<Vec<Vec2>>,
    /// Combined shoelace area, used for hit-test ordering only.
    pub area: f64,
    /// Animated extrusion height in pixels.
    pub current_height: f64,
}

impl Region {
    pub fn new(id: impl Into<String>, value: u32, polygons: Vec<Vec<Vec2>>) -> Self {
        let area = rings_area(&polygons);
        Self {
            id: id.into(),
            value,
            polygons,
            area,
            current_height: 0.0,
        }
    }
}

/// The currently loaded region set and its extent.
///
/// A model is always built wholesale from one feature set; there is no way to
/// append to it, so its extent never mixes data from two loads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapModel {
    regions: Vec<Region>,
    extent: Aabb2,
}

impl MapModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every region and reset the extent accumulator.
    pub fn clear(&mut self) {
        self.regions.clear();
        self.extent = Aabb2::empty();
    }

    pub fn from_features(features: &[BoundaryFeature], table: &ValueTable) -> Self {
        let mut extent = Aabb2::empty();
        let mut regions = Vec::with_capacity(features.len());

        for feature in features {
            let rings = feature.geometry.outer_rings();
            for ring in &rings {
                for p in ring {
                    extent.include(*p);
                }
            }

            let name = match feature.display_name() {
                Some(name) => name,
                None => {
                    warn!(id = ?feature.id, "boundary feature has no display name");
                    ""
                }
            };
            let value = table.resolve(name);
            if value == 0 && !name.is_empty() {
                debug!(name, "no occupancy value");
            }
            regions.push(Region::new(name, value, rings));
        }

        Self { regions, extent }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn regions_mut(&mut self) -> &mut [Region] {
        &mut self.regions
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Extent of every loaded vertex; `None` until something with geometry is loaded.
    pub fn extent(&self) -> Option<Aabb2> {
        self.extent.is_valid().then_some(self.extent)
    }
}
