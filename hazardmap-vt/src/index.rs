use std::collections::HashMap;

use ahash::RandomState;
use hazardmap_types::cartesian::{Point2d, Rect};
use hazardmap_types::{Geom, GeometryKind};
use serde::{Deserialize, Serialize};

use crate::clip::clip;
use crate::error::TilingError;
use crate::geometry::{NormPoint, VtGeometry, MERCATOR_HALF_SIZE};
use crate::tile::{to_tile_geometry, TileFeature, VtTile};

/// Parameters of a [`TileIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    /// Maximum zoom level tiles can be requested for.
    pub max_zoom: u32,
    /// Maximum zoom level to split tiles to while building the index.
    pub index_max_zoom: u32,
    /// Tiles with fewer points are not split while building the index.
    pub index_max_points: usize,
    /// Size of a tile in tile coordinates.
    pub extent: u32,
    /// Size of the margin around a tile, in tile coordinates.
    pub buffer: u32,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_zoom: 14,
            index_max_zoom: 5,
            index_max_points: 100_000,
            extent: 4096,
            buffer: 64,
        }
    }
}

impl IndexOptions {
    /// Checks that the index can be built with these options.
    pub fn validate(&self) -> Result<(), TilingError> {
        if self.extent == 0 {
            return Err(TilingError::Generic("tile extent must be positive".into()));
        }
        if self.max_zoom > 24 {
            return Err(TilingError::Generic(format!(
                "max zoom {} is larger than 24",
                self.max_zoom
            )));
        }
        if self.index_max_zoom > self.max_zoom {
            return Err(TilingError::Generic(format!(
                "index max zoom {} is larger than max zoom {}",
                self.index_max_zoom, self.max_zoom
            )));
        }

        Ok(())
    }

    /// Buffer around a tile of zoom level `z` in normalized coordinates. Every tile is clipped
    /// with the buffer of its own zoom level, whether it is built into the index or cut on
    /// request.
    fn pad(&self, z: u32) -> f64 {
        self.buffer as f64 / self.extent as f64 / (1u64 << z) as f64
    }
}

#[derive(Debug, Clone)]
struct IndexFeature<T> {
    kind: GeometryKind,
    geometry: VtGeometry<NormPoint>,
    properties: T,
}

#[derive(Debug, Clone)]
struct IndexTile<T> {
    features: Vec<IndexFeature<T>>,
    /// Leaf tiles were not split while building the index. Deeper tiles are cut from them on
    /// request.
    is_leaf: bool,
}

/// Tree of tiles built from a set of features in Web Mercator coordinates.
///
/// The tree is split down to [`IndexOptions::index_max_zoom`] or until a tile holds at most
/// [`IndexOptions::index_max_points`] points. Tiles deeper than that are cut from the nearest
/// leaf when requested with [`TileIndex::get_tile`].
#[derive(Debug, Clone)]
pub struct TileIndex<T> {
    options: IndexOptions,
    tiles: HashMap<(u32, u32, u32), IndexTile<T>, RandomState>,
    feature_count: usize,
}

impl<T: Clone> TileIndex<T> {
    /// Builds the index. Features without valid coordinates are skipped.
    pub fn new(
        features: impl IntoIterator<Item = (Geom<Point2d>, T)>,
        options: IndexOptions,
    ) -> Result<Self, TilingError> {
        options.validate()?;

        let mut skipped = 0;
        let features: Vec<IndexFeature<T>> = features
            .into_iter()
            .filter_map(|(geom, properties)| {
                let geometry = VtGeometry::from_mercator(&geom);
                if geometry.is_none() {
                    skipped += 1;
                }

                Some(IndexFeature {
                    kind: geom.kind(),
                    geometry: geometry?,
                    properties,
                })
            })
            .collect();

        if skipped > 0 {
            log::warn!("Skipped {skipped} features without valid coordinates while tiling");
        }

        let mut index = Self {
            options,
            tiles: HashMap::default(),
            feature_count: features.len(),
        };
        index.split(features);

        log::debug!(
            "Built tile index of {} features with {} tiles",
            index.feature_count,
            index.tiles.len()
        );

        Ok(index)
    }

    /// Parameters of the index.
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Number of features the index was built from.
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// Number of tiles created while building the index.
    pub fn indexed_tile_count(&self) -> usize {
        self.tiles.len()
    }

    fn split(&mut self, features: Vec<IndexFeature<T>>) {
        let mut stack = vec![(features, 0u32, 0u32, 0u32)];
        while let Some((features, z, x, y)) = stack.pop() {
            if features.is_empty() {
                continue;
            }

            let point_count: usize = features.iter().map(|f| f.geometry.point_count()).sum();
            let is_leaf =
                z >= self.options.index_max_zoom || point_count <= self.options.index_max_points;

            if !is_leaf {
                let size = 1.0 / (1u64 << z) as f64;
                let pad = self.options.pad(z + 1);
                let x0 = x as f64 * size;
                let y0 = y as f64 * size;
                let x_mid = x0 + size / 2.0;
                let y_mid = y0 + size / 2.0;

                let left = clip_features(&features, x0 - pad, x_mid + pad, 0);
                let right = clip_features(&features, x_mid - pad, x0 + size + pad, 0);

                for (column, part) in [(0, left), (1, right)] {
                    let top = clip_features(&part, y0 - pad, y_mid + pad, 1);
                    let bottom = clip_features(&part, y_mid - pad, y0 + size + pad, 1);
                    stack.push((top, z + 1, x * 2 + column, y * 2));
                    stack.push((bottom, z + 1, x * 2 + column, y * 2 + 1));
                }
            }

            self.tiles
                .insert((z, x, y), IndexTile { features, is_leaf });
        }
    }

    /// Returns the tile with the given coordinates, or `None` if the tile has no features.
    pub fn get_tile(&self, z: u32, x: u32, y: u32) -> Result<Option<VtTile<T>>, TilingError> {
        if z > self.options.max_zoom || (x as u64) >= (1u64 << z) || (y as u64) >= (1u64 << z) {
            return Err(TilingError::InvalidTile { z, x, y });
        }

        if let Some(tile) = self.tiles.get(&(z, x, y)) {
            return Ok(self.build_tile(&tile.features, z, x, y));
        }

        let mut parent = (z, x, y);
        let ancestor = loop {
            if parent.0 == 0 {
                return Ok(None);
            }
            parent = (parent.0 - 1, parent.1 / 2, parent.2 / 2);
            if let Some(tile) = self.tiles.get(&parent) {
                break tile;
            }
        };

        if !ancestor.is_leaf {
            return Ok(None);
        }

        let size = 1.0 / (1u64 << z) as f64;
        let pad = self.options.pad(z);
        let x0 = x as f64 * size;
        let y0 = y as f64 * size;
        let clipped = clip_features(&ancestor.features, x0 - pad, x0 + size + pad, 0);
        let clipped = clip_features(&clipped, y0 - pad, y0 + size + pad, 1);

        Ok(self.build_tile(&clipped, z, x, y))
    }

    fn build_tile(
        &self,
        features: &[IndexFeature<T>],
        z: u32,
        x: u32,
        y: u32,
    ) -> Option<VtTile<T>> {
        let extent = self.options.extent;
        let features: Vec<TileFeature<T>> = features
            .iter()
            .filter_map(|f| {
                Some(TileFeature {
                    kind: f.kind,
                    geometry: to_tile_geometry(&f.geometry, z, x, y, extent)?,
                    properties: f.properties.clone(),
                })
            })
            .collect();

        (!features.is_empty()).then_some(VtTile {
            z,
            x,
            y,
            extent,
            features,
        })
    }
}

fn clip_features<T: Clone>(
    features: &[IndexFeature<T>],
    k1: f64,
    k2: f64,
    axis: usize,
) -> Vec<IndexFeature<T>> {
    features
        .iter()
        .filter_map(|f| {
            let (min, max) = f.geometry.bounds();
            if min[axis] >= k1 && max[axis] <= k2 {
                return Some(f.clone());
            }
            if max[axis] < k1 || min[axis] > k2 {
                return None;
            }

            Some(IndexFeature {
                kind: f.kind,
                geometry: clip(&f.geometry, k1, k2, axis)?,
                properties: f.properties.clone(),
            })
        })
        .collect()
}

/// Area covered by the tile in Web Mercator meters.
pub fn tile_bbox(z: u32, x: u32, y: u32) -> Rect {
    let size = 2.0 * MERCATOR_HALF_SIZE / (1u64 << z) as f64;
    let x_min = -MERCATOR_HALF_SIZE + x as f64 * size;
    let y_max = MERCATOR_HALF_SIZE - y as f64 * size;
    Rect::new(x_min, y_max - size, x_min + size, y_max)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;
    use hazardmap_types::impls::{Contour, Polygon};

    use super::*;

    fn square(x: f64, y: f64, half: f64) -> Geom<Point2d> {
        Geom::Polygon(Polygon::from(Contour::closed(vec![
            Point2d::new(x - half, y - half),
            Point2d::new(x - half, y + half),
            Point2d::new(x + half, y + half),
            Point2d::new(x + half, y - half),
        ])))
    }

    fn brisbane() -> Point2d {
        Point2d::new(17_034_000.0, -3_185_000.0)
    }

    #[test]
    fn tile_bbox_of_root_covers_the_world() {
        let bbox = tile_bbox(0, 0, 0);
        assert_relative_eq!(bbox.x_min(), -MERCATOR_HALF_SIZE);
        assert_relative_eq!(bbox.y_max(), MERCATOR_HALF_SIZE);
        assert_relative_eq!(bbox.width(), 2.0 * MERCATOR_HALF_SIZE);

        let bbox = tile_bbox(1, 1, 1);
        assert_relative_eq!(bbox.x_min(), 0.0);
        assert_relative_eq!(bbox.y_max(), 0.0);
    }

    #[test]
    fn rejects_invalid_options() {
        let options = IndexOptions {
            extent: 0,
            ..Default::default()
        };
        assert_matches!(
            TileIndex::<()>::new(vec![], options),
            Err(TilingError::Generic(_))
        );
    }

    #[test]
    fn rejects_invalid_tiles() {
        let index = TileIndex::new(vec![(Geom::Point(brisbane()), ())], IndexOptions::default())
            .expect("valid options");
        assert_matches!(
            index.get_tile(15, 0, 0),
            Err(TilingError::InvalidTile { z: 15, .. })
        );
        assert_matches!(index.get_tile(1, 2, 0), Err(TilingError::InvalidTile { .. }));
    }

    #[test]
    fn features_keep_kind_and_properties() {
        let index = TileIndex::new(
            vec![
                (square(brisbane().x, brisbane().y, 10_000.0), "flood"),
                (Geom::Point(brisbane()), "station"),
            ],
            IndexOptions::default(),
        )
        .expect("valid options");

        let tile = index.get_tile(0, 0, 0).expect("valid tile").expect("not empty");
        assert_eq!(tile.features.len(), 2);
        assert_eq!(tile.features[0].kind, GeometryKind::Polygon);
        assert_eq!(tile.features[0].properties, "flood");
        assert_eq!(tile.features[1].kind, GeometryKind::Point);
    }

    #[test]
    fn deep_tiles_are_cut_from_leaves() {
        let options = IndexOptions {
            index_max_points: 1,
            index_max_zoom: 2,
            ..Default::default()
        };
        let center = brisbane();
        let index = TileIndex::new(vec![(square(center.x, center.y, 1_000.0), ())], options)
            .expect("valid options");
        assert!(index.indexed_tile_count() > 1);

        let z = 12;
        let size = 2.0 * MERCATOR_HALF_SIZE / (1u64 << z) as f64;
        let x = ((center.x + MERCATOR_HALF_SIZE) / size) as u32;
        let y = ((MERCATOR_HALF_SIZE - center.y) / size) as u32;

        let tile = index.get_tile(z, x, y).expect("valid tile").expect("not empty");
        let geom = tile.features[0].to_geometry(&tile_bbox(z, x, y), tile.extent);
        let bbox = geom.bounding_rect().expect("not empty");
        let tile_area = tile_bbox(z, x, y).expand(size * 64.0 / 4096.0 + 1.0);
        assert!(tile_area.contains(&Point2d::new(bbox.x_min(), bbox.y_min())));
        assert!(tile_area.contains(&Point2d::new(bbox.x_max(), bbox.y_max())));

        let far = index.get_tile(z, 0, 0).expect("valid tile");
        assert!(far.is_none());
    }

    #[test]
    fn indexed_and_requested_tiles_have_same_buffer() {
        let y = -0.3 * MERCATOR_HALF_SIZE;
        let line = || {
            Geom::Contour(Contour::open(vec![
                Point2d::new(-0.99 * MERCATOR_HALF_SIZE, y),
                Point2d::new(0.99 * MERCATOR_HALF_SIZE, y),
            ]))
        };
        let indexed = TileIndex::new(
            vec![(line(), ())],
            IndexOptions {
                index_max_zoom: 2,
                index_max_points: 0,
                ..Default::default()
            },
        )
        .expect("valid options");
        let requested = TileIndex::new(
            vec![(line(), ())],
            IndexOptions {
                index_max_zoom: 0,
                ..Default::default()
            },
        )
        .expect("valid options");
        assert!(indexed.indexed_tile_count() > requested.indexed_tile_count());

        let x_range = |index: &TileIndex<()>| {
            let tile = index.get_tile(2, 1, 2).expect("valid tile").expect("not empty");
            let VtGeometry::Lines(lines) = &tile.features[0].geometry else {
                panic!("line expected, got {:?}", tile.features[0].geometry);
            };
            let xs: Vec<i32> = lines.iter().flatten().map(|p| p[0]).collect();
            (
                xs.iter().copied().min().expect("not empty"),
                xs.iter().copied().max().expect("not empty"),
            )
        };

        let buffer = IndexOptions::default().buffer as i32;
        let extent = IndexOptions::default().extent as i32;
        assert_eq!(x_range(&indexed), (-buffer, extent + buffer));
        assert_eq!(x_range(&requested), x_range(&indexed));
    }

    #[test]
    fn whole_feature_survives_tiling() {
        let center = brisbane();
        let index = TileIndex::new(
            vec![(square(center.x, center.y, 50_000.0), ())],
            IndexOptions::default(),
        )
        .expect("valid options");

        let tile = index.get_tile(0, 0, 0).expect("valid tile").expect("not empty");
        let geom = tile.features[0].to_geometry(&tile_bbox(0, 0, 0), tile.extent);
        let bbox = geom.bounding_rect().expect("not empty");
        let cell = 2.0 * MERCATOR_HALF_SIZE / 4096.0;
        assert_relative_eq!(bbox.center().x, center.x, epsilon = cell);
        assert_relative_eq!(bbox.center().y, center.y, epsilon = cell);
    }
}
