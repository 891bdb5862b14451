//! Layer for feature sets too large to be drawn at once.

use std::any::Any;
use std::sync::Arc;

use hazardmap_types::GeometryKind;
use hazardmap_vt::{tile_bbox, IndexOptions, TileIndex as VtIndex};
use quick_cache::sync::Cache;

use crate::error::HazardMapError;
use crate::layer::attribution::Attribution;
use crate::layer::feature_layer::styler::FeatureStyler;
use crate::layer::feature_layer::{Feature, Properties};
use crate::layer::Layer;
use crate::render::Canvas;
use crate::style::{StyleRegistry, StyleSelector};
use crate::tile_schema::{TileIndex, TileSchema};
use crate::view::MapView;

const TILE_CACHE_SIZE: usize = 512;

/// Layer that cuts its features into tiles and draws only the tiles covering the view.
///
/// The tiling index is built once, when the layer is created. Tiles are cut from the index the
/// first time they are drawn, converted back into the working reference of the map and cached.
pub struct TiledFeatureLayer {
    name: String,
    index: VtIndex<Arc<Properties>>,
    tile_schema: TileSchema,
    tiles: Cache<TileIndex, Arc<Vec<(GeometryKind, Feature)>>>,
    styler: FeatureStyler,
    attribution: Option<Attribution>,
}

impl std::fmt::Debug for TiledFeatureLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiledFeatureLayer")
            .field("name", &self.name)
            .field("feature_count", &self.index.feature_count())
            .field("styler", &self.styler)
            .finish()
    }
}

impl TiledFeatureLayer {
    /// Builds the tiling index of the features. Features must be in Web Mercator.
    pub fn new(
        name: impl Into<String>,
        features: Vec<Feature>,
        options: IndexOptions,
        styles: Arc<StyleRegistry>,
        selector: StyleSelector,
    ) -> Result<Self, HazardMapError> {
        let tile_schema = TileSchema::web(options.max_zoom + 1);
        let index = VtIndex::new(
            features
                .into_iter()
                .map(|feature| (feature.geometry, Arc::new(feature.properties))),
            options,
        )?;

        Ok(Self {
            name: name.into(),
            index,
            tile_schema,
            tiles: Cache::new(TILE_CACHE_SIZE),
            styler: FeatureStyler::new(styles, selector),
            attribution: None,
        })
    }

    /// Sets the attribution of the data source.
    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = Some(attribution);
        self
    }

    /// Number of features in the layer.
    pub fn feature_count(&self) -> usize {
        self.index.feature_count()
    }

    /// Style set the layer uses.
    pub fn selector(&self) -> &StyleSelector {
        self.styler.selector()
    }

    /// Features of the tile, in the working reference of the map and clipped to the tile area
    /// (with a small buffer), each with the geometry kind of its source feature.
    ///
    /// Clipping can split a line string into several lines, so the geometry of a tile feature
    /// can be of a different kind than its source.
    pub fn tile_features(
        &self,
        index: TileIndex,
    ) -> Result<Arc<Vec<(GeometryKind, Feature)>>, HazardMapError> {
        self.tiles.get_or_insert_with(&index, || {
            let features = match self.index.get_tile(index.z, index.x, index.y)? {
                Some(tile) => {
                    let bbox = tile_bbox(tile.z, tile.x, tile.y);
                    tile.features
                        .iter()
                        .map(|feature| {
                            let part = Feature {
                                id: None,
                                geometry: feature.to_geometry(&bbox, tile.extent),
                                properties: feature.properties.as_ref().clone(),
                            };
                            (feature.kind, part)
                        })
                        .collect()
                }
                None => vec![],
            };

            Ok(Arc::new(features))
        })
    }

    fn tiles_to_draw(&self, view: &MapView) -> Vec<TileIndex> {
        let Some(bbox) = view.get_bbox() else {
            return vec![];
        };
        let Some(z) = self.tile_schema.select_z(view.resolution()) else {
            return vec![];
        };

        self.tile_schema
            .iter_tiles_over_bbox(z, bbox)
            .map(|tiles| tiles.collect())
            .unwrap_or_default()
    }
}

impl Layer for TiledFeatureLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, view: &MapView, canvas: &mut dyn Canvas) {
        for index in self.tiles_to_draw(view) {
            match self.tile_features(index) {
                Ok(features) => {
                    for (kind, feature) in features.iter() {
                        self.styler.draw_as(&self.name, *kind, &feature.geometry, canvas);
                    }
                }
                Err(err) => log::warn!(
                    "Failed to cut tile {index:?} of layer '{}': {err}",
                    self.name
                ),
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn attribution(&self) -> Option<Attribution> {
        self.attribution.clone()
    }
}
