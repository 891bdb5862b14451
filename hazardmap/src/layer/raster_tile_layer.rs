//! Base map layer drawn from prerendered raster tiles.

use std::any::Any;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::HazardMapError;
use crate::layer::attribution::Attribution;
use crate::layer::Layer;
use crate::render::Canvas;
use crate::tile_schema::{TileIndex, TileSchema};
use crate::view::MapView;

static SUBDOMAINS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z])-([a-z])\}").expect("valid regex"));

/// Raster tile layers draw prerendered tile sets of an Internet source, like OpenStreetMap.
///
/// The layer does not load images itself: for every tile of the view it passes the tile URL to
/// the [`Canvas`], which is responsible for fetching and caching the image.
#[derive(Debug, Clone)]
pub struct RasterTileLayer {
    name: String,
    url_template: String,
    subdomains: Vec<char>,
    tile_schema: TileSchema,
    attribution: Option<Attribution>,
}

impl RasterTileLayer {
    /// Creates a new layer.
    ///
    /// The URL template must contain `{z}`, `{x}` and `{y}` placeholders. It can also contain a
    /// subdomain range like `{a-c}`, subdomains are then rotated between tiles.
    pub fn new(
        name: impl Into<String>,
        url_template: &str,
        tile_schema: TileSchema,
    ) -> Result<Self, HazardMapError> {
        let mut subdomains = vec![];
        let url_template = match SUBDOMAINS.captures(url_template) {
            Some(captures) => {
                let from = captures[1].chars().next().unwrap_or('a');
                let to = captures[2].chars().next().unwrap_or('a');
                subdomains = (from..=to).collect();
                SUBDOMAINS.replace(url_template, "{s}").into_owned()
            }
            None => url_template.to_string(),
        };

        let layer = Self {
            name: name.into(),
            url_template,
            subdomains,
            tile_schema,
            attribution: None,
        };

        for placeholder in ["{z}", "{x}", "{y}"] {
            if !layer.url_template.contains(placeholder) {
                return Err(HazardMapError::Config(format!(
                    "tile url template '{url_template}' has no {placeholder} placeholder",
                    url_template = layer.url_template
                )));
            }
        }
        layer.tile_url(TileIndex::new(0, 0, 0))?;

        Ok(layer)
    }

    /// OpenStreetMap base layer with the given tile URL template.
    pub fn openstreetmap(url_template: &str) -> Result<Self, HazardMapError> {
        Ok(Self::new("base", url_template, TileSchema::web(19))?
            .with_attribution(Attribution::openstreetmap()))
    }

    /// Sets the attribution of the tile source.
    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = Some(attribution);
        self
    }

    /// Tile schema of the layer.
    pub fn tile_schema(&self) -> &TileSchema {
        &self.tile_schema
    }

    /// URL of the tile image.
    pub fn tile_url(&self, index: TileIndex) -> Result<String, HazardMapError> {
        let mut vars = HashMap::from([
            ("z".to_string(), index.z.to_string()),
            ("x".to_string(), index.x.to_string()),
            ("y".to_string(), index.y.to_string()),
        ]);
        if !self.subdomains.is_empty() {
            let subdomain = self.subdomains[(index.x + index.y) as usize % self.subdomains.len()];
            vars.insert("s".to_string(), subdomain.to_string());
        }

        strfmt::strfmt(&self.url_template, &vars)
            .map_err(|err| HazardMapError::Config(format!("invalid tile url template: {err}")))
    }
}

impl Layer for RasterTileLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, view: &MapView, canvas: &mut dyn Canvas) {
        let Some(tiles) = self.tile_schema.iter_tiles(view) else {
            return;
        };

        for index in tiles {
            let Some(bbox) = self.tile_schema.tile_bbox(index) else {
                continue;
            };

            match self.tile_url(index) {
                Ok(url) => canvas.draw_raster_tile(index, bbox, &url),
                Err(err) => log::debug!("Tile {index:?} is skipped: {err}"),
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

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hazardmap_types::cartesian::{Point2d, Size};

    use super::*;
    use crate::tests::RecordingCanvas;

    const OSM: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

    #[test]
    fn tile_urls() {
        let layer = RasterTileLayer::openstreetmap(OSM).expect("valid template");
        assert_eq!(
            layer.tile_url(TileIndex::new(3, 5, 4)).expect("url"),
            "https://tile.openstreetmap.org/4/3/5.png"
        );
        assert_eq!(layer.name(), "base");
        assert_eq!(
            layer.attribution().map(|a| a.get_text().to_string()),
            Some("© OpenStreetMap contributors".to_string())
        );
    }

    #[test]
    fn subdomains_rotate() {
        let layer = RasterTileLayer::new(
            "base",
            "https://{a-c}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            TileSchema::web(19),
        )
        .expect("valid template");

        assert_eq!(
            layer.tile_url(TileIndex::new(0, 0, 1)).expect("url"),
            "https://a.tile.openstreetmap.org/1/0/0.png"
        );
        assert_eq!(
            layer.tile_url(TileIndex::new(1, 1, 1)).expect("url"),
            "https://c.tile.openstreetmap.org/1/1/1.png"
        );
    }

    #[test]
    fn invalid_templates() {
        assert_matches!(
            RasterTileLayer::new("base", "https://tiles/{z}/{x}.png", TileSchema::web(19)),
            Err(HazardMapError::Config(_))
        );
        assert_matches!(
            RasterTileLayer::new("base", "https://tiles/{z}/{x}/{y}/{key}.png", TileSchema::web(19)),
            Err(HazardMapError::Config(_))
        );
    }

    #[test]
    fn renders_tiles_of_view() {
        let layer = RasterTileLayer::openstreetmap(OSM).expect("valid template");
        let view = MapView::from_zoom(Point2d::new(0.0, 0.0), 1.0).with_size(Size::new(512.0, 512.0));

        let mut canvas = RecordingCanvas::new(Size::new(512.0, 512.0));
        layer.render(&view, &mut canvas);

        assert_eq!(canvas.tiles.len(), 4);
        assert!(canvas
            .tiles
            .iter()
            .all(|(index, _, url)| index.z == 1 && url.starts_with("https://tile.openstreetmap.org/1/")));
    }
}
