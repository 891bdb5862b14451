//! Decoding of dataset documents into features.

use geojson::{feature::Id, GeoJson};
use hazardmap_types::cartesian::Point2d;
use hazardmap_types::geojson::declared_crs;
use hazardmap_types::Geom;

use crate::error::HazardMapError;
use crate::layer::feature_layer::{Feature, Properties};

/// Features of a document, with coordinates still in the reference of the document.
#[derive(Debug, Default)]
pub(crate) struct ParsedDataset {
    pub features: Vec<Feature>,
    /// Reference declared by the document itself.
    pub declared_crs: Option<String>,
    /// Features dropped because of invalid geometry.
    pub skipped: usize,
}

fn as_text(bytes: &[u8]) -> Result<&str, HazardMapError> {
    std::str::from_utf8(bytes)
        .map_err(|err| HazardMapError::Decoding(format!("document is not valid UTF-8: {err}")))
}

/// Reads all geometries of a KML document. KML coordinates are always WGS84 longitude and
/// latitude.
pub(crate) fn parse_kml(bytes: &[u8]) -> Result<ParsedDataset, HazardMapError> {
    let kml: kml::Kml<f64> = as_text(bytes)?
        .parse()
        .map_err(|err: kml::Error| HazardMapError::Decoding(format!("invalid KML: {err}")))?;
    let collection = geo_types::GeometryCollection::try_from(kml)
        .map_err(|err| HazardMapError::Decoding(format!("invalid KML geometry: {err}")))?;

    let mut parsed = ParsedDataset::default();
    for geometry in collection.iter() {
        match Geom::<Point2d>::try_from(geometry) {
            Ok(geometry) => parsed.features.push(Feature::new(geometry)),
            Err(err) => {
                log::debug!("Skipping KML geometry: {err}");
                parsed.skipped += 1;
            }
        }
    }

    Ok(parsed)
}

/// Reads features of a GeoJSON document: a feature collection, a single feature or a bare
/// geometry.
pub(crate) fn parse_geojson(bytes: &[u8]) -> Result<ParsedDataset, HazardMapError> {
    let geojson: GeoJson = as_text(bytes)?.parse().map_err(|err: geojson::Error| {
        HazardMapError::Decoding(format!("invalid GeoJSON: {err}"))
    })?;

    let mut parsed = ParsedDataset::default();
    match geojson {
        GeoJson::FeatureCollection(collection) => {
            parsed.declared_crs = declared_crs(&collection);
            for feature in collection.features {
                parsed.push_feature(feature);
            }
        }
        GeoJson::Feature(feature) => parsed.push_feature(feature),
        GeoJson::Geometry(geometry) => match Geom::try_from(&geometry) {
            Ok(geometry) => parsed.features.push(Feature::new(geometry)),
            Err(err) => return Err(HazardMapError::Decoding(err.to_string())),
        },
    }

    Ok(parsed)
}

impl ParsedDataset {
    fn push_feature(&mut self, feature: geojson::Feature) {
        let Some(geometry) = &feature.geometry else {
            self.skipped += 1;
            return;
        };

        match Geom::try_from(geometry) {
            Ok(geometry) => self.features.push(Feature {
                id: feature.id.map(|id| match id {
                    Id::String(id) => id,
                    Id::Number(id) => id.to_string(),
                }),
                geometry,
                properties: feature.properties.unwrap_or_else(Properties::new),
            }),
            Err(err) => {
                log::debug!("Skipping GeoJSON feature: {err}");
                self.skipped += 1;
            }
        }
    }

    pub(crate) fn vertex_count(&self) -> usize {
        self.features
            .iter()
            .map(|feature| feature.geometry.point_count())
            .sum()
    }
}
