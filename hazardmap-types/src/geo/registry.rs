use std::collections::HashMap;

use crate::cartesian::Point2d;
use crate::geo::crs::normalize_crs_name;
use crate::geo::projection::BoxedProjection;
use crate::geo::{Crs, Datum, ProjectionType};
use crate::impls::Circle;
use crate::{Geom, TypesError};

/// Definition keyword for geographic (longitude, latitude) references.
const GEOGRAPHIC_DEFINITION: &str = "longlat";
/// Definition keyword for spherical mercator references.
const WEB_MERCATOR_DEFINITION: &str = "webmerc";

/// Named coordinate reference systems known to the viewer.
///
/// Names are compared after [`normalize_crs_name`], so `EPSG:3857`,
/// `urn:ogc:def:crs:EPSG::3857` and `http://www.opengis.net/def/crs/EPSG/0/3857` refer to the
/// same entry.
///
/// Built-in entries:
/// * `EPSG:3857` (aliases `EPSG:900913`, `EPSG:102100`, `EPSG:102113`);
/// * `EPSG:4326` (aliases `CRS:84`, `OGC:CRS84`).
///
/// Other references are added with [`CrsRegistry::register`] using a `geodesy` operator
/// definition, e.g. `utm zone=56 south` for `EPSG:28356`.
#[derive(Debug, Clone)]
pub struct CrsRegistry {
    entries: HashMap<String, Crs>,
}

impl Default for CrsRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl CrsRegistry {
    /// Creates a registry that knows only the built-in references.
    pub fn with_builtins() -> Self {
        let mut entries = HashMap::new();
        for name in ["EPSG:3857", "EPSG:900913", "EPSG:102100", "EPSG:102113"] {
            entries.insert(name.to_string(), Crs::EPSG3857);
        }
        for name in ["EPSG:4326", "CRS:84", "OGC:CRS84"] {
            entries.insert(normalize_crs_name(name), Crs::WGS84);
        }

        Self { entries }
    }

    /// Registers a reference under `name`.
    ///
    /// The `definition` is either `longlat`, `webmerc` or a `geodesy` operator string. It is
    /// validated here, so a registered reference can always produce a projection. Registering
    /// an existing name replaces the previous entry.
    pub fn register(&mut self, name: &str, definition: &str) -> Result<(), TypesError> {
        let definition = definition.trim();
        let projection_type = match definition.to_lowercase().as_str() {
            GEOGRAPHIC_DEFINITION => ProjectionType::None,
            WEB_MERCATOR_DEFINITION => ProjectionType::WebMercator,
            "" => {
                return Err(TypesError::InvalidDefinition {
                    name: name.to_string(),
                    reason: "empty definition".into(),
                })
            }
            _ => ProjectionType::Other(definition.to_string()),
        };

        let crs = Crs::new(Datum::WGS84, projection_type);
        if crs.get_projection().is_none() {
            return Err(TypesError::InvalidDefinition {
                name: name.to_string(),
                reason: format!("'{definition}' is not a valid projection operator"),
            });
        }

        self.entries.insert(normalize_crs_name(name), crs);
        Ok(())
    }

    /// Returns the reference registered under the name.
    pub fn get(&self, name: &str) -> Option<&Crs> {
        self.entries.get(&normalize_crs_name(name))
    }

    /// Returns true if the name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Creates a transformation of coordinates from `source` into `target`.
    ///
    /// Fails with [`TypesError::UnknownCrs`] if any of the names is not registered. If both
    /// names refer to the same reference, [`CrsTransform::Identity`] is returned.
    pub fn transformer(&self, source: &str, target: &str) -> Result<CrsTransform, TypesError> {
        let source_crs = self
            .get(source)
            .ok_or_else(|| TypesError::UnknownCrs(source.to_string()))?;
        let target_crs = self
            .get(target)
            .ok_or_else(|| TypesError::UnknownCrs(target.to_string()))?;

        if source_crs == target_crs {
            return Ok(CrsTransform::Identity);
        }

        let projection_error = || TypesError::Projection {
            source_crs: source.to_string(),
            target_crs: target.to_string(),
        };

        Ok(CrsTransform::Chain {
            source: source_crs.get_projection().ok_or_else(projection_error)?,
            target: target_crs.get_projection().ok_or_else(projection_error)?,
            source_name: normalize_crs_name(source),
            target_name: normalize_crs_name(target),
        })
    }
}

/// Conversion of projected coordinates between two reference systems.
///
/// The conversion goes through geographic coordinates: points are unprojected with the source
/// projection and projected with the target one.
pub enum CrsTransform {
    /// Source and target are the same reference. Coordinates are returned unchanged.
    Identity,
    /// Unproject with `source`, then project with `target`.
    Chain {
        /// Projection of the source reference.
        source: BoxedProjection,
        /// Projection of the target reference.
        target: BoxedProjection,
        /// Normalized source name, used in error messages.
        source_name: String,
        /// Normalized target name, used in error messages.
        target_name: String,
    },
}

impl std::fmt::Debug for CrsTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrsTransform::Identity => f.write_str("Identity"),
            CrsTransform::Chain {
                source_name,
                target_name,
                ..
            } => write!(f, "Chain({source_name} -> {target_name})"),
        }
    }
}

impl CrsTransform {
    /// Returns true if the transformation does not change coordinates.
    pub fn is_identity(&self) -> bool {
        matches!(self, CrsTransform::Identity)
    }

    /// Converts a single point.
    pub fn transform_point(&self, point: &Point2d) -> Option<Point2d> {
        match self {
            CrsTransform::Identity => Some(*point),
            CrsTransform::Chain { source, target, .. } => {
                target.project(&source.unproject(point)?)
            }
        }
    }

    /// Converts all coordinates of the geometry.
    ///
    /// The radius of a circle is converted by measuring the distance between the converted
    /// center and a converted point on the circle to the east of the center.
    pub fn transform(&self, geom: &Geom<Point2d>) -> Result<Geom<Point2d>, TypesError> {
        let CrsTransform::Chain {
            source_name,
            target_name,
            ..
        } = self
        else {
            return Ok(geom.clone());
        };

        let error = || TypesError::Projection {
            source_crs: source_name.clone(),
            target_crs: target_name.clone(),
        };

        match geom {
            Geom::Circle(circle) => {
                let center = self.transform_point(&circle.center).ok_or_else(error)?;
                let edge = self
                    .transform_point(&Point2d::new(
                        circle.center.x + circle.radius,
                        circle.center.y,
                    ))
                    .ok_or_else(error)?;
                Ok(Geom::Circle(Circle::new(
                    center,
                    nalgebra::distance(&center, &edge),
                )))
            }
            Geom::Collection(items) => Ok(Geom::Collection(
                items
                    .iter()
                    .map(|g| self.transform(g))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            other => other
                .try_map(&mut |p| self.transform_point(p))
                .ok_or_else(error),
        }
    }
}

impl Geom<Point2d> {
    /// Converts the geometry with the given transformation. See [`CrsTransform::transform`].
    pub fn project(&self, transform: &CrsTransform) -> Result<Self, TypesError> {
        transform.transform(self)
    }
}
