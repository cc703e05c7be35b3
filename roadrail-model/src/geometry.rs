//! Source and target geometry, and the marshaling seam between them.
//!
//! Geometry math proper (curve evaluation, mesh processing) belongs to an
//! external geometry library. This module only carries the payloads and a
//! minimal affine marshaler that applies the run's unit/coordinate transform.

use serde::{Deserialize, Serialize};

/// A point in model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar distance, ignoring elevation.
    #[must_use]
    pub fn distance_xy(&self, other: &Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Shape of one horizontal segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Line,
    Arc,
    Spiral,
}

/// One element of a horizontal alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizontalSegment {
    pub kind: SegmentKind,
    pub start: Point3,
    pub end: Point3,
    /// Radius for arcs, end radius for spirals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

impl HorizontalSegment {
    /// Shorthand for a straight segment.
    #[must_use]
    pub fn line(start: Point3, end: Point3) -> Self {
        Self {
            kind: SegmentKind::Line,
            start,
            end,
            radius: None,
        }
    }
}

/// Horizontal alignment geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizontalGeometry {
    pub start_station: f64,
    pub segments: Vec<HorizontalSegment>,
}

/// A station/elevation pair on a vertical profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub station: f64,
    pub elevation: f64,
}

impl ProfilePoint {
    #[must_use]
    pub const fn new(station: f64, elevation: f64) -> Self {
        Self { station, elevation }
    }
}

/// Vertical profile geometry, points ordered by station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalGeometry {
    pub points: Vec<ProfilePoint>,
}

/// Corridor header data relevant to classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CorridorHeader {
    /// Cant (rail superelevation) data present.
    pub has_cant: bool,
    /// Road superelevation data present.
    pub has_superelevation: bool,
}

/// Triangulated corridor surface with its station extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMesh {
    pub start_station: f64,
    pub end_station: f64,
    pub vertices: Vec<Point3>,
    pub triangles: Vec<[u32; 3]>,
}

/// Geometric payload of a source entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometryPayload {
    Empty,
    Horizontal(HorizontalGeometry),
    Vertical(VerticalGeometry),
    Corridor(CorridorHeader),
    Surface(SurfaceMesh),
}

impl GeometryPayload {
    /// False when there is nothing to convert.
    #[must_use]
    pub fn is_convertible(&self) -> bool {
        match self {
            GeometryPayload::Empty => false,
            GeometryPayload::Horizontal(h) => !h.segments.is_empty(),
            GeometryPayload::Vertical(v) => v.points.len() >= 2,
            GeometryPayload::Corridor(_) => true,
            GeometryPayload::Surface(s) => !s.triangles.is_empty(),
        }
    }
}

/// Geometry as persisted on a target entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetGeometry {
    #[default]
    None,
    Polyline {
        points: Vec<Point3>,
    },
    Profile {
        points: Vec<ProfilePoint>,
    },
    Mesh {
        vertices: Vec<Point3>,
        triangles: Vec<[u32; 3]>,
    },
}

/// Unit scale and translation applied to source coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialTransform {
    pub scale: f64,
    pub offset: Point3,
}

impl Default for SpatialTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Point3::new(0.0, 0.0, 0.0),
        }
    }
}

impl SpatialTransform {
    #[must_use]
    pub fn apply(&self, p: &Point3) -> Point3 {
        Point3::new(
            p.x * self.scale + self.offset.x,
            p.y * self.scale + self.offset.y,
            p.z * self.scale + self.offset.z,
        )
    }

    /// Scales a length along the alignment (stations are not translated).
    #[must_use]
    pub fn apply_length(&self, length: f64) -> f64 {
        length * self.scale
    }
}

/// Errors raised while marshaling geometry.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("no convertible geometry")]
    Empty,

    #[error("non-finite coordinate in {0}")]
    NonFinite(&'static str),

    #[error("mesh triangle references vertex {index} but only {count} vertices exist")]
    InvalidMesh { index: u32, count: usize },

    #[error("invalid spatial transform scale: {0}")]
    InvalidScale(f64),
}

/// Converts source geometry into target geometry.
///
/// Implementations must be pure: the same payload and transform always
/// produce the same result.
pub trait GeometryMarshaler: Send + Sync {
    fn marshal(
        &self,
        payload: &GeometryPayload,
        transform: &SpatialTransform,
    ) -> Result<TargetGeometry, GeometryError>;
}

/// Default marshaler: flattens horizontal segments to a polyline through
/// their end points and applies the affine transform everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct AffineMarshaler;

impl GeometryMarshaler for AffineMarshaler {
    fn marshal(
        &self,
        payload: &GeometryPayload,
        transform: &SpatialTransform,
    ) -> Result<TargetGeometry, GeometryError> {
        if !transform.scale.is_finite() || transform.scale <= 0.0 {
            return Err(GeometryError::InvalidScale(transform.scale));
        }

        match payload {
            GeometryPayload::Empty => Err(GeometryError::Empty),
            GeometryPayload::Horizontal(h) => {
                let first = h.segments.first().ok_or(GeometryError::Empty)?;
                let mut points = Vec::with_capacity(h.segments.len() + 1);
                points.push(first.start);
                points.extend(h.segments.iter().map(|s| s.end));
                if !points.iter().all(Point3::is_finite) {
                    return Err(GeometryError::NonFinite("horizontal alignment"));
                }
                Ok(TargetGeometry::Polyline {
                    points: points.iter().map(|p| transform.apply(p)).collect(),
                })
            }
            GeometryPayload::Vertical(v) => {
                if v.points.len() < 2 {
                    return Err(GeometryError::Empty);
                }
                if !v
                    .points
                    .iter()
                    .all(|p| p.station.is_finite() && p.elevation.is_finite())
                {
                    return Err(GeometryError::NonFinite("vertical profile"));
                }
                Ok(TargetGeometry::Profile {
                    points: v
                        .points
                        .iter()
                        .map(|p| {
                            ProfilePoint::new(
                                transform.apply_length(p.station),
                                p.elevation * transform.scale + transform.offset.z,
                            )
                        })
                        .collect(),
                })
            }
            GeometryPayload::Corridor(_) => Ok(TargetGeometry::None),
            GeometryPayload::Surface(s) => {
                if s.triangles.is_empty() {
                    return Err(GeometryError::Empty);
                }
                let count = s.vertices.len();
                if let Some(index) = s
                    .triangles
                    .iter()
                    .flatten()
                    .copied()
                    .find(|&i| i as usize >= count)
                {
                    return Err(GeometryError::InvalidMesh { index, count });
                }
                if !s.vertices.iter().all(Point3::is_finite) {
                    return Err(GeometryError::NonFinite("corridor surface"));
                }
                Ok(TargetGeometry::Mesh {
                    vertices: s.vertices.iter().map(|p| transform.apply(p)).collect(),
                    triangles: s.triangles.clone(),
                })
            }
        }
    }
}

/// Builds an approximate 3D polyline by lifting a marshaled horizontal
/// polyline onto a marshaled profile.
///
/// Stations are the cumulative planar length from `start_station`.
/// Elevations are linearly interpolated and clamped to the profile ends.
/// Returns an empty vector when either input is empty.
#[must_use]
pub fn approximate_3d(polyline: &[Point3], start_station: f64, profile: &[ProfilePoint]) -> Vec<Point3> {
    if polyline.is_empty() || profile.is_empty() {
        return Vec::new();
    }

    let mut station = start_station;
    let mut out = Vec::with_capacity(polyline.len());
    let mut prev: Option<&Point3> = None;
    for p in polyline {
        if let Some(q) = prev {
            station += q.distance_xy(p);
        }
        out.push(Point3::new(p.x, p.y, elevation_at(profile, station)));
        prev = Some(p);
    }
    out
}

fn elevation_at(profile: &[ProfilePoint], station: f64) -> f64 {
    let first = profile[0];
    let last = profile[profile.len() - 1];
    if station <= first.station {
        return first.elevation;
    }
    if station >= last.station {
        return last.elevation;
    }
    for pair in profile.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if station >= a.station && station <= b.station {
            let span = b.station - a.station;
            if span <= f64::EPSILON {
                return b.elevation;
            }
            let t = (station - a.station) / span;
            return a.elevation + t * (b.elevation - a.elevation);
        }
    }
    last.elevation
}
