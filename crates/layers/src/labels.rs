use foundation::Aabb2;
use foundation::math::Projection;
use geo::{Area, BoundingRect, Centroid, Coord, MapCoords, MultiPolygon};
use serde::Serialize;

use crate::symbology::LabelStyle;

/// Slack (degrees) allowed when checking an anchor against its geometry's
/// native bounding box.
pub const ANCHOR_BOUNDS_EPS_DEG: f64 = 1e-9;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    Department,
    Commune,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelAnchor {
    pub position: LatLon,
    pub text: String,
    pub kind: LabelKind,
    pub style: LabelStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnchorError {
    EmptyGeometry,
    DegenerateGeometry,
    /// The computed point fell outside the geometry's native bounding box.
    OutsideBounds { anchor: LatLon },
}

impl std::fmt::Display for AnchorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnchorError::EmptyGeometry => write!(f, "geometry is empty"),
            AnchorError::DegenerateGeometry => {
                write!(f, "geometry has no area or non-finite coordinates")
            }
            AnchorError::OutsideBounds { anchor } => write!(
                f,
                "anchor ({}, {}) lies outside the geometry bounds",
                anchor.lat, anchor.lon
            ),
        }
    }
}

impl std::error::Error for AnchorError {}

/// Computes label anchors as area centroids.
///
/// With a projection configured, the centroid is taken in projected space
/// and mapped back to geographic coordinates before it is returned.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct LabelAnchorCalculator {
    projection: Option<Projection>,
}

impl LabelAnchorCalculator {
    pub fn new(projection: Option<Projection>) -> Self {
        Self { projection }
    }

    pub fn native() -> Self {
        Self::default()
    }

    pub fn projection(&self) -> Option<Projection> {
        self.projection
    }

    pub fn anchor_for(&self, geometry: &MultiPolygon<f64>) -> Result<LatLon, AnchorError> {
        anchor_for(geometry, self.projection.as_ref())
    }
}

pub fn anchor_for(
    geometry: &MultiPolygon<f64>,
    projection: Option<&Projection>,
) -> Result<LatLon, AnchorError> {
    let rect = geometry.bounding_rect().ok_or(AnchorError::EmptyGeometry)?;
    let area = geometry.unsigned_area();
    if !area.is_finite() || area <= 0.0 {
        return Err(AnchorError::DegenerateGeometry);
    }

    let (lon, lat) = match projection {
        None => {
            let c = geometry
                .centroid()
                .ok_or(AnchorError::DegenerateGeometry)?;
            (c.x(), c.y())
        }
        Some(p) => {
            let projected = geometry.map_coords(|c| {
                let (x, y) = p.forward(c.x, c.y);
                Coord { x, y }
            });
            let c = projected
                .centroid()
                .ok_or(AnchorError::DegenerateGeometry)?;
            p.inverse(c.x(), c.y())
        }
    };

    if !lon.is_finite() || !lat.is_finite() {
        return Err(AnchorError::DegenerateGeometry);
    }

    let anchor = LatLon::new(lat, lon);
    let bounds = Aabb2::new([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
    if !bounds.contains_with_tolerance([lon, lat], ANCHOR_BOUNDS_EPS_DEG) {
        return Err(AnchorError::OutsideBounds { anchor });
    }
    Ok(anchor)
}

#[cfg(test)]
mod tests {
    use super::{AnchorError, LabelAnchorCalculator, anchor_for};
    use foundation::math::Projection;
    use geo::{BoundingRect, MultiPolygon, polygon};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn rect(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: min_lon, y: min_lat),
            (x: max_lon, y: min_lat),
            (x: max_lon, y: max_lat),
            (x: min_lon, y: max_lat),
            (x: min_lon, y: min_lat),
        ]])
    }

    #[test]
    fn native_anchor_is_planar_centroid() {
        let anchor = LabelAnchorCalculator::native()
            .anchor_for(&rect(-10.0, 16.0, -9.0, 17.0))
            .expect("anchor");
        assert_close(anchor.lon, -9.5, 1e-12);
        assert_close(anchor.lat, 16.5, 1e-12);
    }

    #[test]
    fn projected_anchor_is_returned_in_native_coordinates() {
        // Large rectangle from the equator to 60N: the equal-area centroid sits
        // well south of the lat/lon midpoint.
        let geom = rect(0.0, 0.0, 10.0, 60.0);
        let native = anchor_for(&geom, None).expect("native");
        let projected = anchor_for(
            &geom,
            Some(&Projection::EqualAreaCylindrical { lon0_deg: 0.0 }),
        )
        .expect("projected");

        assert_close(native.lat, 30.0, 1e-9);
        // asin((sin 0 + sin 60) / 2)
        let expected_lat = (60f64.to_radians().sin() / 2.0).asin().to_degrees();
        assert_close(projected.lat, expected_lat, 1e-9);
        assert_close(projected.lon, 5.0, 1e-9);
        assert!((projected.lat - native.lat).abs() > 1.0);
    }

    #[test]
    fn utm_anchor_changes_and_stays_within_native_bounds() {
        // Skewed triangle near the edge of zone 30N.
        let geom = MultiPolygon::new(vec![polygon![
            (x: -6.0, y: 10.0),
            (x: 0.0, y: 10.0),
            (x: -5.5, y: 24.0),
            (x: -6.0, y: 10.0),
        ]]);
        let utm = Projection::from_code("EPSG:32630").expect("utm");
        let native = anchor_for(&geom, None).expect("native");
        let projected = LabelAnchorCalculator::new(Some(utm))
            .anchor_for(&geom)
            .expect("projected");

        let bbox = geom.bounding_rect().expect("bbox");
        assert!(projected.lon >= bbox.min().x && projected.lon <= bbox.max().x);
        assert!(projected.lat >= bbox.min().y && projected.lat <= bbox.max().y);

        let moved = (projected.lat - native.lat).abs() + (projected.lon - native.lon).abs();
        assert!(moved > 1e-4, "projected anchor should differ, moved {moved}");
        // A mis-reversed projection would return metres, far outside the box.
        assert!(projected.lon.abs() < 180.0 && projected.lat.abs() < 90.0);
    }

    #[test]
    fn empty_and_degenerate_geometries_are_rejected() {
        let empty = MultiPolygon::<f64>::new(Vec::new());
        assert_eq!(anchor_for(&empty, None), Err(AnchorError::EmptyGeometry));

        let flat = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 0.0, y: 0.0),
        ]]);
        assert_eq!(anchor_for(&flat, None), Err(AnchorError::DegenerateGeometry));
    }
}
