use super::{WGS84_A, WGS84_E2, WGS84_EP2, wrap_lon_deg};

/// UTM scale factor on the central meridian.
pub const UTM_K0: f64 = 0.9996;
/// UTM false easting (meters).
pub const UTM_FALSE_EASTING: f64 = 500_000.0;
/// UTM false northing applied in the southern hemisphere (meters).
pub const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// A planar projection of WGS84 geographic coordinates.
///
/// All operations take and return `(x, y)` pairs: `(lon_deg, lat_deg)` on the
/// geographic side and `(easting_m, northing_m)` on the projected side.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Projection {
    /// Universal Transverse Mercator, zones 1..=60.
    Utm { zone: u8, north: bool },
    /// Lambert cylindrical equal-area on a sphere of radius `WGS84_A`.
    EqualAreaCylindrical { lon0_deg: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    UnknownCode(String),
    InvalidZone(u32),
}

impl std::fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionError::UnknownCode(code) => write!(f, "unsupported projection code: {code}"),
            ProjectionError::InvalidZone(zone) => write!(f, "invalid UTM zone: {zone}"),
        }
    }
}

impl std::error::Error for ProjectionError {}

impl Projection {
    pub fn utm(zone: u8, north: bool) -> Result<Self, ProjectionError> {
        if !(1..=60).contains(&zone) {
            return Err(ProjectionError::InvalidZone(zone as u32));
        }
        Ok(Projection::Utm { zone, north })
    }

    /// UTM zone containing the given point.
    pub fn utm_for(lon_deg: f64, lat_deg: f64) -> Self {
        let lon = wrap_lon_deg(lon_deg);
        let zone = (((lon + 180.0) / 6.0).floor() as i64).clamp(0, 59) as u8 + 1;
        Projection::Utm {
            zone,
            north: lat_deg >= 0.0,
        }
    }

    /// Parses `EPSG:326zz` / `EPSG:327zz` (WGS84 UTM north/south) or
    /// `equal-area[:lon0]`.
    pub fn from_code(code: &str) -> Result<Self, ProjectionError> {
        let trimmed = code.trim();
        let lower = trimmed.to_ascii_lowercase();

        if let Some(rest) = lower.strip_prefix("equal-area") {
            let lon0_deg = match rest.strip_prefix(':') {
                Some(v) => v
                    .parse::<f64>()
                    .map_err(|_| ProjectionError::UnknownCode(trimmed.to_string()))?,
                None if rest.is_empty() => 0.0,
                None => return Err(ProjectionError::UnknownCode(trimmed.to_string())),
            };
            return Ok(Projection::EqualAreaCylindrical { lon0_deg });
        }

        let digits = lower.strip_prefix("epsg:").unwrap_or(&lower);
        let epsg: u32 = digits
            .parse()
            .map_err(|_| ProjectionError::UnknownCode(trimmed.to_string()))?;
        match epsg {
            32601..=32660 => Projection::utm((epsg - 32600) as u8, true),
            32701..=32760 => Projection::utm((epsg - 32700) as u8, false),
            32600 | 32661..=32700 | 32761..=32799 => {
                Err(ProjectionError::InvalidZone(epsg % 100))
            }
            _ => Err(ProjectionError::UnknownCode(trimmed.to_string())),
        }
    }

    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        match *self {
            Projection::Utm { zone, north } => utm_forward(zone, north, lon_deg, lat_deg),
            Projection::EqualAreaCylindrical { lon0_deg } => {
                let dlon = wrap_lon_deg(lon_deg - lon0_deg).to_radians();
                (WGS84_A * dlon, WGS84_A * lat_deg.to_radians().sin())
            }
        }
    }

    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        match *self {
            Projection::Utm { zone, north } => utm_inverse(zone, north, x, y),
            Projection::EqualAreaCylindrical { lon0_deg } => {
                let lon = wrap_lon_deg(lon0_deg + (x / WGS84_A).to_degrees());
                let lat = (y / WGS84_A).clamp(-1.0, 1.0).asin().to_degrees();
                (lon, lat)
            }
        }
    }
}

fn central_meridian_deg(zone: u8) -> f64 {
    (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0
}

fn meridian_arc(lat_rad: f64) -> f64 {
    let e2 = WGS84_E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat_rad
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat_rad).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat_rad).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat_rad).sin())
}

// Series expansions after Snyder, "Map Projections: A Working Manual" (1987).
fn utm_forward(zone: u8, north: bool, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let lat = lat_deg.to_radians();
    let dlon = wrap_lon_deg(lon_deg - central_meridian_deg(zone)).to_radians();

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = WGS84_EP2 * cos_lat * cos_lat;
    let a = cos_lat * dlon;
    let m = meridian_arc(lat);

    let a2 = a * a;
    let a3 = a2 * a;
    let a4 = a3 * a;
    let a5 = a4 * a;
    let a6 = a5 * a;

    let x = UTM_K0
        * n
        * (a + (1.0 - t + c) * a3 / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * WGS84_EP2) * a5 / 120.0)
        + UTM_FALSE_EASTING;

    let mut y = UTM_K0
        * (m + n
            * tan_lat
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * WGS84_EP2) * a6 / 720.0));
    if !north {
        y += UTM_FALSE_NORTHING_SOUTH;
    }

    (x, y)
}

fn utm_inverse(zone: u8, north: bool, x: f64, y: f64) -> (f64, f64) {
    let e2 = WGS84_E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let northing = if north { y } else { y - UTM_FALSE_NORTHING_SOUTH };

    let m = northing / UTM_K0;
    let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    let sqrt_1me2 = (1.0 - e2).sqrt();
    let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_3 * e1;

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let denom = 1.0 - e2 * sin_phi1 * sin_phi1;
    let n1 = WGS84_A / denom.sqrt();
    let t1 = tan_phi1 * tan_phi1;
    let c1 = WGS84_EP2 * cos_phi1 * cos_phi1;
    let r1 = WGS84_A * (1.0 - e2) / denom.powf(1.5);
    let d = (x - UTM_FALSE_EASTING) / (n1 * UTM_K0);

    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d3 * d;
    let d5 = d4 * d;
    let d6 = d5 * d;

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * WGS84_EP2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * WGS84_EP2
                    - 3.0 * c1 * c1)
                    * d6
                    / 720.0);

    let dlon = (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * WGS84_EP2 + 24.0 * t1 * t1) * d5
            / 120.0)
        / cos_phi1;

    let lon = wrap_lon_deg(central_meridian_deg(zone) + dlon.to_degrees());
    (lon, lat.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::{Projection, ProjectionError, UTM_FALSE_EASTING};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn parses_epsg_codes() {
        assert_eq!(
            Projection::from_code("EPSG:32630"),
            Ok(Projection::Utm {
                zone: 30,
                north: true
            })
        );
        assert_eq!(
            Projection::from_code("32728"),
            Ok(Projection::Utm {
                zone: 28,
                north: false
            })
        );
        assert_eq!(
            Projection::from_code("equal-area"),
            Ok(Projection::EqualAreaCylindrical { lon0_deg: 0.0 })
        );
        assert_eq!(
            Projection::from_code("equal-area:-10"),
            Ok(Projection::EqualAreaCylindrical { lon0_deg: -10.0 })
        );
        assert_eq!(
            Projection::from_code("EPSG:4326"),
            Err(ProjectionError::UnknownCode("EPSG:4326".to_string()))
        );
        assert_eq!(
            Projection::from_code("EPSG:32600"),
            Err(ProjectionError::InvalidZone(0))
        );
    }

    #[test]
    fn central_meridian_maps_to_false_easting() {
        let p = Projection::utm(30, true).expect("zone");
        let (x, y) = p.forward(-3.0, 0.0);
        assert_close(x, UTM_FALSE_EASTING, 1e-6);
        assert_close(y, 0.0, 1e-6);
    }

    #[test]
    fn utm_known_point() {
        // Nouakchott, zone 28N.
        let p = Projection::utm(28, true).expect("zone");
        let (x, y) = p.forward(-15.9785, 18.0735);
        assert_close(x, 396_452.333, 0.01);
        assert_close(y, 1_998_591.657, 0.01);
    }

    #[test]
    fn utm_round_trip_within_zone() {
        let p = Projection::utm(30, true).expect("zone");
        for &(lon, lat) in &[(-3.0, 15.0), (-5.5, 17.25), (-0.5, 21.0), (-4.0, 0.5)] {
            let (x, y) = p.forward(lon, lat);
            let (lon_rt, lat_rt) = p.inverse(x, y);
            assert_close(lon_rt, lon, 1e-6);
            assert_close(lat_rt, lat, 1e-6);
        }
    }

    #[test]
    fn utm_round_trip_southern_hemisphere() {
        let p = Projection::utm(33, false).expect("zone");
        let (x, y) = p.forward(14.0, -12.0);
        assert!(y > 0.0);
        let (lon, lat) = p.inverse(x, y);
        assert_close(lon, 14.0, 1e-6);
        assert_close(lat, -12.0, 1e-6);
    }

    #[test]
    fn equal_area_round_trip() {
        let p = Projection::EqualAreaCylindrical { lon0_deg: -10.0 };
        let (x, y) = p.forward(-12.5, 42.0);
        let (lon, lat) = p.inverse(x, y);
        assert_close(lon, -12.5, 1e-9);
        assert_close(lat, 42.0, 1e-9);
    }

    #[test]
    fn picks_utm_zone_from_point() {
        assert_eq!(
            Projection::utm_for(-9.5, 16.0),
            Projection::Utm {
                zone: 29,
                north: true
            }
        );
        assert_eq!(
            Projection::utm_for(180.0, -1.0),
            Projection::Utm {
                zone: 1,
                north: false
            }
        );
    }
}
