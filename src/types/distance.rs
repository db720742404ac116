use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::GeoCoordinate;

/// Statute miles per degree of arc: sixty nautical minutes at 1.1515 miles each.
const MILES_PER_DEGREE: f64 = 60.0 * 1.1515;
const KILOMETERS_PER_MILE: f64 = 1.609344;
const NAUTICAL_MILES_PER_MILE: f64 = 0.8684;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[default]
    Miles,
    Kilometers,
    NauticalMiles,
}

impl DistanceUnit {
    fn convert_miles(&self, miles: f64) -> f64 {
        match self {
            DistanceUnit::Miles => miles,
            DistanceUnit::Kilometers => miles * KILOMETERS_PER_MILE,
            DistanceUnit::NauticalMiles => miles * NAUTICAL_MILES_PER_MILE,
        }
    }

    /// How far one degree of latitude reaches, in this unit.
    pub fn per_degree(&self) -> f64 {
        self.convert_miles(MILES_PER_DEGREE)
    }
}

/// Great-circle distance using the spherical law of cosines.
///
/// Identical coordinates short-circuit to exactly zero. The conversion
/// constants are the classic geodatasource approximations and are kept as-is.
pub fn distance(a: GeoCoordinate, b: GeoCoordinate, unit: DistanceUnit) -> f64 {
    if a.lat() == b.lat() && a.long() == b.long() {
        return 0.0;
    }

    let rad_lat1 = PI * (a.lat() / 180.0);
    let rad_lat2 = PI * (b.lat() / 180.0);
    let theta = a.long() - b.long();
    let rad_theta = PI * (theta / 180.0);

    let cosine = rad_lat1.sin() * rad_lat2.sin()
        + rad_lat1.cos() * rad_lat2.cos() * rad_theta.cos();
    // rounding can push the argument just past ±1
    let central_angle = cosine.clamp(-1.0, 1.0).acos();

    let miles = central_angle * (180.0 / PI) * MILES_PER_DEGREE;
    unit.convert_miles(miles)
}

/// The shrinking play area. Owned by the game-state layer, read here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameCircle {
    pub center: GeoCoordinate,
    pub radius: f64,
    #[serde(default)]
    pub unit: DistanceUnit,
}

impl GameCircle {
    pub fn new(center: GeoCoordinate, radius: f64, unit: DistanceUnit) -> Self {
        Self {
            center,
            radius,
            unit,
        }
    }

    pub fn contains(&self, coord: GeoCoordinate) -> bool {
        distance(self.center, coord, self.unit) <= self.radius
    }

    /// Half-widths in degrees (lat, long) of a box that encloses the circle.
    pub fn envelope_degrees(&self) -> (f64, f64) {
        let lat_span = self.radius / self.unit.per_degree();
        let cos_lat = self.center.lat().to_radians().cos();
        let long_span = if cos_lat <= f64::EPSILON {
            180.0
        } else {
            (lat_span / cos_lat).min(180.0)
        };
        (lat_span, long_span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOME: GeoCoordinate = GeoCoordinate::new(21.738836, -97.933290);

    #[test]
    fn same_point_is_exactly_zero() {
        for unit in [
            DistanceUnit::Miles,
            DistanceUnit::Kilometers,
            DistanceUnit::NauticalMiles,
        ] {
            assert_eq!(distance(TOME, TOME, unit), 0.0);
        }
        let pole = GeoCoordinate::new(90.0, 0.0);
        assert_eq!(distance(pole, pole, DistanceUnit::Miles), 0.0);
    }

    #[test]
    fn symmetric() {
        let pairs = [
            (TOME, GeoCoordinate::new(52.1951, 0.1313)),
            (GeoCoordinate::new(-33.9, 151.2), GeoCoordinate::new(40.7, -74.0)),
            (GeoCoordinate::new(0.0, 179.9), GeoCoordinate::new(0.0, -179.9)),
        ];
        for (a, b) in pairs {
            assert_eq!(
                distance(a, b, DistanceUnit::Miles),
                distance(b, a, DistanceUnit::Miles)
            );
        }
    }

    #[test]
    fn unit_conversions_are_exact_multiples() {
        let b = GeoCoordinate::new(19.4326, -99.1332);
        let miles = distance(TOME, b, DistanceUnit::Miles);
        assert_eq!(distance(TOME, b, DistanceUnit::Kilometers), miles * 1.609344);
        assert_eq!(distance(TOME, b, DistanceUnit::NauticalMiles), miles * 0.8684);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance(
            GeoCoordinate::new(0.0, 0.0),
            GeoCoordinate::new(1.0, 0.0),
            DistanceUnit::Miles,
        );
        assert!((d - 69.09).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn near_identical_points_never_produce_nan() {
        // The raw cosine for this pair rounds to just above 1.0.
        let a = GeoCoordinate::new(-84.470637, 14.825665);
        let b = GeoCoordinate::new(-84.470637, 14.825665 + 1e-13);
        let d = distance(a, b, DistanceUnit::Miles);
        assert!(!d.is_nan());
        assert_eq!(d, 0.0);

        let c = GeoCoordinate::new(21.738836, -97.933290 + 1e-13);
        let origin = GeoCoordinate::new(21.738836, -97.933290);
        assert!(!distance(origin, c, DistanceUnit::Kilometers).is_nan());
    }

    #[test]
    fn antipodes_never_produce_nan() {
        let d = distance(
            GeoCoordinate::new(0.0, 0.0),
            GeoCoordinate::new(0.0, 180.0),
            DistanceUnit::Miles,
        );
        assert!((d - 180.0 * 69.09).abs() < 1e-6);
        let d = distance(
            GeoCoordinate::new(45.0, 10.0),
            GeoCoordinate::new(-45.0, -170.0),
            DistanceUnit::Miles,
        );
        assert!(!d.is_nan());
    }

    #[test]
    fn circle_membership() {
        let circle = GameCircle::new(TOME, 1.0, DistanceUnit::Kilometers);
        assert!(circle.contains(TOME));
        assert!(circle.contains(GeoCoordinate::new(21.7420, -97.9330)));
        assert!(!circle.contains(GeoCoordinate::new(21.76, -97.9333)));
    }

    #[test]
    fn envelope_covers_the_circle() {
        let circle = GameCircle::new(GeoCoordinate::new(60.0, 0.0), 69.09, DistanceUnit::Miles);
        let (lat, long) = circle.envelope_degrees();
        assert!((lat - 1.0).abs() < 1e-9);
        assert!((long - 2.0).abs() < 1e-6);
    }
}
