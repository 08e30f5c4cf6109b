//! Surface distance between two (latitude, longitude) fixes, in meters.
//! Elevation is deliberately ignored: this is 2D distance over the ellipsoid
//! or sphere, not slope distance.

use geo::{point, GeodesicDistance, HaversineDistance};

use crate::config::DistanceModel;

pub trait SurfaceDistance {
    fn meters(&self, from: (f64, f64), to: (f64, f64)) -> f64;
}

pub struct Geodesic;

impl SurfaceDistance for Geodesic {
    fn meters(&self, from: (f64, f64), to: (f64, f64)) -> f64 {
        let a = point!(x: from.1, y: from.0);
        let b = point!(x: to.1, y: to.0);
        a.geodesic_distance(&b)
    }
}

pub struct Haversine;

impl SurfaceDistance for Haversine {
    fn meters(&self, from: (f64, f64), to: (f64, f64)) -> f64 {
        let a = point!(x: from.1, y: from.0);
        let b = point!(x: to.1, y: to.0);
        a.haversine_distance(&b)
    }
}

pub fn for_model(model: DistanceModel) -> Box<dyn SurfaceDistance + Send + Sync> {
    match model {
        DistanceModel::Geodesic => Box::new(Geodesic),
        DistanceModel::Haversine => Box::new(Haversine),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        let p = (36.80, 138.78);
        assert_eq!(Geodesic.meters(p, p), 0.0);
        assert_eq!(Haversine.meters(p, p), 0.0);
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = Geodesic.meters((0.0, 0.0), (0.0, 1.0));
        assert!((d - 111_319.49).abs() < 1.0, "got {}", d);

        let h = Haversine.meters((0.0, 0.0), (0.0, 1.0));
        assert!((h - 111_195.0).abs() < 10.0, "got {}", h);
    }

    #[test]
    fn test_models_agree_over_short_hops() {
        let a = (36.8000, 138.7800);
        let b = (36.8010, 138.7815);
        let g = Geodesic.meters(a, b);
        let h = Haversine.meters(a, b);
        assert!(g > 150.0 && g < 200.0);
        assert!((g - h).abs() / g < 0.01);
    }

    #[test]
    fn test_for_model_dispatch() {
        let a = (0.0, 0.0);
        let b = (0.0, 1.0);
        assert_eq!(for_model(DistanceModel::Geodesic).meters(a, b), Geodesic.meters(a, b));
        assert_eq!(for_model(DistanceModel::Haversine).meters(a, b), Haversine.meters(a, b));
    }
}
