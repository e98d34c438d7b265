use std::f64::consts::PI;

use hexmap_shared::LonLat;

/// Width and height of the whole world at zoom 0, in world units.
pub const WORLD_SIZE: f64 = 256.0;
/// Web Mercator is undefined at the poles; latitudes are clamped to this.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

pub const NYC_CENTER: LonLat = LonLat::new(-74.0060, 40.7128);
pub const NYC_ZOOM: f64 = 11.0;

/// Project lon/lat degrees into world coordinates. `y` grows southwards.
pub fn project(point: LonLat) -> (f64, f64) {
    let x = (point.lon + 180.0) / 360.0 * WORLD_SIZE;
    let sin = point
        .lat
        .clamp(-MAX_LATITUDE, MAX_LATITUDE)
        .to_radians()
        .sin();
    let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI)) * WORLD_SIZE;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn origin_maps_to_world_center() {
        let (x, y) = project(LonLat::new(0.0, 0.0));
        assert!((x - 128.0).abs() < EPS);
        assert!((y - 128.0).abs() < EPS);
    }

    #[test]
    fn antimeridian_spans_the_world_width() {
        let (west, _) = project(LonLat::new(-180.0, 0.0));
        let (east, _) = project(LonLat::new(180.0, 0.0));
        assert!(west.abs() < EPS);
        assert!((east - WORLD_SIZE).abs() < EPS);
    }

    #[test]
    fn latitude_is_clamped_at_the_mercator_limit() {
        let (_, north) = project(LonLat::new(0.0, 90.0));
        let (_, limit) = project(LonLat::new(0.0, MAX_LATITUDE));
        assert!((north - limit).abs() < EPS);
        assert!(north.abs() < 1e-6);
    }
}
