use crate::classify::DistanceCategory;
use crate::colors::Rgb;
use crate::distance::HexId;

pub const INITIAL_FILL: Rgb = (51, 136, 255);
pub const INITIAL_OPACITY: f64 = 0.1;
pub const RECOLORED_OPACITY: f64 = 0.25;
pub const HOVER_OPACITY: f64 = 0.4;
pub const HIGHLIGHT_FILL: Rgb = (255, 0, 0);
pub const HIGHLIGHT_OPACITY: f64 = 0.6;
pub const STROKE_COLOR: Rgb = (255, 255, 255);
pub const STROKE_WIDTH: f64 = 1.0;

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Closed ring of positions; the first position is repeated at the end.
pub type Ring = Vec<LonLat>;

/// Axis-aligned box over `(x, y)` pairs. Used both for lon/lat and projected space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub const fn point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn union(mut self, other: Bounds) -> Bounds {
        self.include(other.min_x, other.min_y);
        self.include(other.max_x, other.max_y);
        self
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// True when the two boxes share at least one point.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

/// Polygon shape of one grid cell. Each polygon is an exterior ring followed by holes.
/// Empty when the source feature had a null geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HexGeometry {
    pub polygons: Vec<Vec<Ring>>,
}

impl HexGeometry {
    pub fn is_empty(&self) -> bool {
        self.polygons
            .iter()
            .all(|rings| rings.iter().all(|ring| ring.is_empty()))
    }

    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.polygons.iter().flatten()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self.rings().flatten();
        let first = points.next()?;
        let mut bounds = Bounds::point(first.lon, first.lat);
        for p in points {
            bounds.include(p.lon, p.lat);
        }
        Some(bounds)
    }
}

/// Fill applied to a hexagon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexStyle {
    pub fill: Rgb,
    pub fill_opacity: f64,
}

impl HexStyle {
    pub const INITIAL: Self = Self {
        fill: INITIAL_FILL,
        fill_opacity: INITIAL_OPACITY,
    };

    pub const HIGHLIGHT: Self = Self {
        fill: HIGHLIGHT_FILL,
        fill_opacity: HIGHLIGHT_OPACITY,
    };

    pub fn for_category(category: DistanceCategory) -> Self {
        Self {
            fill: category.rgb(),
            fill_opacity: RECOLORED_OPACITY,
        }
    }

    /// Style drawn while the pointer is over the hexagon. Never lowers opacity.
    pub fn hovered(self) -> Self {
        Self {
            fill_opacity: self.fill_opacity.max(HOVER_OPACITY),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hexagon {
    id: HexId,
    geometry: HexGeometry,
    bounds: Option<Bounds>,
    style: HexStyle,
}

impl Hexagon {
    pub fn id(&self) -> HexId {
        self.id
    }

    pub fn geometry(&self) -> &HexGeometry {
        &self.geometry
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn style(&self) -> HexStyle {
        self.style
    }
}

/// The fixed, order-stable grid. Ids are positions, so there is no way to
/// insert or remove cells once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HexagonSet {
    hexagons: Vec<Hexagon>,
}

impl HexagonSet {
    pub fn from_geometries(geometries: Vec<HexGeometry>) -> Self {
        let hexagons = geometries
            .into_iter()
            .enumerate()
            .map(|(index, geometry)| Hexagon {
                id: HexId::from_index(index),
                bounds: geometry.bounds(),
                geometry,
                style: HexStyle::INITIAL,
            })
            .collect();
        Self { hexagons }
    }

    pub fn len(&self) -> usize {
        self.hexagons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hexagons.is_empty()
    }

    pub fn get(&self, id: HexId) -> Option<&Hexagon> {
        self.hexagons.get(id.index())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hexagon> {
        self.hexagons.iter()
    }

    /// Lon/lat bounds of all non-empty geometry.
    pub fn bounds(&self) -> Option<Bounds> {
        self.hexagons
            .iter()
            .filter_map(|hex| hex.bounds)
            .reduce(Bounds::union)
    }

    pub fn reset_styles(&mut self) {
        for hex in &mut self.hexagons {
            hex.style = HexStyle::INITIAL;
        }
    }
}

impl crate::recolor::HexSurface for HexagonSet {
    fn hex_count(&self) -> usize {
        self.hexagons.len()
    }

    fn set_style(&mut self, id: HexId, style: HexStyle) {
        if let Some(hex) = self.hexagons.get_mut(id.index()) {
            hex.style = style;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Axis-aligned square standing in for a hexagon cell.
    pub(crate) fn square(lon: f64, lat: f64, size: f64) -> HexGeometry {
        HexGeometry {
            polygons: vec![vec![vec![
                LonLat::new(lon, lat),
                LonLat::new(lon + size, lat),
                LonLat::new(lon + size, lat + size),
                LonLat::new(lon, lat + size),
                LonLat::new(lon, lat),
            ]]],
        }
    }

    #[test]
    fn ids_follow_sequence_order() {
        let set = HexagonSet::from_geometries(vec![
            square(0.0, 0.0, 1.0),
            HexGeometry::default(),
            square(2.0, 0.0, 1.0),
        ]);
        let ids: Vec<u32> = set.iter().map(|hex| hex.id().get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(set.iter().all(|hex| hex.style() == HexStyle::INITIAL));
        assert!(set.get(HexId::from_index(1)).is_some_and(|hex| hex.geometry().is_empty()));
        assert!(set.get(HexId::from_index(3)).is_none());
    }

    #[test]
    fn bounds_intersection_includes_touching_edges() {
        let a = Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 1.0,
            max_y: 1.0,
        };
        let touching = Bounds::point(1.0, 0.5);
        let apart = Bounds {
            min_x: 1.5,
            min_y: 0.0,
            max_x: 2.0,
            max_y: 1.0,
        };
        assert!(a.intersects(&touching));
        assert!(touching.intersects(&a));
        assert!(!a.intersects(&apart));
    }

    #[test]
    fn bounds_skip_empty_geometry() {
        let set = HexagonSet::from_geometries(vec![
            square(-74.0, 40.6, 0.01),
            HexGeometry::default(),
            square(-73.9, 40.7, 0.01),
        ]);
        let bounds = set.bounds().expect("bounds");
        assert_eq!(bounds.min_x, -74.0);
        assert_eq!(bounds.min_y, 40.6);
        assert!((bounds.max_x - -73.89).abs() < 1e-9);
        assert!((bounds.max_y - 40.71).abs() < 1e-9);
    }

    #[test]
    fn hover_never_dims_a_highlight() {
        assert_eq!(HexStyle::INITIAL.hovered().fill_opacity, HOVER_OPACITY);
        assert_eq!(HexStyle::HIGHLIGHT.hovered(), HexStyle::HIGHLIGHT);
        assert_eq!(HexStyle::INITIAL.hovered().fill, INITIAL_FILL);
    }
}
