use hexmap_shared::distance::GEOMETRY_PATH;
use hexmap_shared::{Bounds, HexId, HexagonSet, Topology};

use crate::projection::project;
use crate::spatial::SpatialGrid;

type WorldRing = Vec<(f64, f64)>;

/// One hexagon's outline in world coordinates, ready to be traced on a canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct HexPath {
    pub id: HexId,
    /// Polygons, each an exterior ring followed by holes.
    pub polygons: Vec<Vec<WorldRing>>,
    pub bounds: Option<Bounds>,
}

impl HexPath {
    pub fn new(id: HexId, polygons: Vec<Vec<WorldRing>>) -> Self {
        let mut points = polygons.iter().flatten().flatten();
        let bounds = points.next().map(|&(x, y)| {
            let mut b = Bounds::point(x, y);
            for &(px, py) in points {
                b.include(px, py);
            }
            b
        });
        Self {
            id,
            polygons,
            bounds,
        }
    }

    pub fn rings(&self) -> impl Iterator<Item = &WorldRing> {
        self.polygons.iter().flatten()
    }

    /// Even-odd test per polygon, so holes are excluded.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if !self.bounds.is_some_and(|b| b.contains(x, y)) {
            return false;
        }
        self.polygons.iter().any(|rings| {
            rings
                .iter()
                .filter(|ring| ring_contains(ring, x, y))
                .count()
                % 2
                == 1
        })
    }
}

fn ring_contains(ring: &[(f64, f64)], x: f64, y: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let ((xi, yi), (xj, yj)) = (ring[i], ring[j]);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Projected outlines plus the hit-test index. Built once after the geometry loads.
pub struct MapGeometry {
    paths: Vec<HexPath>,
    index: SpatialGrid,
}

impl MapGeometry {
    pub fn project(hexagons: &HexagonSet) -> Self {
        let paths: Vec<HexPath> = hexagons
            .iter()
            .map(|hex| {
                let polygons = hex
                    .geometry()
                    .polygons
                    .iter()
                    .map(|rings| {
                        rings
                            .iter()
                            .map(|ring| ring.iter().map(|&p| project(p)).collect())
                            .collect()
                    })
                    .collect();
                HexPath::new(hex.id(), polygons)
            })
            .collect();
        let index = SpatialGrid::build(&paths);
        Self { paths, index }
    }

    pub fn paths(&self) -> &[HexPath] {
        &self.paths
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.index.world_bounds()
    }

    pub fn hit_test(&self, wx: f64, wy: f64) -> Option<HexId> {
        self.index.find_at(&self.paths, wx, wy)
    }
}

/// Fetch and decode the hexagon grid. Every cell starts with the initial style.
pub async fn fetch_hexagons() -> Result<HexagonSet, String> {
    let resp = gloo_net::http::Request::get(GEOMETRY_PATH)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    let bytes = resp
        .binary()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;
    let geometries = Topology::from_slice(&bytes)
        .and_then(|topology| topology.decode_first_object())
        .map_err(|e| format!("parse error: {e}"))?;
    Ok(HexagonSet::from_geometries(geometries))
}
