//! TopoJSON decoding into the ordered polygon list the map is built from.
//!
//! Only what a polygon grid needs is supported: Polygon and MultiPolygon
//! geometries, nested collections, null geometries and the optional
//! quantization transform.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::hexagon::{HexGeometry, LonLat, Ring};

#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("malformed topology: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a Topology, found {0:?}")]
    NotATopology(String),
    #[error("topology has no objects")]
    NoObjects,
    #[error("arc index {0} is out of range")]
    ArcOutOfRange(i64),
    #[error("arc position has fewer than two coordinates")]
    ShortPosition,
    #[error("unsupported geometry type {0:?}")]
    UnsupportedGeometry(String),
    #[error("{0} geometry is missing its {1:?} member")]
    MissingMember(&'static str, &'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    objects: Map<String, Value>,
}

impl Topology {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TopologyError> {
        let topology: Topology = serde_json::from_slice(bytes)?;
        if topology.kind != "Topology" {
            return Err(TopologyError::NotATopology(topology.kind));
        }
        Ok(topology)
    }

    /// Decode the first object in document order into one geometry per feature.
    pub fn decode_first_object(&self) -> Result<Vec<HexGeometry>, TopologyError> {
        let object = self.objects.values().next().ok_or(TopologyError::NoObjects)?;
        self.decode(object)
    }

    fn decode(&self, object: &Value) -> Result<Vec<HexGeometry>, TopologyError> {
        let arcs = self.absolute_arcs()?;
        let mut features = Vec::new();
        collect_features(&arcs, object, &mut features)?;
        Ok(features)
    }

    /// Arcs in absolute coordinates. Quantized arcs are delta-encoded.
    fn absolute_arcs(&self) -> Result<Vec<Vec<LonLat>>, TopologyError> {
        self.arcs
            .iter()
            .map(|arc| {
                let (mut x, mut y) = (0.0, 0.0);
                arc.iter()
                    .map(|position| {
                        let [px, py] = match position.as_slice() {
                            [px, py, ..] => [*px, *py],
                            _ => return Err(TopologyError::ShortPosition),
                        };
                        Ok(match self.transform {
                            Some(t) => {
                                x += px;
                                y += py;
                                LonLat::new(
                                    x * t.scale[0] + t.translate[0],
                                    y * t.scale[1] + t.translate[1],
                                )
                            }
                            None => LonLat::new(px, py),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect()
    }
}

/// Flatten a geometry (or collection) into features, preserving order.
fn collect_features(
    arcs: &[Vec<LonLat>],
    geometry: &Value,
    out: &mut Vec<HexGeometry>,
) -> Result<(), TopologyError> {
    let kind = match geometry.get("type") {
        None | Some(Value::Null) => {
            out.push(HexGeometry::default());
            return Ok(());
        }
        Some(Value::String(kind)) => kind.as_str(),
        Some(other) => return Err(TopologyError::UnsupportedGeometry(other.to_string())),
    };

    match kind {
        "GeometryCollection" => {
            let members = geometry
                .get("geometries")
                .and_then(Value::as_array)
                .ok_or(TopologyError::MissingMember("GeometryCollection", "geometries"))?;
            for member in members {
                collect_features(arcs, member, out)?;
            }
        }
        "Polygon" => {
            let refs: Vec<Vec<i64>> = arc_refs(geometry, "Polygon")?;
            out.push(HexGeometry {
                polygons: vec![polygon(arcs, &refs)?],
            });
        }
        "MultiPolygon" => {
            let refs: Vec<Vec<Vec<i64>>> = arc_refs(geometry, "MultiPolygon")?;
            let polygons = refs
                .iter()
                .map(|rings| polygon(arcs, rings))
                .collect::<Result<_, _>>()?;
            out.push(HexGeometry { polygons });
        }
        other => return Err(TopologyError::UnsupportedGeometry(other.to_string())),
    }
    Ok(())
}

fn arc_refs<T: serde::de::DeserializeOwned>(
    geometry: &Value,
    kind: &'static str,
) -> Result<T, TopologyError> {
    let raw = geometry
        .get("arcs")
        .ok_or(TopologyError::MissingMember(kind, "arcs"))?;
    Ok(T::deserialize(raw)?)
}

fn polygon(arcs: &[Vec<LonLat>], rings: &[Vec<i64>]) -> Result<Vec<Ring>, TopologyError> {
    rings.iter().map(|refs| stitch(arcs, refs)).collect()
}

/// Join arcs end to end. `~i` refers to arc `i` reversed; the shared joint
/// point between consecutive arcs is kept once.
fn stitch(arcs: &[Vec<LonLat>], refs: &[i64]) -> Result<Ring, TopologyError> {
    let mut ring: Ring = Vec::new();
    for &index in refs {
        let (arc_index, reversed) = if index < 0 { (!index, true) } else { (index, false) };
        let arc = usize::try_from(arc_index)
            .ok()
            .and_then(|i| arcs.get(i))
            .ok_or(TopologyError::ArcOutOfRange(index))?;
        ring.pop();
        if reversed {
            ring.extend(arc.iter().rev());
        } else {
            ring.extend(arc.iter());
        }
    }
    Ok(ring)
}
