use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// URL path of the hexagon geometry resource.
pub const GEOMETRY_PATH: &str = "/nyc_hexes.topojson";
/// URL prefix under which per-hexagon distance tables are served.
pub const DISTANCE_TABLE_PREFIX: &str = "/json/";

/// 1-based position of a hexagon in the geometry sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct HexId(u32);

impl HexId {
    pub const fn new(id: u32) -> Option<Self> {
        if id == 0 { None } else { Some(Self(id)) }
    }

    /// Id of the hexagon stored at `index` (0-based).
    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).map_or(u32::MAX, |i| i.saturating_add(1)))
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// 0-based position in the geometry sequence.
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Ids `1..=count`, in sequence order.
    pub fn range(count: usize) -> impl Iterator<Item = HexId> {
        (0..count).map(Self::from_index)
    }
}

impl fmt::Display for HexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for HexId {
    type Error = DistanceTableError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| DistanceTableError::InvalidKey(raw.to_string()))
    }
}

impl From<HexId> for u32 {
    fn from(id: HexId) -> Self {
        id.0
    }
}

impl std::str::FromStr for HexId {
    type Err = DistanceTableError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| DistanceTableError::InvalidKey(raw.to_string()))
    }
}

/// Path of the distance table fetched when hexagon `id` is clicked.
pub fn distance_table_path(id: HexId) -> String {
    format!("{DISTANCE_TABLE_PREFIX}{id}.json")
}

/// Parse a distance table file name such as `42.json`.
pub fn parse_distance_file_name(name: &str) -> Option<HexId> {
    name.strip_suffix(".json")?.parse().ok()
}

#[derive(Debug, thiserror::Error)]
pub enum DistanceTableError {
    #[error("malformed distance table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("distance table must be a JSON object")]
    NotAnObject,
    #[error("invalid hexagon id {0:?}")]
    InvalidKey(String),
    #[error("distance for hexagon {0} is not a number")]
    InvalidValue(HexId),
}

/// Travel time in minutes from one hexagon to every other hexagon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceTable {
    minutes: HashMap<HexId, f64>,
}

impl DistanceTable {
    /// Decode `{"1": 5, "2": 45.5, "3": null}`. `null` entries count as missing.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, DistanceTableError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> Result<Self, DistanceTableError> {
        let Value::Object(entries) = value else {
            return Err(DistanceTableError::NotAnObject);
        };

        let mut minutes = HashMap::with_capacity(entries.len());
        for (key, value) in entries {
            let id: HexId = key.parse()?;
            match value {
                Value::Null => {}
                Value::Number(number) => {
                    let Some(distance) = number.as_f64() else {
                        return Err(DistanceTableError::InvalidValue(id));
                    };
                    minutes.insert(id, distance);
                }
                _ => return Err(DistanceTableError::InvalidValue(id)),
            }
        }
        Ok(Self { minutes })
    }

    pub fn get(&self, id: HexId) -> Option<f64> {
        self.minutes.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.minutes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
    }

    /// Ids in `1..=hex_count` without an entry, ascending.
    pub fn missing_ids(&self, hex_count: usize) -> Vec<HexId> {
        HexId::range(hex_count)
            .filter(|id| !self.minutes.contains_key(id))
            .collect()
    }
}

impl FromIterator<(HexId, f64)> for DistanceTable {
    fn from_iter<I: IntoIterator<Item = (HexId, f64)>>(iter: I) -> Self {
        Self {
            minutes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> HexId {
        HexId::new(raw).expect("non-zero id")
    }

    #[test]
    fn hex_id_is_one_based() {
        assert_eq!(HexId::new(0), None);
        assert_eq!(HexId::from_index(0), id(1));
        assert_eq!(id(7).index(), 6);
        assert_eq!(HexId::range(3).collect::<Vec<_>>(), vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn hex_id_serde_rejects_zero() {
        assert_eq!(serde_json::from_str::<HexId>("7").expect("id 7"), id(7));
        assert!(serde_json::from_str::<HexId>("0").is_err());
        assert_eq!(serde_json::to_string(&id(7)).expect("serialize"), "7");
    }

    #[test]
    fn resource_paths_use_the_hexagon_id() {
        assert_eq!(distance_table_path(id(12)), "/json/12.json");
        assert_eq!(parse_distance_file_name("12.json"), Some(id(12)));
        assert_eq!(parse_distance_file_name("0.json"), None);
        assert_eq!(parse_distance_file_name("abc.json"), None);
        assert_eq!(parse_distance_file_name("12.txt"), None);
    }

    #[test]
    fn decodes_numbers_and_treats_null_as_missing() {
        let table = DistanceTable::from_json_slice(br#"{"1": 5, "2": 45.5, "3": null}"#)
            .expect("table should decode");
        assert_eq!(table.get(id(1)), Some(5.0));
        assert_eq!(table.get(id(2)), Some(45.5));
        assert_eq!(table.get(id(3)), None);
        assert_eq!(table.len(), 2);
        assert_eq!(table.missing_ids(4), vec![id(3), id(4)]);
    }

    #[test]
    fn rejects_bad_keys_and_values() {
        assert!(matches!(
            DistanceTable::from_json_slice(br#"{"0": 1}"#),
            Err(DistanceTableError::InvalidKey(_))
        ));
        assert!(matches!(
            DistanceTable::from_json_slice(br#"{"one": 1}"#),
            Err(DistanceTableError::InvalidKey(_))
        ));
        assert!(matches!(
            DistanceTable::from_json_slice(br#"{"1": "5"}"#),
            Err(DistanceTableError::InvalidValue(_))
        ));
        assert!(matches!(
            DistanceTable::from_json_slice(b"[1, 2]"),
            Err(DistanceTableError::NotAnObject)
        ));
        assert!(matches!(
            DistanceTable::from_json_slice(b"{"),
            Err(DistanceTableError::Json(_))
        ));
    }
}
