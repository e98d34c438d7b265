use std::path::{Path, PathBuf};

use bytes::Bytes;
use hexmap_shared::{Bounds, DistanceTable, HexId, HexagonSet, Topology, TopologyError};
use tracing::{debug, warn};

use crate::config::DISTANCE_TABLE_DIR;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: TopologyError,
    },
}

/// The geometry resource, read and validated once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    data_dir: PathBuf,
    geometry_path: PathBuf,
    geometry_json: Bytes,
    geometry_checksum: u32,
    hex_count: usize,
    bounds: Option<Bounds>,
}

impl Catalog {
    pub async fn load(data_dir: &Path, geometry_file: &str) -> Result<Self, CatalogError> {
        let geometry_path = data_dir.join(geometry_file);
        let raw = tokio::fs::read(&geometry_path)
            .await
            .map_err(|source| CatalogError::Read {
                path: geometry_path.clone(),
                source,
            })?;
        let features = Topology::from_slice(&raw)
            .and_then(|topology| topology.decode_first_object())
            .map_err(|source| CatalogError::Decode {
                path: geometry_path.clone(),
                source,
            })?;
        let hexagons = HexagonSet::from_geometries(features);

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            geometry_path,
            geometry_checksum: crc32fast::hash(&raw),
            geometry_json: Bytes::from(raw),
            hex_count: hexagons.len(),
            bounds: hexagons.bounds(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn geometry_path(&self) -> &Path {
        &self.geometry_path
    }

    pub fn geometry_json(&self) -> Bytes {
        self.geometry_json.clone()
    }

    /// CRC-32 of the geometry file as loaded.
    pub fn geometry_checksum(&self) -> u32 {
        self.geometry_checksum
    }

    pub fn hex_count(&self) -> usize {
        self.hex_count
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn contains(&self, id: HexId) -> bool {
        id.index() < self.hex_count
    }

    pub fn distance_table_path(&self, id: HexId) -> PathBuf {
        self.data_dir
            .join(DISTANCE_TABLE_DIR)
            .join(format!("{id}.json"))
    }
}

/// Startup check of the distance tables against the geometry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub present: usize,
    pub missing_files: Vec<HexId>,
    pub malformed: Vec<HexId>,
    /// Tables that lack an entry for at least one hexagon.
    pub incomplete: Vec<HexId>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.missing_files.is_empty() && self.malformed.is_empty() && self.incomplete.is_empty()
    }
}

/// Check that every hexagon has a distance table. With `read_tables`, each table
/// is also decoded and checked for coverage of the whole grid.
pub async fn audit_distance_tables(catalog: &Catalog, read_tables: bool) -> AuditReport {
    let mut report = AuditReport::default();

    for id in HexId::range(catalog.hex_count()) {
        let path = catalog.distance_table_path(id);
        if !read_tables {
            match tokio::fs::try_exists(&path).await {
                Ok(true) => report.present += 1,
                _ => report.missing_files.push(id),
            }
            continue;
        }

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(hex = %id, path = %path.display(), error = %e, "distance table unreadable");
                report.missing_files.push(id);
                continue;
            }
        };
        report.present += 1;
        match DistanceTable::from_json_slice(&raw) {
            Ok(table) => {
                let missing = table.missing_ids(catalog.hex_count());
                if !missing.is_empty() {
                    debug!(hex = %id, missing = missing.len(), "distance table is incomplete");
                    report.incomplete.push(id);
                }
            }
            Err(e) => {
                warn!(hex = %id, path = %path.display(), error = %e, "malformed distance table");
                report.malformed.push(id);
            }
        }
    }

    report
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Three adjacent squares standing in for hexagons.
    pub const TOPOLOGY: &str = r#"{
        "type": "Topology",
        "objects": {"hexes": {"type": "GeometryCollection", "geometries": [
            {"type": "Polygon", "arcs": [[0]]},
            {"type": "Polygon", "arcs": [[1]]},
            {"type": "Polygon", "arcs": [[2]]}
        ]}},
        "arcs": [
            [[-74.0, 40.7], [-73.99, 40.7], [-73.99, 40.71], [-74.0, 40.71], [-74.0, 40.7]],
            [[-73.99, 40.7], [-73.98, 40.7], [-73.98, 40.71], [-73.99, 40.71], [-73.99, 40.7]],
            [[-73.98, 40.7], [-73.97, 40.7], [-73.97, 40.71], [-73.98, 40.71], [-73.98, 40.7]]
        ]
    }"#;

    static NEXT_FIXTURE: AtomicU64 = AtomicU64::new(0);

    /// Temporary data directory, removed on drop.
    pub struct Fixture {
        pub dir: PathBuf,
    }

    impl Fixture {
        /// Geometry with three hexagons, a complete table for 1, an incomplete
        /// table for 2 and no table for 3.
        pub fn new() -> Self {
            let dir = std::env::temp_dir().join(format!(
                "hexmap-server-test-{}-{}",
                std::process::id(),
                NEXT_FIXTURE.fetch_add(1, Ordering::Relaxed)
            ));
            std::fs::create_dir_all(dir.join("json")).expect("create fixture dir");
            std::fs::write(dir.join("nyc_hexes.topojson"), TOPOLOGY).expect("write topology");
            std::fs::write(dir.join("json/1.json"), r#"{"1": 0, "2": 12.5, "3": 95}"#)
                .expect("write table 1");
            std::fs::write(dir.join("json/2.json"), r#"{"1": 12.5, "2": 0}"#)
                .expect("write table 2");
            Self { dir }
        }

        pub fn path(&self) -> &Path {
            &self.dir
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::Fixture;
    use super::*;

    fn id(raw: u32) -> HexId {
        HexId::new(raw).expect("non-zero id")
    }

    #[tokio::test]
    async fn load_counts_hexagons_and_keeps_raw_geometry() {
        let fixture = Fixture::new();
        let catalog = Catalog::load(fixture.path(), "nyc_hexes.topojson")
            .await
            .expect("catalog should load");

        assert_eq!(catalog.hex_count(), 3);
        assert!(catalog.contains(id(3)));
        assert!(!catalog.contains(id(4)));
        assert_eq!(catalog.geometry_json().len(), test_support::TOPOLOGY.len());
        let bounds = catalog.bounds().expect("bounds");
        assert_eq!(bounds.min_x, -74.0);
        assert_eq!(bounds.max_x, -73.97);
        assert_eq!(
            catalog.distance_table_path(id(2)),
            fixture.path().join("json").join("2.json")
        );
    }

    #[tokio::test]
    async fn load_reports_missing_and_malformed_geometry() {
        let fixture = Fixture::new();
        let missing = Catalog::load(fixture.path(), "absent.topojson").await;
        assert!(matches!(missing, Err(CatalogError::Read { .. })));

        std::fs::write(fixture.path().join("bad.topojson"), b"{\"type\": \"Feature\"}")
            .expect("write bad geometry");
        let malformed = Catalog::load(fixture.path(), "bad.topojson").await;
        assert!(matches!(malformed, Err(CatalogError::Decode { .. })));
    }

    #[tokio::test]
    async fn presence_audit_lists_missing_files() {
        let fixture = Fixture::new();
        let catalog = Catalog::load(fixture.path(), "nyc_hexes.topojson")
            .await
            .expect("catalog");

        let report = audit_distance_tables(&catalog, false).await;
        assert_eq!(report.present, 2);
        assert_eq!(report.missing_files, vec![id(3)]);
        assert!(report.incomplete.is_empty());
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn full_audit_flags_incomplete_and_malformed_tables() {
        let fixture = Fixture::new();
        std::fs::write(fixture.path().join("json/3.json"), b"[]").expect("write table 3");
        let catalog = Catalog::load(fixture.path(), "nyc_hexes.topojson")
            .await
            .expect("catalog");

        let report = audit_distance_tables(&catalog, true).await;
        assert_eq!(report.present, 3);
        assert!(report.missing_files.is_empty());
        assert_eq!(report.incomplete, vec![id(2)]);
        assert_eq!(report.malformed, vec![id(3)]);
    }
}
