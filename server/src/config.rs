use std::path::PathBuf;

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_DIST_DIR: &str = "client/dist";
pub const DEFAULT_GEOMETRY_FILE: &str = "nyc_hexes.topojson";
/// Subdirectory of the data dir holding `{id}.json` distance tables.
pub const DISTANCE_TABLE_DIR: &str = "json";

pub const GEOMETRY_CACHE_CONTROL: &str = "public, max-age=3600";
pub const DISTANCE_CACHE_CONTROL: &str = "no-cache";

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn server_port() -> u16 {
    non_empty_var("HEXMAP_PORT")
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn data_dir() -> PathBuf {
    non_empty_var("HEXMAP_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn dist_dir() -> PathBuf {
    non_empty_var("HEXMAP_DIST_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DIST_DIR))
}

pub fn geometry_file() -> String {
    non_empty_var("HEXMAP_GEOMETRY_FILE").unwrap_or_else(|| DEFAULT_GEOMETRY_FILE.to_string())
}

/// Read and check every distance table at startup instead of only checking presence.
pub fn audit_tables_enabled() -> bool {
    non_empty_var("HEXMAP_AUDIT_TABLES")
        .map(|value| {
            let normalized = value.to_ascii_lowercase();
            matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        temp_env::with_vars_unset(
            [
                "HEXMAP_PORT",
                "HEXMAP_DATA_DIR",
                "HEXMAP_DIST_DIR",
                "HEXMAP_GEOMETRY_FILE",
                "HEXMAP_AUDIT_TABLES",
            ],
            || {
                assert_eq!(server_port(), DEFAULT_SERVER_PORT);
                assert_eq!(data_dir(), PathBuf::from(DEFAULT_DATA_DIR));
                assert_eq!(dist_dir(), PathBuf::from(DEFAULT_DIST_DIR));
                assert_eq!(geometry_file(), DEFAULT_GEOMETRY_FILE);
                assert!(!audit_tables_enabled());
            },
        );
    }

    #[test]
    fn invalid_port_falls_back_to_default() {
        temp_env::with_var("HEXMAP_PORT", Some("0"), || {
            assert_eq!(server_port(), DEFAULT_SERVER_PORT);
        });
        temp_env::with_var("HEXMAP_PORT", Some("not-a-port"), || {
            assert_eq!(server_port(), DEFAULT_SERVER_PORT);
        });
        temp_env::with_var("HEXMAP_PORT", Some(" 8080 "), || {
            assert_eq!(server_port(), 8080);
        });
    }

    #[test]
    fn paths_and_flags_read_from_env() {
        temp_env::with_vars(
            [
                ("HEXMAP_DATA_DIR", Some("/srv/hexmap")),
                ("HEXMAP_GEOMETRY_FILE", Some("grid.topojson")),
                ("HEXMAP_AUDIT_TABLES", Some("Yes")),
            ],
            || {
                assert_eq!(data_dir(), PathBuf::from("/srv/hexmap"));
                assert_eq!(geometry_file(), "grid.topojson");
                assert!(audit_tables_enabled());
            },
        );
        temp_env::with_var("HEXMAP_DATA_DIR", Some("   "), || {
            assert_eq!(data_dir(), PathBuf::from(DEFAULT_DATA_DIR));
        });
    }
}
