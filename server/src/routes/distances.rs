use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use hexmap_shared::distance::parse_distance_file_name;
use tracing::{debug, warn};

use crate::config::DISTANCE_CACHE_CONTROL;
use crate::routes::api::json_bytes_response;
use crate::state::AppState;

/// `GET /json/{id}.json`: the distance table of one hexagon, read from disk on
/// every request so updated data files are picked up without a restart.
pub async fn get_distance_table(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Response {
    state.observability.record_distance_request();

    let Some(id) = parse_distance_file_name(&file) else {
        state.observability.record_distance_bad_request();
        return StatusCode::BAD_REQUEST.into_response();
    };
    if !state.catalog.contains(id) {
        state.observability.record_distance_not_found();
        return StatusCode::NOT_FOUND.into_response();
    }

    let path = state.catalog.distance_table_path(id);
    match tokio::fs::read(&path).await {
        Ok(raw) => json_bytes_response(Bytes::from(raw), DISTANCE_CACHE_CONTROL),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(hex = %id, path = %path.display(), "distance table missing");
            state.observability.record_distance_not_found();
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            warn!(hex = %id, path = %path.display(), error = %e, "failed to read distance table");
            state.observability.record_distance_read_error();
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use crate::catalog::Catalog;
    use crate::catalog::test_support::Fixture;
    use crate::state::AppState;

    async fn get(fixture: &Fixture, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let catalog = Catalog::load(fixture.path(), "nyc_hexes.topojson")
            .await
            .expect("catalog should load");
        let app = crate::app::build_app(AppState::new(catalog, fixture.path().join("dist")));
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router is infallible");
        let status = response.status();
        let cache_control = response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, cache_control, body.to_vec())
    }

    #[tokio::test]
    async fn serves_existing_table_uncached() {
        let fixture = Fixture::new();
        let (status, cache_control, body) = get(&fixture, "/json/1.json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control.as_deref(), Some("no-cache"));
        let table = hexmap_shared::DistanceTable::from_json_slice(&body).expect("table body");
        assert_eq!(table.len(), 3);
    }

    #[tokio::test]
    async fn rejects_malformed_file_names() {
        let fixture = Fixture::new();
        for uri in ["/json/0.json", "/json/abc.json", "/json/1.txt", "/json/-1.json"] {
            let (status, _, _) = get(&fixture, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn unknown_hexagon_or_missing_file_is_not_found() {
        let fixture = Fixture::new();
        let (beyond_grid, _, _) = get(&fixture, "/json/4.json").await;
        assert_eq!(beyond_grid, StatusCode::NOT_FOUND);

        let (missing_file, _, _) = get(&fixture, "/json/3.json").await;
        assert_eq!(missing_file, StatusCode::NOT_FOUND);
    }
}
