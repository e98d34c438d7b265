use std::fmt::Write as _;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::config::GEOMETRY_CACHE_CONTROL;
use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
const GEOMETRY_CONTENT_TYPE: &str = "application/json";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let catalog = &state.catalog;
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "hexagons": catalog.hex_count(),
        "data_dir": catalog.data_dir().display().to_string(),
        "bounds": catalog.bounds().map(|b| [b.min_x, b.min_y, b.max_x, b.max_y]),
        "started_at": state.started_at.to_rfc3339(),
        "observability": {
            "geometry_requests_total": observability.geometry_requests_total,
            "geometry_not_modified_total": observability.geometry_not_modified_total,
            "distance_requests_total": observability.distance_requests_total,
            "distance_not_found_total": observability.distance_not_found_total,
            "distance_bad_requests_total": observability.distance_bad_requests_total,
            "distance_read_errors_total": observability.distance_read_errors_total,
        }
    }))
}

/// Serve the geometry loaded at startup. It never changes while the process runs.
pub async fn get_geometry(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.observability.record_geometry_request();
    let body = state.catalog.geometry_json();
    let etag = geometry_etag(state.catalog.hex_count(), state.catalog.geometry_checksum());

    if if_none_match_matches(&headers, &etag) {
        state.observability.record_geometry_not_modified();
        let mut response = StatusCode::NOT_MODIFIED.into_response();
        insert_cache_headers(response.headers_mut(), GEOMETRY_CACHE_CONTROL, &etag);
        return response;
    }

    let mut response = Response::new(Body::from(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(GEOMETRY_CONTENT_TYPE),
    );
    insert_cache_headers(response.headers_mut(), GEOMETRY_CACHE_CONTROL, &etag);
    response
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus_metrics(
        state.catalog.hex_count(),
        state.started_at.timestamp(),
        state.observability.snapshot(),
    );

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn write_metric(body: &mut String, name: &str, kind: &str, help: &str, value: u64) {
    let _ = writeln!(body, "# HELP {name} {help}");
    let _ = writeln!(body, "# TYPE {name} {kind}");
    let _ = writeln!(body, "{name} {value}");
}

fn render_prometheus_metrics(
    hex_count: usize,
    started_at_secs: i64,
    observability: ObservabilitySnapshot,
) -> String {
    let mut body = String::new();
    write_metric(
        &mut body,
        "hexmap_hexagons",
        "gauge",
        "Number of hexagons in the loaded geometry.",
        hex_count as u64,
    );
    write_metric(
        &mut body,
        "hexmap_start_time_seconds",
        "gauge",
        "Unix time the server started.",
        started_at_secs.max(0) as u64,
    );
    write_metric(
        &mut body,
        "hexmap_geometry_requests_total",
        "counter",
        "Total geometry requests.",
        observability.geometry_requests_total,
    );
    write_metric(
        &mut body,
        "hexmap_geometry_not_modified_total",
        "counter",
        "Geometry requests answered with 304.",
        observability.geometry_not_modified_total,
    );
    write_metric(
        &mut body,
        "hexmap_distance_requests_total",
        "counter",
        "Total distance table requests.",
        observability.distance_requests_total,
    );
    write_metric(
        &mut body,
        "hexmap_distance_not_found_total",
        "counter",
        "Distance table requests for unknown hexagons or missing files.",
        observability.distance_not_found_total,
    );
    write_metric(
        &mut body,
        "hexmap_distance_bad_requests_total",
        "counter",
        "Distance table requests with an invalid file name.",
        observability.distance_bad_requests_total,
    );
    write_metric(
        &mut body,
        "hexmap_distance_read_errors_total",
        "counter",
        "Distance tables that exist but could not be read.",
        observability.distance_read_errors_total,
    );
    body
}

fn geometry_etag(hex_count: usize, checksum: u32) -> String {
    format!("\"geometry-{hex_count}-{checksum:08x}\"")
}

fn insert_cache_headers(headers: &mut HeaderMap, cache_control: &'static str, etag: &str) {
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Ok(etag_header) = HeaderValue::from_str(etag) {
        headers.insert(header::ETAG, etag_header);
    }
}

fn normalize_etag(candidate: &str) -> &str {
    candidate.strip_prefix("W/").unwrap_or(candidate).trim()
}

fn if_none_match_matches(headers: &HeaderMap, etag: &str) -> bool {
    let Some(value) = headers.get(header::IF_NONE_MATCH) else {
        return false;
    };
    let Ok(raw) = value.to_str() else {
        return false;
    };

    raw.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == "*" || normalize_etag(candidate) == normalize_etag(etag)
    })
}

pub(crate) fn json_bytes_response(body: Bytes, cache_control: &'static str) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    response
}
