use hexmap_shared::distance::distance_table_path;
use hexmap_shared::{DistanceTable, FetchSequence, HexId, HexagonSet, recolor};
use leptos::prelude::*;

use crate::app::{ActiveTable, MapStatus};

/// Fetch the travel-time table of one hexagon. Never cached: every click refetches.
pub async fn fetch_distance_table(id: HexId) -> Result<DistanceTable, String> {
    let resp = gloo_net::http::Request::get(&distance_table_path(id))
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
    DistanceTable::from_json_slice(&bytes).map_err(|e| format!("parse error: {e}"))
}

/// Signals a click on a hexagon reads and writes.
#[derive(Clone, Copy)]
pub struct SelectionInput {
    pub hexagons: RwSignal<HexagonSet>,
    pub active_table: RwSignal<Option<ActiveTable>>,
    pub status: RwSignal<MapStatus>,
    pub sequence: StoredValue<FetchSequence>,
}

/// Load the clicked hexagon's table and recolor the whole grid from it.
///
/// Only the most recent click applies its result. A failed fetch leaves every
/// style as it was.
pub fn select_hexagon(input: SelectionInput, id: HexId) {
    let SelectionInput {
        hexagons,
        active_table,
        status,
        sequence,
    } = input;

    let mut seq = sequence.get_value();
    let ticket = seq.begin();
    sequence.set_value(seq);
    status.set(MapStatus::Fetching(id));

    wasm_bindgen_futures::spawn_local(async move {
        let result = fetch_distance_table(id).await;
        if !sequence.get_value().is_current(ticket) {
            return;
        }

        match result {
            Ok(table) => {
                let mut summary = None;
                hexagons.update(|set| summary = Some(recolor(id, &table, set)));
                let Some(summary) = summary else {
                    return;
                };
                if summary.missing > 0 {
                    web_sys::console::warn_1(
                        &format!(
                            "Distance table for hexagon {id} has no data for {} of {} hexagons",
                            summary.missing,
                            summary.missing + summary.classified
                        )
                        .into(),
                    );
                }
                active_table.set(Some(ActiveTable { trigger: id, table }));
                status.set(MapStatus::Applied {
                    trigger: id,
                    summary,
                });
            }
            Err(error) => {
                web_sys::console::error_1(
                    &format!("Failed to load distances for hexagon {id}: {error}").into(),
                );
                status.set(MapStatus::FetchFailed { trigger: id, error });
            }
        }
    });
}

/// Back to the initial blue grid. Pending requests are abandoned.
pub fn clear_selection(input: SelectionInput) {
    let mut seq = input.sequence.get_value();
    seq.cancel_all();
    input.sequence.set_value(seq);
    input.hexagons.update(HexagonSet::reset_styles);
    input.active_table.set(None);
    input.status.set(MapStatus::Ready);
}
