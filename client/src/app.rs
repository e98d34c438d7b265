use std::cell::RefCell;
use std::sync::Arc;

use hexmap_shared::{
    DistanceCategory, DistanceTable, FetchSequence, HexId, HexagonSet, RecolorSummary,
    describe_minutes,
};
use leptos::prelude::*;
use gloo_storage::Storage as _;
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsCast;

use crate::canvas::MapCanvas;
use crate::distances::{SelectionInput, clear_selection};
use crate::geometry::{MapGeometry, fetch_hexagons};
use crate::projection::{NYC_CENTER, NYC_ZOOM, project};
use crate::tiles::ATTRIBUTION;
use crate::viewport::Viewport;

const SETTINGS_KEY: &str = "hexmap_settings";

pub(crate) fn canvas_dimensions() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h)
}

struct KeydownBinding {
    window: web_sys::Window,
    _handler: wasm_bindgen::closure::Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

thread_local! {
    static KEYDOWN_BINDING: RefCell<Option<KeydownBinding>> = const { RefCell::new(None) };
}

/// Which background the hexagons are drawn over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum MapView {
    /// OpenStreetMap tiles, starting over New York City.
    #[default]
    Tiles,
    /// Hexagons alone, fitted to the grid's extent.
    Vector,
}

impl MapView {
    fn toggled(self) -> Self {
        match self {
            MapView::Tiles => MapView::Vector,
            MapView::Vector => MapView::Tiles,
        }
    }

    fn label(self) -> &'static str {
        match self {
            MapView::Tiles => "Map",
            MapView::Vector => "Hexagons only",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct Settings {
    view: MapView,
    show_legend: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            view: MapView::Tiles,
            show_legend: true,
        }
    }
}

/// What the map is doing right now, shown in the status line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MapStatus {
    LoadingGeometry,
    GeometryFailed(String),
    Ready,
    Fetching(HexId),
    Applied {
        trigger: HexId,
        summary: RecolorSummary,
    },
    FetchFailed {
        trigger: HexId,
        error: String,
    },
}

impl MapStatus {
    fn message(&self) -> String {
        match self {
            MapStatus::LoadingGeometry => "Loading hexagons\u{2026}".to_string(),
            MapStatus::GeometryFailed(error) => format!("Could not load the hexagon grid: {error}"),
            MapStatus::Ready => "Click a hexagon to see travel times from it".to_string(),
            MapStatus::Fetching(id) => format!("Loading travel times from hexagon {id}\u{2026}"),
            MapStatus::Applied { trigger, summary } if summary.missing > 0 => format!(
                "Travel times from hexagon {trigger} ({} hexagons without data)",
                summary.missing
            ),
            MapStatus::Applied { trigger, .. } => format!("Travel times from hexagon {trigger}"),
            MapStatus::FetchFailed { trigger, error } => {
                format!("Could not load travel times from hexagon {trigger}: {error}")
            }
        }
    }

    fn is_error(&self) -> bool {
        matches!(
            self,
            MapStatus::GeometryFailed(_) | MapStatus::FetchFailed { .. }
        )
    }
}

/// The table behind the current coloring, kept for the tooltip until the next click.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ActiveTable {
    pub trigger: HexId,
    pub table: DistanceTable,
}

/// Newtype wrappers give same-typed signals distinct Leptos context slots.
#[derive(Clone, Copy)]
pub(crate) struct Hovered(pub RwSignal<Option<HexId>>);
#[derive(Clone, Copy)]
pub(crate) struct ShowLegend(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct CurrentView(pub RwSignal<MapView>);
#[derive(Clone, Copy)]
pub(crate) struct MapGeometryStore(pub RwSignal<Option<Arc<MapGeometry>>>);

#[component]
pub fn App() -> impl IntoView {
    let hexagons: RwSignal<HexagonSet> = RwSignal::new(HexagonSet::default());
    let geometry: RwSignal<Option<Arc<MapGeometry>>> = RwSignal::new(None);
    let viewport: RwSignal<Viewport> = RwSignal::new(Viewport::default());
    let hovered: RwSignal<Option<HexId>> = RwSignal::new(None);
    let mouse_pos: RwSignal<(f64, f64)> = RwSignal::new((0.0, 0.0));
    let active_table: RwSignal<Option<ActiveTable>> = RwSignal::new(None);
    let status: RwSignal<MapStatus> = RwSignal::new(MapStatus::LoadingGeometry);
    let sequence: StoredValue<FetchSequence> = StoredValue::new(FetchSequence::new());
    let saved: Settings = gloo_storage::LocalStorage::get(SETTINGS_KEY).unwrap_or_default();
    let map_view: RwSignal<MapView> = RwSignal::new(saved.view);
    let show_legend: RwSignal<bool> = RwSignal::new(saved.show_legend);

    let selection = SelectionInput {
        hexagons,
        active_table,
        status,
        sequence,
    };

    provide_context(hexagons);
    provide_context(viewport);
    provide_context(mouse_pos);
    provide_context(active_table);
    provide_context(status);
    provide_context(selection);
    provide_context(Hovered(hovered));
    provide_context(ShowLegend(show_legend));
    provide_context(CurrentView(map_view));
    provide_context(MapGeometryStore(geometry));

    Effect::new(move || {
        let settings = Settings {
            view: map_view.get(),
            show_legend: show_legend.get(),
        };
        let _ = gloo_storage::LocalStorage::set(SETTINGS_KEY, &settings);
    });

    // Geometry is fetched once; without it there is nothing to click.
    Effect::new(move || {
        if status.get_untracked() != MapStatus::LoadingGeometry {
            return;
        }
        wasm_bindgen_futures::spawn_local(async move {
            match fetch_hexagons().await {
                Ok(set) => {
                    let projected = MapGeometry::project(&set);
                    let empty = set.iter().filter(|hex| hex.geometry().is_empty()).count();
                    if empty > 0 {
                        web_sys::console::warn_1(
                            &format!("{empty} hexagons have no geometry").into(),
                        );
                    }
                    web_sys::console::info_1(&format!("Loaded {} hexagons", set.len()).into());
                    hexagons.set(set);
                    geometry.set(Some(Arc::new(projected)));
                    status.set(MapStatus::Ready);
                }
                Err(e) => {
                    web_sys::console::error_1(
                        &format!("Error loading the hexagon geometry: {e}").into(),
                    );
                    status.set(MapStatus::GeometryFailed(e));
                }
            }
        });
    });

    // Frame the map for the current view: the city in tile view, the grid extent otherwise.
    Effect::new(move || {
        let view = map_view.get();
        let bounds = geometry.with(|g| g.as_ref().and_then(|g| g.bounds()));
        let (cw, ch) = canvas_dimensions();
        viewport.update(|vp| match view {
            MapView::Tiles => {
                let (x, y) = project(NYC_CENTER);
                vp.center_on(x, y, NYC_ZOOM, cw, ch);
            }
            MapView::Vector => {
                if let Some(bounds) = bounds {
                    vp.fit_bounds(bounds, cw, ch);
                }
            }
        });
    });

    // Keyboard shortcuts
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };

        KEYDOWN_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "keydown",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });

        let handler = wasm_bindgen::closure::Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(
            move |e: web_sys::KeyboardEvent| match e.key().as_str() {
                "Escape" => {
                    hovered.set(None);
                    clear_selection(selection);
                }
                "v" => map_view.update(|v| *v = v.toggled()),
                "l" => show_legend.update(|v| *v = !*v),
                "+" | "=" => {
                    e.prevent_default();
                    let (cw, ch) = canvas_dimensions();
                    viewport.update(|vp| vp.zoom_at(-350.0, cw / 2.0, ch / 2.0));
                }
                "-" => {
                    e.prevent_default();
                    let (cw, ch) = canvas_dimensions();
                    viewport.update(|vp| vp.zoom_at(350.0, cw / 2.0, ch / 2.0));
                }
                _ => {}
            },
        );

        if window
            .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            KEYDOWN_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(KeydownBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    view! {
        <div style="width: 100%; height: 100%; position: relative; overflow: hidden; background: #f4f4f2; font-family: 'Inter', system-ui, sans-serif;">
            <MapCanvas />
            <Toolbar />
            {move || show_legend.get().then(|| view! { <Legend /> })}
            <StatusLine />
            {move || (map_view.get() == MapView::Tiles).then(|| view! {
                <div style="position: absolute; right: 0; bottom: 0; z-index: 10; padding: 2px 6px; background: rgba(255,255,255,0.8); font-size: 0.7rem; color: #333;">
                    {ATTRIBUTION}
                </div>
            })}
        </div>
        <Tooltip />
    }
}

/// View switch and legend toggle, top left.
#[component]
fn Toolbar() -> impl IntoView {
    let CurrentView(map_view) = expect_context();
    let ShowLegend(show_legend) = expect_context();

    let button_style = "padding: 5px 10px; background: #ffffff; border: 1px solid #b8b8b8; border-radius: 4px; cursor: pointer; font-size: 0.78rem; color: #222;";

    view! {
        <div style="position: absolute; top: 12px; left: 12px; z-index: 10; display: flex; gap: 6px;">
            <button
                style=button_style
                title="Switch between the street map and hexagons only (v)"
                on:click=move |_| map_view.update(|v| *v = v.toggled())
            >
                {move || format!("View: {}", map_view.get().label())}
            </button>
            <button
                style=button_style
                title="Show or hide the legend (l)"
                on:click=move |_| show_legend.update(|v| *v = !*v)
            >
                {move || if show_legend.get() { "Hide legend" } else { "Show legend" }}
            </button>
        </div>
    }
}

/// Color ranges, top right.
#[component]
fn Legend() -> impl IntoView {
    let rows = DistanceCategory::ALL
        .into_iter()
        .map(|category| {
            let swatch = format!(
                "display: inline-block; width: 18px; height: 18px; margin-right: 8px; opacity: 0.7; background: {};",
                category.hex()
            );
            view! {
                <div style="display: flex; align-items: center; margin: 3px 0;">
                    <span style=swatch />
                    <span>{category.label()}</span>
                </div>
            }
        })
        .collect_view();

    view! {
        <div style="position: absolute; top: 12px; right: 12px; z-index: 10; padding: 8px 12px; background: rgba(255,255,255,0.9); border-radius: 5px; box-shadow: 0 1px 5px rgba(0,0,0,0.4); font-size: 0.8rem; color: #222; line-height: 1.2;">
            <h4 style="margin: 0 0 6px 0; font-size: 0.85rem;">"Distance (minutes)"</h4>
            {rows}
        </div>
    }
}

#[component]
fn StatusLine() -> impl IntoView {
    let status: RwSignal<MapStatus> = expect_context();

    view! {
        <div
            style="position: absolute; left: 12px; bottom: 12px; z-index: 10; padding: 5px 10px; background: rgba(255,255,255,0.9); border-radius: 4px; font-size: 0.78rem; max-width: 60%;"
            style:color=move || if status.with(MapStatus::is_error) { "#b00020" } else { "#333" }
        >
            {move || status.with(MapStatus::message)}
        </div>
    }
}

/// Follows the cursor while it is over a hexagon.
#[component]
fn Tooltip() -> impl IntoView {
    let Hovered(hovered) = expect_context();
    let mouse_pos: RwSignal<(f64, f64)> = expect_context();
    let active_table: RwSignal<Option<ActiveTable>> = expect_context();

    let tooltip_info = Memo::new(move |_| {
        let id = hovered.get()?;
        let detail = active_table.with(|active| {
            active.as_ref().map(|active| {
                if active.trigger == id {
                    return "Selected hexagon".to_string();
                }
                match active.table.get(id) {
                    Some(minutes) => describe_minutes(minutes),
                    None => DistanceCategory::NoData.label().to_string(),
                }
            })
        });
        Some((id, detail))
    });

    view! {
        {move || {
            let Some((id, detail)) = tooltip_info.get() else {
                return view! { <div style="display:none;" /> }.into_any();
            };
            let (x, y) = mouse_pos.get();
            view! {
                <div
                    style:left=format!("{}px", x + 14.0)
                    style:top=format!("{}px", y - 10.0)
                    style="position: fixed; pointer-events: none; z-index: 100; padding: 5px 8px; background: #ffffff; border: 1px solid #b8b8b8; border-radius: 4px; box-shadow: 0 2px 8px rgba(0,0,0,0.25); font-size: 0.75rem; color: #222;"
                >
                    <div style="font-weight: 600;">{format!("Hexagon {id}")}</div>
                    {detail.map(|text| view! { <div style="color: #555; margin-top: 2px;">{text}</div> })}
                </div>
            }.into_any()
        }}
    }
}
