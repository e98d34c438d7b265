use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hexmap_shared::colors::rgba_css;
use hexmap_shared::hexagon::{STROKE_COLOR, STROKE_WIDTH};
use hexmap_shared::{HexId, HexagonSet};
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent, WheelEvent};

use crate::app::{CurrentView, Hovered, MapGeometryStore, MapView};
use crate::distances::{SelectionInput, select_hexagon};
use crate::geometry::MapGeometry;
use crate::render_loop::RenderScheduler;
use crate::tiles::{TileCache, visible_tiles};
use crate::viewport::Viewport;

/// Pointer travel (CSS px) below which a press-release counts as a click, not a drag.
const CLICK_SLOP_PX: f64 = 5.0;
const TILE_BACKGROUND: &str = "#f2efe9";

struct ResizeBinding {
    window: web_sys::Window,
    _handler: Closure<dyn Fn()>,
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

/// Canvas 2D map: optional OSM tiles underneath, hexagon polygons on top.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let hexagons: RwSignal<HexagonSet> = expect_context();
    let MapGeometryStore(geometry) = expect_context();
    let viewport: RwSignal<Viewport> = expect_context();
    let Hovered(hovered) = expect_context();
    let CurrentView(map_view) = expect_context();
    let mouse_pos: RwSignal<(f64, f64)> = expect_context();
    let selection: SelectionInput = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    // Drag state
    let is_dragging = Rc::new(Cell::new(false));
    let drag_start_x = Rc::new(Cell::new(0.0f64));
    let drag_start_y = Rc::new(Cell::new(0.0f64));
    let last_x = Rc::new(Cell::new(0.0f64));
    let last_y = Rc::new(Cell::new(0.0f64));
    let pinch_dist = Rc::new(Cell::new(0.0f64));

    // Bumped whenever a tile image finishes loading.
    let tile_epoch: RwSignal<u32> = RwSignal::new(0);
    let tiles = RefCell::new(TileCache::new(Rc::new(move || {
        tile_epoch.update(|n| *n = n.wrapping_add(1));
    })));

    // Cached 2D context (invalidated on canvas resize)
    let cached_ctx: RefCell<Option<CanvasRenderingContext2d>> = RefCell::new(None);

    let scheduler = RenderScheduler::new(move || {
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let canvas: &HtmlCanvasElement = &canvas;
        let Some(parent) = canvas.parent_element() else {
            return;
        };
        let w = f64::from(parent.client_width());
        let h = f64::from(parent.client_height());
        if w <= 0.0 || h <= 0.0 {
            return;
        }

        let dpr = web_sys::window()
            .map(|win| win.device_pixel_ratio())
            .unwrap_or(1.0)
            .max(1.0);
        let pw = (w * dpr).round() as u32;
        let ph = (h * dpr).round() as u32;
        if canvas.width() != pw || canvas.height() != ph {
            canvas.set_width(pw);
            canvas.set_height(ph);
            *cached_ctx.borrow_mut() = None;
        }

        let ctx = {
            let mut slot = cached_ctx.borrow_mut();
            if slot.is_none() {
                *slot = canvas
                    .get_context("2d")
                    .ok()
                    .flatten()
                    .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());
            }
            let Some(ctx) = slot.clone() else {
                return;
            };
            ctx
        };

        // All drawing below is in CSS pixels.
        ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();
        ctx.clear_rect(0.0, 0.0, w, h);

        let vp = viewport.get_untracked();
        if map_view.get_untracked() == MapView::Tiles {
            draw_tiles(&ctx, &vp, w, h, &mut tiles.borrow_mut());
        }

        let hov = hovered.get_untracked();
        geometry.with_untracked(|geometry| {
            let Some(geometry) = geometry else {
                return;
            };
            hexagons.with_untracked(|set| {
                draw_hexagons(HexLayerInput {
                    ctx: &ctx,
                    w,
                    h,
                    vp: &vp,
                    geometry,
                    hexagons: set,
                    hovered: hov,
                });
            });
        });
    });
    let scheduler = Rc::new(scheduler);

    // Any change to what is drawn needs a repaint.
    let sched_state = scheduler.clone();
    Effect::new(move || {
        hexagons.track();
        geometry.track();
        hovered.track();
        viewport.track();
        map_view.track();
        tile_epoch.track();
        sched_state.mark_dirty();
    });

    let sched_resize = scheduler.clone();
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };
        RESIZE_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "resize",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });
        let sched = sched_resize.clone();
        let handler = Closure::<dyn Fn()>::new(move || sched.mark_dirty());
        if window
            .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            RESIZE_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(ResizeBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    // --- Input handlers ---

    let hit_test = move |client_x: f64, client_y: f64| -> Option<HexId> {
        let canvas = canvas_ref.get_untracked()?;
        let rect = canvas.get_bounding_client_rect();
        let (wx, wy) = viewport
            .get_untracked()
            .screen_to_world(client_x - rect.left(), client_y - rect.top());
        geometry.with_untracked(|g| g.as_ref().and_then(|g| g.hit_test(wx, wy)))
    };

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let delta = e.delta_y();
        let x = f64::from(e.offset_x());
        let y = f64::from(e.offset_y());
        viewport.update(|vp| vp.zoom_at(delta, x, y));
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        move |e: PointerEvent| {
            is_dragging.set(true);
            hovered.set(None);
            let (x, y) = (f64::from(e.client_x()), f64::from(e.client_y()));
            drag_start_x.set(x);
            drag_start_y.set(y);
            last_x.set(x);
            last_y.set(y);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        move |e: PointerEvent| {
            let (x, y) = (f64::from(e.client_x()), f64::from(e.client_y()));
            if is_dragging.get() {
                let dx = x - last_x.get();
                let dy = y - last_y.get();
                last_x.set(x);
                last_y.set(y);
                viewport.update(|vp| vp.pan(dx, dy));
                return;
            }

            let hit = hit_test(x, y);
            if hit != hovered.get_untracked() {
                hovered.set(hit);
            }
            if hit.is_some() {
                mouse_pos.set((x, y));
            }
        }
    };

    let on_pointer_up = {
        let is_dragging = is_dragging.clone();
        move |e: PointerEvent| {
            is_dragging.set(false);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }
        }
    };

    let on_pointer_leave = move |_: PointerEvent| {
        if hovered.get_untracked().is_some() {
            hovered.set(None);
        }
    };

    let on_click = {
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        move |e: MouseEvent| {
            let (x, y) = (f64::from(e.client_x()), f64::from(e.client_y()));
            let dx = (x - drag_start_x.get()).abs();
            let dy = (y - drag_start_y.get()).abs();
            if dx >= CLICK_SLOP_PX || dy >= CLICK_SLOP_PX {
                return;
            }
            if let Some(id) = hit_test(x, y) {
                select_hexagon(selection, id);
            }
        }
    };

    let on_touch_start = {
        let pinch_dist = pinch_dist.clone();
        move |e: web_sys::TouchEvent| {
            let touches = e.touches();
            if touches.length() == 2 {
                e.prevent_default();
                let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                    return;
                };
                pinch_dist.set(touch_distance(&t0, &t1));
            }
        }
    };

    let on_touch_move = {
        let pinch_dist = pinch_dist.clone();
        move |e: web_sys::TouchEvent| {
            let touches = e.touches();
            if touches.length() != 2 {
                return;
            }
            e.prevent_default();
            let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                return;
            };
            let new_dist = touch_distance(&t0, &t1);
            let old_dist = pinch_dist.get();
            if old_dist > 0.0 {
                let mid_x = f64::from(t0.client_x() + t1.client_x()) / 2.0;
                let mid_y = f64::from(t0.client_y() + t1.client_y()) / 2.0;
                let delta = -(new_dist - old_dist) * 2.0;
                viewport.update(|vp| vp.zoom_at(delta, mid_x, mid_y));
            }
            pinch_dist.set(new_dist);
        }
    };

    view! {
        <div
            style="position: absolute; inset: 0; overflow: hidden;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=on_pointer_leave
            on:click=on_click
            on:touchstart=on_touch_start
            on:touchmove=on_touch_move
        >
            <canvas
                node_ref=canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
            />
        </div>
    }
}

fn touch_distance(a: &web_sys::Touch, b: &web_sys::Touch) -> f64 {
    let dx = f64::from(b.client_x() - a.client_x());
    let dy = f64::from(b.client_y() - a.client_y());
    (dx * dx + dy * dy).sqrt()
}

fn draw_tiles(ctx: &CanvasRenderingContext2d, vp: &Viewport, w: f64, h: f64, tiles: &mut TileCache) {
    ctx.set_fill_style_str(TILE_BACKGROUND);
    ctx.fill_rect(0.0, 0.0, w, h);

    for key in visible_tiles(vp, w, h) {
        let Some(image) = tiles.get_or_request(key) else {
            continue;
        };
        let bounds = key.world_bounds();
        let (sx, sy) = vp.world_to_screen(bounds.min_x, bounds.min_y);
        let (ex, ey) = vp.world_to_screen(bounds.max_x, bounds.max_y);
        // Snap to whole pixels so neighbouring tiles never leave a hairline gap.
        let sx = sx.floor();
        let sy = sy.floor();
        ctx.draw_image_with_html_image_element_and_dw_and_dh(
            &image,
            sx,
            sy,
            ex.ceil() - sx,
            ey.ceil() - sy,
        )
        .ok();
    }
}

struct HexLayerInput<'a> {
    ctx: &'a CanvasRenderingContext2d,
    w: f64,
    h: f64,
    vp: &'a Viewport,
    geometry: &'a MapGeometry,
    hexagons: &'a HexagonSet,
    hovered: Option<HexId>,
}

/// Fill and outline every on-screen hexagon with its stored style.
/// The hovered hexagon gets the hover overlay; its stored style is untouched.
fn draw_hexagons(input: HexLayerInput<'_>) {
    let HexLayerInput {
        ctx,
        w,
        h,
        vp,
        geometry,
        hexagons,
        hovered,
    } = input;

    let visible = vp.visible_world(w, h);
    let (sr, sg, sb) = STROKE_COLOR;
    ctx.set_stroke_style_str(&rgba_css(sr, sg, sb, 1.0));
    ctx.set_line_width(STROKE_WIDTH);
    ctx.set_line_join("round");

    for path in geometry.paths() {
        if !path.bounds.is_some_and(|b| b.intersects(&visible)) {
            continue;
        }
        let Some(hex) = hexagons.get(path.id) else {
            continue;
        };
        let style = if hovered == Some(path.id) {
            hex.style().hovered()
        } else {
            hex.style()
        };

        ctx.begin_path();
        for ring in path.rings() {
            let mut points = ring.iter();
            let Some(&(x0, y0)) = points.next() else {
                continue;
            };
            let (sx, sy) = vp.world_to_screen(x0, y0);
            ctx.move_to(sx, sy);
            for &(x, y) in points {
                let (sx, sy) = vp.world_to_screen(x, y);
                ctx.line_to(sx, sy);
            }
            ctx.close_path();
        }

        let (r, g, b) = style.fill;
        ctx.set_fill_style_str(&rgba_css(r, g, b, style.fill_opacity));
        ctx.fill();
        ctx.stroke();
    }
}
