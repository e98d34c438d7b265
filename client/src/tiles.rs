#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use hexmap_shared::Bounds;
use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

use crate::projection::WORLD_SIZE;
use crate::viewport::Viewport;

pub const MAX_TILE_ZOOM: u8 = 19;
pub const ATTRIBUTION: &str = "\u{00A9} OpenStreetMap contributors";
const SUBDOMAINS: [char; 3] = ['a', 'b', 'c'];
/// Upper bound on tiles drawn per frame; larger views fall back to a coarser zoom.
const MAX_VISIBLE_TILES: usize = 256;
const CACHE_CAPACITY: usize = 384;
const ONLOAD_HANDLE_KEY: &str = "__hexmapTileOnload";
const ONERROR_HANDLE_KEY: &str = "__hexmapTileOnerror";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    pub fn url(&self) -> String {
        let subdomain = SUBDOMAINS[((self.x + self.y) % SUBDOMAINS.len() as u32) as usize];
        format!(
            "https://{subdomain}.tile.openstreetmap.org/{}/{}/{}.png",
            self.z, self.x, self.y
        )
    }

    pub fn world_size(&self) -> f64 {
        WORLD_SIZE / f64::from(1u32 << self.z)
    }

    pub fn world_bounds(&self) -> Bounds {
        let size = self.world_size();
        let min_x = f64::from(self.x) * size;
        let min_y = f64::from(self.y) * size;
        Bounds {
            min_x,
            min_y,
            max_x: min_x + size,
            max_y: min_y + size,
        }
    }
}

/// Integer tile zoom nearest the viewport's fractional zoom.
pub fn tile_zoom(vp: &Viewport) -> u8 {
    vp.zoom_level().round().clamp(0.0, f64::from(MAX_TILE_ZOOM)) as u8
}

/// Tiles covering the canvas, row-major. Starts at the nearest integer zoom
/// and steps down until the whole view fits in `MAX_VISIBLE_TILES`.
pub fn visible_tiles(vp: &Viewport, canvas_w: f64, canvas_h: f64) -> Vec<TileKey> {
    let visible = vp.visible_world(canvas_w, canvas_h);
    if visible.max_x < 0.0
        || visible.max_y < 0.0
        || visible.min_x > WORLD_SIZE
        || visible.min_y > WORLD_SIZE
    {
        return Vec::new();
    }

    let mut z = tile_zoom(vp);
    loop {
        let n = 1u32 << z;
        let size = WORLD_SIZE / f64::from(n);
        let max_index = f64::from(n - 1);
        let x0 = (visible.min_x / size).floor().clamp(0.0, max_index) as u32;
        let x1 = (visible.max_x / size).floor().clamp(0.0, max_index) as u32;
        let y0 = (visible.min_y / size).floor().clamp(0.0, max_index) as u32;
        let y1 = (visible.max_y / size).floor().clamp(0.0, max_index) as u32;

        let count = (x1 - x0 + 1) as usize * (y1 - y0 + 1) as usize;
        if count <= MAX_VISIBLE_TILES || z == 0 {
            return (y0..=y1)
                .flat_map(|y| (x0..=x1).map(move |x| TileKey { z, x, y }))
                .collect();
        }
        z -= 1;
    }
}

struct TileEntry {
    image: HtmlImageElement,
    loaded: Rc<Cell<bool>>,
    failed: Rc<Cell<bool>>,
    last_used: u64,
}

/// Bounded cache of OSM tile images. Tiles load in the background; `on_load`
/// is invoked whenever one finishes so the map can repaint.
pub struct TileCache {
    entries: HashMap<TileKey, TileEntry>,
    clock: u64,
    on_load: Rc<dyn Fn()>,
}

impl TileCache {
    pub fn new(on_load: Rc<dyn Fn()>) -> Self {
        Self {
            entries: HashMap::new(),
            clock: 0,
            on_load,
        }
    }

    /// Image for `key` if it has finished loading; otherwise starts the load.
    pub fn get_or_request(&mut self, key: TileKey) -> Option<HtmlImageElement> {
        self.clock += 1;
        let clock = self.clock;
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.last_used = clock;
            return entry.loaded.get().then(|| entry.image.clone());
        }

        self.evict();
        if let Some(entry) = self.start_load(key, clock) {
            self.entries.insert(key, entry);
        }
        None
    }

    fn start_load(&self, key: TileKey, clock: u64) -> Option<TileEntry> {
        let img = HtmlImageElement::new().ok()?;
        let loaded = Rc::new(Cell::new(false));
        let failed = Rc::new(Cell::new(false));

        let img_for_load = img.clone();
        let loaded_flag = loaded.clone();
        let on_load = self.on_load.clone();
        let onload = Closure::<dyn FnMut()>::new(move || {
            clear_image_handlers(&img_for_load);
            loaded_flag.set(true);
            on_load();
        });

        let img_for_error = img.clone();
        let failed_flag = failed.clone();
        let onerror = Closure::<dyn FnMut()>::new(move || {
            clear_image_handlers(&img_for_error);
            failed_flag.set(true);
        });

        let onload_js = onload.into_js_value();
        let onerror_js = onerror.into_js_value();
        img.set_onload(Some(onload_js.unchecked_ref()));
        img.set_onerror(Some(onerror_js.unchecked_ref()));
        let _ = Reflect::set(img.as_ref(), &JsValue::from_str(ONLOAD_HANDLE_KEY), &onload_js);
        let _ = Reflect::set(img.as_ref(), &JsValue::from_str(ONERROR_HANDLE_KEY), &onerror_js);
        img.set_src(&key.url());

        Some(TileEntry {
            image: img,
            loaded,
            failed,
            last_used: clock,
        })
    }

    /// Drop failed tiles, then least-recently used ones until there is room for one more.
    fn evict(&mut self) {
        self.entries.retain(|_, entry| !entry.failed.get());
        while self.entries.len() >= CACHE_CAPACITY {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| *key)
            else {
                break;
            };
            if let Some(entry) = self.entries.remove(&oldest) {
                clear_image_handlers(&entry.image);
            }
        }
    }
}

fn clear_image_handlers(img: &HtmlImageElement) {
    img.set_onload(None);
    img.set_onerror(None);
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONLOAD_HANDLE_KEY));
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONERROR_HANDLE_KEY));
}
