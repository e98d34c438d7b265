use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Coalesces repaint requests into at most one `requestAnimationFrame` callback.
///
/// Any number of `mark_dirty()` calls between two frames produce a single
/// call to the paint function.
pub struct RenderScheduler {
    frame: Rc<FrameState>,
}

struct FrameState {
    window: Option<web_sys::Window>,
    pending: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl FrameState {
    fn request(&self) {
        if self.pending.get().is_some() {
            return;
        }
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let callback = self.callback.borrow();
        let Some(cb) = callback.as_ref() else {
            return;
        };
        if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            self.pending.set(Some(id));
        }
    }
}

impl RenderScheduler {
    pub fn new(paint: impl Fn() + 'static) -> Self {
        let frame = Rc::new(FrameState {
            window: web_sys::window(),
            pending: Cell::new(None),
            callback: RefCell::new(None),
        });

        let frame_cb = frame.clone();
        let cb = Closure::<dyn FnMut()>::new(move || {
            frame_cb.pending.set(None);
            paint();
        });
        *frame.callback.borrow_mut() = Some(cb);

        Self { frame }
    }

    /// Ask for a repaint on the next animation frame.
    pub fn mark_dirty(&self) {
        self.frame.request();
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        if let Some(raf_id) = self.frame.pending.replace(None)
            && let Some(window) = self.frame.window.as_ref()
        {
            let _ = window.cancel_animation_frame(raf_id);
        }
        // Break the callback -> state cycle.
        self.frame.callback.borrow_mut().take();
    }
}
