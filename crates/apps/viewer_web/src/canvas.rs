use foundation::math::Vec2;
use layers::{Hsl, Painter};
use runtime::{FrameHandle, FrameHost};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

fn ctx_set_style(ctx: &CanvasRenderingContext2d, key: &str, value: &str) {
    let _ = js_sys::Reflect::set(ctx.as_ref(), &JsValue::from_str(key), &JsValue::from_str(value));
}

/// [`Painter`] over a canvas 2D context.
pub struct CanvasPainter {
    ctx: CanvasRenderingContext2d,
}

impl CanvasPainter {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl Painter for CanvasPainter {
    fn clear(&mut self, width: f64, height: f64) {
        self.ctx.clear_rect(0.0, 0.0, width, height);
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, p: Vec2) {
        self.ctx.move_to(p.x, p.y);
    }

    fn line_to(&mut self, p: Vec2) {
        self.ctx.line_to(p.x, p.y);
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn fill(&mut self, color: Hsl) {
        ctx_set_style(&self.ctx, "fillStyle", &color.to_css());
        self.ctx.fill();
    }

    fn stroke(&mut self, color: &str, width: f64) {
        ctx_set_style(&self.ctx, "strokeStyle", color);
        self.ctx.set_line_width(width);
        self.ctx.stroke();
    }
}

/// `requestAnimationFrame` host. One long-lived callback serves every frame.
pub struct RafHost {
    callback: Closure<dyn FnMut(f64)>,
}

impl RafHost {
    pub fn new(on_frame: impl FnMut(f64) + 'static) -> Self {
        Self {
            callback: Closure::wrap(Box::new(on_frame) as Box<dyn FnMut(f64)>),
        }
    }
}

impl FrameHost for RafHost {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        let window = web_sys::window()?;
        window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
            .ok()
            .map(|id| FrameHandle(i64::from(id)))
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let (Some(window), Ok(id)) = (web_sys::window(), i32::try_from(handle.0)) else {
            return;
        };
        let _ = window.cancel_animation_frame(id);
    }
}
