//! Per-instance state that does not touch the GPU.
//!
//! Everything the event handlers and the animation callback mutate lives
//! here so the arithmetic can be tested off the browser. The GL side reads
//! the values this produces and writes them into uniforms.

use crate::config::ChromeConfig;

/// Normalized pointer position, (0, 0) is the bottom-left of the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub x: f32,
    pub y: f32,
}

impl Pointer {
    pub const CENTER: Pointer = Pointer { x: 0.5, y: 0.5 };
}

impl Default for Pointer {
    fn default() -> Self {
        Self::CENTER
    }
}

/// A container's bounding box in CSS pixels, as `getBoundingClientRect` reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Backing-store size of the drawing surface in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    /// Layout size times device pixel ratio, truncated like `canvas.width = x` does.
    ///
    /// A collapsed container still yields a 1x1 surface so the aspect ratio
    /// stays finite.
    pub fn from_layout(css_width: f64, css_height: f64, device_pixel_ratio: f64) -> Self {
        let scale = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let px = |css: f64| {
            let v = (css * scale).trunc();
            if v.is_finite() && v >= 1.0 {
                v.min(u32::MAX as f64) as u32
            } else {
                1
            }
        };
        Self {
            width: px(css_width),
            height: px(css_height),
        }
    }

    /// Value for `uResolution`: width, height, aspect.
    pub fn resolution(&self) -> [f32; 3] {
        let w = self.width as f32;
        let h = self.height as f32;
        [w, h, w / h]
    }
}

/// Uniform values that change every frame, written together right before the draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub time: f32,
    pub mouse: Pointer,
}

#[derive(Debug, Clone)]
pub struct FrameState {
    speed: f32,
    interactive: bool,
    pointer: Pointer,
    surface: Option<SurfaceSize>,
    start_ms: Option<f64>,
    last_time: f32,
}

impl FrameState {
    pub fn new(config: &ChromeConfig) -> Self {
        Self {
            speed: config.speed,
            interactive: config.interactive,
            pointer: Pointer::CENTER,
            surface: None,
            start_ms: None,
            last_time: 0.0,
        }
    }

    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    /// `None` until the first resize.
    pub fn surface(&self) -> Option<SurfaceSize> {
        self.surface
    }

    pub fn started(&self) -> bool {
        self.start_ms.is_some()
    }

    /// Record the instant elapsed time is measured from. Later calls are ignored.
    pub fn start(&mut self, now_ms: f64) {
        if self.start_ms.is_none() {
            self.start_ms = Some(now_ms);
        }
    }

    pub fn resize(&mut self, css_width: f64, css_height: f64, device_pixel_ratio: f64) -> SurfaceSize {
        let size = SurfaceSize::from_layout(css_width, css_height, device_pixel_ratio);
        self.surface = Some(size);
        size
    }

    /// Mouse position in client coordinates. Returns whether the pointer moved.
    pub fn pointer_moved(&mut self, client_x: f64, client_y: f64, rect: ClientRect) -> bool {
        if !self.interactive {
            return false;
        }
        self.pointer = normalize_pointer(client_x, client_y, rect);
        true
    }

    /// Touch move; only the first active touch counts and an empty list is ignored.
    pub fn touch_moved(&mut self, first_touch: Option<(f64, f64)>, rect: ClientRect) -> bool {
        match first_touch {
            Some((x, y)) => self.pointer_moved(x, y, rect),
            None => false,
        }
    }

    /// Uniforms for a frame whose callback received `now_ms`.
    ///
    /// The timestamp the browser hands the animation callback can trail the
    /// instant sampled at start by a fraction of a millisecond; time never
    /// runs backwards from the last value handed out.
    pub fn tick(&mut self, now_ms: f64) -> FrameUniforms {
        let start = *self.start_ms.get_or_insert(now_ms);
        let time = ((now_ms - start) / 1000.0 * self.speed as f64) as f32;
        self.last_time = self.last_time.max(time);
        FrameUniforms {
            time: self.last_time,
            mouse: self.pointer,
        }
    }
}

/// Event position as a fraction of `rect`, vertical axis flipped.
pub fn normalize_pointer(client_x: f64, client_y: f64, rect: ClientRect) -> Pointer {
    Pointer {
        x: ((client_x - rect.left) / rect.width) as f32,
        y: (1.0 - (client_y - rect.top) / rect.height) as f32,
    }
}
