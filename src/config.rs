/// Construction options for a [`LiquidChrome`](crate) renderer.
///
/// The shape uniforms (`base_color`, `amplitude`, `frequency_*`) are written
/// once at construction and never change for the lifetime of the instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromeConfig {
    /// RGB in [0, 1]; the shader divides it by `|sin(..)|`.
    pub base_color: [f32; 3],
    /// Multiplier on elapsed seconds before it becomes `uTime`.
    pub speed: f32,
    pub amplitude: f32,
    pub frequency_x: f32,
    pub frequency_y: f32,
    /// Whether pointer and touch listeners are attached at all.
    pub interactive: bool,
}

pub const DEFAULT_BASE_COLOR: [f32; 3] = [0.1, 0.1, 0.1];
pub const DEFAULT_SPEED: f32 = 1.0;
pub const DEFAULT_AMPLITUDE: f32 = 0.6;
pub const DEFAULT_FREQUENCY: f32 = 3.0;

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            base_color: DEFAULT_BASE_COLOR,
            speed: DEFAULT_SPEED,
            amplitude: DEFAULT_AMPLITUDE,
            frequency_x: DEFAULT_FREQUENCY,
            frequency_y: DEFAULT_FREQUENCY,
            interactive: true,
        }
    }
}

impl ChromeConfig {
    /// The red variant mounted behind the landing page hero.
    pub fn hero() -> Self {
        Self {
            base_color: [0.8, 0.1, 0.1],
            ..Self::default()
        }
    }

    /// Replace values the shader cannot use with their defaults.
    ///
    /// Non-finite numbers fall back everywhere; `speed` must also be positive.
    pub fn sanitized(mut self) -> Self {
        if !(self.speed.is_finite() && self.speed > 0.0) {
            self.speed = DEFAULT_SPEED;
        }
        if !self.amplitude.is_finite() {
            self.amplitude = DEFAULT_AMPLITUDE;
        }
        if !self.frequency_x.is_finite() {
            self.frequency_x = DEFAULT_FREQUENCY;
        }
        if !self.frequency_y.is_finite() {
            self.frequency_y = DEFAULT_FREQUENCY;
        }
        if self.base_color.iter().any(|c| !c.is_finite()) {
            self.base_color = DEFAULT_BASE_COLOR;
        }
        self
    }
}

#[cfg(target_arch = "wasm32")]
mod js {
    use super::*;
    use js_sys::{Array, Reflect};
    use wasm_bindgen::JsValue;

    fn number(options: &JsValue, key: &str) -> Option<f32> {
        Reflect::get(options, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
    }

    impl ChromeConfig {
        /// Read a plain JS options object. Missing or mistyped keys keep
        /// their defaults; `undefined`/`null` yields the defaults outright.
        pub fn from_js(options: &JsValue) -> Self {
            let mut config = Self::default();
            if options.is_undefined() || options.is_null() {
                return config;
            }

            if let Ok(color) = Reflect::get(options, &JsValue::from_str("baseColor")) {
                if Array::is_array(&color) {
                    let color = Array::from(&color);
                    let channels: Vec<f32> = color
                        .iter()
                        .filter_map(|c| c.as_f64())
                        .map(|c| c as f32)
                        .collect();
                    if color.length() == 3 && channels.len() == 3 {
                        config.base_color = [channels[0], channels[1], channels[2]];
                    }
                }
            }
            if let Some(v) = number(options, "speed") {
                config.speed = v;
            }
            if let Some(v) = number(options, "amplitude") {
                config.amplitude = v;
            }
            if let Some(v) = number(options, "frequencyX") {
                config.frequency_x = v;
            }
            if let Some(v) = number(options, "frequencyY") {
                config.frequency_y = v;
            }
            if let Some(v) = Reflect::get(options, &JsValue::from_str("interactive"))
                .ok()
                .and_then(|v| v.as_bool())
            {
                config.interactive = v;
            }

            config.sanitized()
        }
    }
}
