//! CPU port of the fragment shader.
//!
//! Follows `FRAGMENT_SHADER` operation for operation in `f32` so tests have
//! an oracle for what a pixel should look like. It is far too slow to drive
//! the page and is not used for display.

use crate::shader::{
    DISTORTION_ITERATIONS, MOUSE_PHASE, RIPPLE_AMPLITUDE, RIPPLE_EPSILON, RIPPLE_FALLOFF,
    RIPPLE_FREQUENCY, RIPPLE_SPEED, SAMPLE_GRID,
};

/// Inputs of one draw call: every uniform the fragment shader reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderInputs {
    pub time: f32,
    pub resolution: [f32; 3],
    pub base_color: [f32; 3],
    pub amplitude: f32,
    pub frequency_x: f32,
    pub frequency_y: f32,
    pub mouse: [f32; 2],
}

impl ShaderInputs {
    fn min_side(&self) -> f32 {
        self.resolution[0].min(self.resolution[1])
    }
}

/// `renderImage` for one texture coordinate in [0, 1]².
pub fn render_image(inputs: &ShaderInputs, uv_coord: [f32; 2]) -> [f32; 4] {
    let [rx, ry, _] = inputs.resolution;
    let min_side = inputs.min_side();

    let frag = [uv_coord[0] * rx, uv_coord[1] * ry];
    let mut uv = [(2.0 * frag[0] - rx) / min_side, (2.0 * frag[1] - ry) / min_side];

    // Each axis reads the other's freshly updated value.
    for n in 1..=DISTORTION_ITERATIONS {
        let i = n as f32;
        uv[0] += inputs.amplitude / i
            * (i * inputs.frequency_x * uv[1] + inputs.time + inputs.mouse[0] * MOUSE_PHASE).cos();
        uv[1] += inputs.amplitude / i
            * (i * inputs.frequency_y * uv[0] + inputs.time + inputs.mouse[1] * MOUSE_PHASE).cos();
    }

    let diff = [uv_coord[0] - inputs.mouse[0], uv_coord[1] - inputs.mouse[1]];
    let dist = (diff[0] * diff[0] + diff[1] * diff[1]).sqrt();
    let falloff = (-dist * RIPPLE_FALLOFF).exp();
    let ripple = (RIPPLE_FREQUENCY * dist - inputs.time * RIPPLE_SPEED).sin() * RIPPLE_AMPLITUDE;
    let denom = dist + RIPPLE_EPSILON;
    uv[0] += diff[0] / denom * ripple * falloff;
    uv[1] += diff[1] / denom * ripple * falloff;

    let s = (inputs.time - uv[1] - uv[0]).sin().abs();
    let [r, g, b] = inputs.base_color;
    [r / s, g / s, b / s, 1.0]
}

/// Box-filtered color at interpolated `vUv`: mean of a 3x3 grid of `render_image` taps.
pub fn shade(inputs: &ShaderInputs, v_uv: [f32; 2]) -> [f32; 4] {
    let step = 1.0 / inputs.min_side();
    let mut col = [0.0f32; 4];
    let mut samples = 0;
    for i in -SAMPLE_GRID..=SAMPLE_GRID {
        for j in -SAMPLE_GRID..=SAMPLE_GRID {
            let offset = [i as f32 * step, j as f32 * step];
            let c = render_image(inputs, [v_uv[0] + offset[0], v_uv[1] + offset[1]]);
            for k in 0..4 {
                col[k] += c[k];
            }
            samples += 1;
        }
    }
    col.map(|c| c / samples as f32)
}

/// `vUv` at the center of pixel (`x`, `y`), row 0 at the bottom as in GL.
pub fn pixel_uv(x: u32, y: u32, width: u32, height: u32) -> [f32; 2] {
    [
        (x as f32 + 0.5) / width as f32,
        (y as f32 + 0.5) / height as f32,
    ]
}

/// Render a whole frame into RGBA8, top row first like `readPixels` flipped for display.
///
/// Channels saturate at 255, which is what the canvas does with the
/// shader's out-of-range output.
pub fn render_rgba8(inputs: &ShaderInputs, width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(width as usize * height as usize * 4);
    for row in 0..height {
        let y = height - 1 - row;
        for x in 0..width {
            let c = shade(inputs, pixel_uv(x, y, width, height));
            out.extend(c.iter().map(|v| to_byte(*v)));
        }
    }
    out
}

fn to_byte(v: f32) -> u8 {
    if v.is_nan() {
        0
    } else {
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still(time: f32) -> ShaderInputs {
        ShaderInputs {
            time,
            resolution: [100.0, 100.0, 1.0],
            base_color: [0.8, 0.1, 0.1],
            amplitude: 0.0,
            frequency_x: 3.0,
            frequency_y: 3.0,
            mouse: [0.5, 0.5],
        }
    }

    #[test]
    fn center_without_distortion_is_base_over_sin_time() {
        // amplitude 0 leaves uv at the origin and the ripple term vanishes at the mouse.
        let t = std::f32::consts::FRAC_PI_2;
        let c = render_image(&still(t), [0.5, 0.5]);
        let s = t.sin().abs();
        assert_eq!(c, [0.8 / s, 0.1 / s, 0.1 / s, 1.0]);
    }

    #[test]
    fn epsilon_keeps_mouse_position_finite() {
        let inputs = ShaderInputs { amplitude: 0.6, time: 1.3, ..still(0.0) };
        let c = render_image(&inputs, inputs.mouse);
        assert!(c.iter().all(|v| v.is_finite()), "{c:?}");
    }

    #[test]
    fn pixel_centers() {
        assert_eq!(pixel_uv(0, 0, 4, 2), [0.125, 0.25]);
        assert_eq!(pixel_uv(3, 1, 4, 2), [0.875, 0.75]);
    }

    #[test]
    fn byte_conversion_saturates() {
        assert_eq!(to_byte(2.5), 255);
        assert_eq!(to_byte(-1.0), 0);
        assert_eq!(to_byte(f32::NAN), 0);
        assert_eq!(to_byte(0.5), 128);
    }
}
