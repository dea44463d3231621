//! Fixed GLSL ES 1.00 program for the liquid-chrome effect.
//!
//! Written against WebGL 1; WebGL2 contexts accept the same `#version 100`
//! text unchanged.

pub const VERTEX_SHADER: &str = r#"
attribute vec2 position;
varying vec2 vUv;
void main() {
    vUv = position * 0.5 + 0.5;
    gl_Position = vec4(position, 0.0, 1.0);
}
"#;

pub const FRAGMENT_SHADER: &str = r#"
precision highp float;
uniform float uTime;
uniform vec3 uResolution;
uniform vec3 uBaseColor;
uniform float uAmplitude;
uniform float uFrequencyX;
uniform float uFrequencyY;
uniform vec2 uMouse;
varying vec2 vUv;

vec4 renderImage(vec2 uvCoord) {
    vec2 fragCoord = uvCoord * uResolution.xy;
    vec2 uv = (2.0 * fragCoord - uResolution.xy) / min(uResolution.x, uResolution.y);

    for (float i = 1.0; i < 10.0; i++){
        uv.x += uAmplitude / i * cos(i * uFrequencyX * uv.y + uTime + uMouse.x * 3.14159);
        uv.y += uAmplitude / i * cos(i * uFrequencyY * uv.x + uTime + uMouse.y * 3.14159);
    }

    vec2 diff = (uvCoord - uMouse);
    float dist = length(diff);
    float falloff = exp(-dist * 20.0);
    float ripple = sin(10.0 * dist - uTime * 2.0) * 0.03;
    uv += (diff / (dist + 0.0001)) * ripple * falloff;

    vec3 color = uBaseColor / abs(sin(uTime - uv.y - uv.x));
    return vec4(color, 1.0);
}

void main() {
    vec4 col = vec4(0.0);
    int samples = 0;
    for (int i = -1; i <= 1; i++){
        for (int j = -1; j <= 1; j++){
            vec2 offset = vec2(float(i), float(j)) * (1.0 / min(uResolution.x, uResolution.y));
            col += renderImage(vUv + offset);
            samples++;
        }
    }
    gl_FragColor = col / float(samples);
}
"#;

/// The pair of sources a renderer compiles. Defaults to the shipped program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: &'static str,
    pub fragment: &'static str,
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self {
            vertex: VERTEX_SHADER,
            fragment: FRAGMENT_SHADER,
        }
    }
}

/// Vertex attribute fed from [`FULLSCREEN_TRIANGLE`].
pub const POSITION_ATTRIBUTE: &str = "position";

/// One clip-space triangle that covers the whole viewport, no diagonal seam.
pub const FULLSCREEN_TRIANGLE: [f32; 6] = [-1.0, -1.0, 3.0, -1.0, -1.0, 3.0];

/// Uniform names as declared in [`FRAGMENT_SHADER`].
pub mod uniforms {
    pub const TIME: &str = "uTime";
    pub const RESOLUTION: &str = "uResolution";
    pub const BASE_COLOR: &str = "uBaseColor";
    pub const AMPLITUDE: &str = "uAmplitude";
    pub const FREQUENCY_X: &str = "uFrequencyX";
    pub const FREQUENCY_Y: &str = "uFrequencyY";
    pub const MOUSE: &str = "uMouse";

    pub const ALL: [&str; 7] = [
        TIME,
        RESOLUTION,
        BASE_COLOR,
        AMPLITUDE,
        FREQUENCY_X,
        FREQUENCY_Y,
        MOUSE,
    ];
}

// Constants baked into FRAGMENT_SHADER, mirrored for the CPU reference.
pub const DISTORTION_ITERATIONS: u32 = 9;
pub const SAMPLE_GRID: i32 = 1;
pub const MOUSE_PHASE: f32 = 3.14159;
pub const RIPPLE_FREQUENCY: f32 = 10.0;
pub const RIPPLE_SPEED: f32 = 2.0;
pub const RIPPLE_AMPLITUDE: f32 = 0.03;
pub const RIPPLE_FALLOFF: f32 = 20.0;
pub const RIPPLE_EPSILON: f32 = 0.0001;
