use log::debug;
use web_sys::{
    WebGlBuffer, WebGlProgram, WebGlRenderingContext as GL, WebGlShader, WebGlUniformLocation,
};

use crate::config::ChromeConfig;
use crate::error::{ChromeError, ShaderStage};
use crate::frame::FrameUniforms;
use crate::shader::{self, uniforms, ShaderSources};

/// Cached uniform handles. A uniform the driver optimised away resolves to
/// `None`, and writes to it are silently dropped by WebGL.
struct Uniforms {
    time: Option<WebGlUniformLocation>,
    resolution: Option<WebGlUniformLocation>,
    base_color: Option<WebGlUniformLocation>,
    amplitude: Option<WebGlUniformLocation>,
    frequency_x: Option<WebGlUniformLocation>,
    frequency_y: Option<WebGlUniformLocation>,
    mouse: Option<WebGlUniformLocation>,
}

/// The linked liquid-chrome program plus the triangle buffer it draws.
pub struct ChromeProgram {
    program: WebGlProgram,
    buffer: WebGlBuffer,
    uniforms: Uniforms,
}

impl ChromeProgram {
    /// Compile, link and activate the program, upload the full-screen
    /// triangle and bind it to `position`.
    pub fn build_from(gl: &GL, sources: ShaderSources) -> Result<Self, ChromeError> {
        let vertex = compile(gl, ShaderStage::Vertex, sources.vertex)?;
        let fragment = match compile(gl, ShaderStage::Fragment, sources.fragment) {
            Ok(s) => s,
            Err(e) => {
                gl.delete_shader(Some(&vertex));
                return Err(e);
            }
        };

        let program = link(gl, &vertex, &fragment);
        // The program keeps what it needs once linked.
        gl.delete_shader(Some(&vertex));
        gl.delete_shader(Some(&fragment));
        let program = program?;
        gl.use_program(Some(&program));

        let buffer = match upload_triangle(gl, &program) {
            Ok(b) => b,
            Err(e) => {
                gl.delete_program(Some(&program));
                return Err(e);
            }
        };

        let loc = |name| gl.get_uniform_location(&program, name);
        let uniforms = Uniforms {
            time: loc(uniforms::TIME),
            resolution: loc(uniforms::RESOLUTION),
            base_color: loc(uniforms::BASE_COLOR),
            amplitude: loc(uniforms::AMPLITUDE),
            frequency_x: loc(uniforms::FREQUENCY_X),
            frequency_y: loc(uniforms::FREQUENCY_Y),
            mouse: loc(uniforms::MOUSE),
        };
        debug!("liquid chrome program linked");

        Ok(Self {
            program,
            buffer,
            uniforms,
        })
    }

    /// Uniforms fixed for the lifetime of the instance, plus the centered mouse.
    pub fn write_constants(&self, gl: &GL, config: &ChromeConfig) {
        let u = &self.uniforms;
        let [r, g, b] = config.base_color;
        gl.uniform3f(u.base_color.as_ref(), r, g, b);
        gl.uniform1f(u.amplitude.as_ref(), config.amplitude);
        gl.uniform1f(u.frequency_x.as_ref(), config.frequency_x);
        gl.uniform1f(u.frequency_y.as_ref(), config.frequency_y);
        gl.uniform2f(u.mouse.as_ref(), 0.5, 0.5);
    }

    pub fn write_resolution(&self, gl: &GL, resolution: [f32; 3]) {
        let [w, h, aspect] = resolution;
        gl.uniform3f(self.uniforms.resolution.as_ref(), w, h, aspect);
    }

    /// Time and mouse go out together so a frame never mixes old and new.
    pub fn write_frame(&self, gl: &GL, frame: &FrameUniforms) {
        gl.uniform1f(self.uniforms.time.as_ref(), frame.time);
        gl.uniform2f(self.uniforms.mouse.as_ref(), frame.mouse.x, frame.mouse.y);
    }

    pub fn draw(&self, gl: &GL) {
        gl.clear(GL::COLOR_BUFFER_BIT);
        gl.draw_arrays(GL::TRIANGLES, 0, 3);
    }

    pub fn handle(&self) -> &WebGlProgram {
        &self.program
    }

    pub fn release(&self, gl: &GL) {
        gl.delete_buffer(Some(&self.buffer));
        gl.delete_program(Some(&self.program));
    }
}

fn compile(gl: &GL, stage: ShaderStage, source: &str) -> Result<WebGlShader, ChromeError> {
    let kind = match stage {
        ShaderStage::Vertex => GL::VERTEX_SHADER,
        ShaderStage::Fragment => GL::FRAGMENT_SHADER,
    };
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| ChromeError::Gl(format!("unable to create {} shader", stage.as_str())))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let ok = gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(ChromeError::ShaderCompile { stage, log })
    }
}

fn link(gl: &GL, vertex: &WebGlShader, fragment: &WebGlShader) -> Result<WebGlProgram, ChromeError> {
    let program = gl
        .create_program()
        .ok_or_else(|| ChromeError::Gl("unable to create program".into()))?;
    gl.attach_shader(&program, vertex);
    gl.attach_shader(&program, fragment);
    gl.link_program(&program);

    let ok = gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        Err(ChromeError::ProgramLink(log))
    }
}

fn upload_triangle(gl: &GL, program: &WebGlProgram) -> Result<WebGlBuffer, ChromeError> {
    let buffer = gl
        .create_buffer()
        .ok_or_else(|| ChromeError::Gl("unable to create vertex buffer".into()))?;
    gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
    let vertices = js_sys::Float32Array::from(&shader::FULLSCREEN_TRIANGLE[..]);
    gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &vertices, GL::STATIC_DRAW);

    let position = gl.get_attrib_location(program, shader::POSITION_ATTRIBUTE);
    if position < 0 {
        gl.delete_buffer(Some(&buffer));
        return Err(ChromeError::ProgramLink(format!(
            "attribute `{}` not found",
            shader::POSITION_ATTRIBUTE
        )));
    }
    gl.enable_vertex_attrib_array(position as u32);
    gl.vertex_attrib_pointer_with_i32(position as u32, 2, GL::FLOAT, false, 0, 0);
    Ok(buffer)
}
