use wasm_bindgen::JsValue;

/// Which half of the program a compile error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

/// Failures while bringing up the background renderer.
///
/// GL failures never reach the host page: the renderer logs them and stays
/// inert. Only a `Dom` error before the surface exists fails construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChromeError {
    /// The browser refused to hand out a WebGL context.
    #[error("WebGL not supported")]
    ContextUnavailable,

    /// A shader failed to compile; `log` is the driver's info log.
    #[error("{} shader compile error: {log}", stage.as_str())]
    ShaderCompile { stage: ShaderStage, log: String },

    /// The program failed to link; carries the driver's info log.
    #[error("program link error: {0}")]
    ProgramLink(String),

    /// A shader, program or buffer object could not be created.
    #[error("GL error: {0}")]
    Gl(String),

    /// The canvas could not be created or attached.
    #[error("DOM error: {0}")]
    Dom(String),
}

impl From<ChromeError> for JsValue {
    fn from(err: ChromeError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
