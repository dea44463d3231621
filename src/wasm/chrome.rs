use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, error, info, warn};
use wasm_bindgen::{closure::Closure, prelude::*, JsCast};
use web_sys::{
    Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent, TouchEvent,
    WebGlContextAttributes, WebGlProgram, WebGlRenderingContext as GL, WebglLoseContext, Window,
};

use super::program::ChromeProgram;
use crate::config::ChromeConfig;
use crate::error::ChromeError;
use crate::frame::{ClientRect, FrameState, Pointer, SurfaceSize};
use crate::shader::ShaderSources;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// A registered DOM listener, kept so it can be removed again.
struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn remove(&self) {
        if let Err(e) = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref())
        {
            warn!("failed to detach {} listener: {:?}", self.event, e);
        }
    }
}

struct Inner {
    window: Window,
    container: HtmlElement,
    canvas: HtmlCanvasElement,
    gl: Option<GL>,
    program: Option<ChromeProgram>,
    state: FrameState,
    frame: FrameCallback,
    frame_handle: Option<i32>,
    listeners: Vec<Listener>,
    frames_drawn: u64,
    destroyed: bool,
}

impl Inner {
    fn resize(&mut self) {
        let dpr = self.window.device_pixel_ratio();
        let size = self.state.resize(
            self.container.offset_width() as f64,
            self.container.offset_height() as f64,
            dpr,
        );
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);

        if let (Some(gl), Some(program)) = (&self.gl, &self.program) {
            gl.viewport(0, 0, size.width as i32, size.height as i32);
            program.write_resolution(gl, size.resolution());
        }
        debug!("liquid chrome surface {}x{} (dpr {dpr})", size.width, size.height);
    }

    fn client_rect(&self) -> ClientRect {
        let rect = self.container.get_bounding_client_rect();
        ClientRect {
            left: rect.left(),
            top: rect.top(),
            width: rect.width(),
            height: rect.height(),
        }
    }

    fn render(&mut self, now_ms: f64) {
        let (Some(gl), Some(program)) = (&self.gl, &self.program) else {
            return;
        };
        let frame = self.state.tick(now_ms);
        program.write_frame(gl, &frame);
        program.draw(gl);
        self.frames_drawn += 1;
    }

    fn schedule(&mut self) {
        let frame = self.frame.borrow();
        let Some(callback) = frame.as_ref() else {
            return;
        };
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(handle) => self.frame_handle = Some(handle),
            Err(e) => {
                self.frame_handle = None;
                error!("failed to schedule liquid chrome frame: {:?}", e);
            }
        }
    }

    fn teardown(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        if let Some(handle) = self.frame_handle.take() {
            if let Err(e) = self.window.cancel_animation_frame(handle) {
                warn!("failed to cancel liquid chrome frame: {:?}", e);
            }
        }
        self.frame.borrow_mut().take();

        for listener in self.listeners.drain(..) {
            listener.remove();
        }

        if let Some(parent) = self.canvas.parent_node() {
            if let Err(e) = parent.remove_child(&self.canvas) {
                warn!("failed to detach liquid chrome canvas: {:?}", e);
            }
        }

        if let Some(gl) = self.gl.take() {
            if let Some(program) = self.program.take() {
                program.release(&gl);
            }
            if let Ok(Some(ext)) = gl.get_extension("WEBGL_lose_context") {
                ext.unchecked_into::<WebglLoseContext>().lose_context();
            }
        }
    }
}

/// Animated liquid-chrome background attached to one container element.
///
/// Dropping the instance (or calling `free()` from JavaScript) tears it down.
#[wasm_bindgen]
pub struct LiquidChrome {
    inner: Rc<RefCell<Inner>>,
}

/// Create a renderer filling `container`. `options` is an optional plain
/// object: `{ baseColor, speed, amplitude, frequencyX, frequencyY, interactive }`.
///
/// Missing WebGL or a shader failure is logged and yields an inert instance;
/// only a missing window/document is reported as an error.
#[wasm_bindgen(js_name = create)]
pub fn create(container: HtmlElement, options: JsValue) -> Result<LiquidChrome, JsValue> {
    let config = ChromeConfig::from_js(&options);
    LiquidChrome::new(container, config).map_err(Into::into)
}

#[wasm_bindgen]
impl LiquidChrome {
    /// Release everything. Safe to call any number of times.
    pub fn destroy(&self) {
        self.inner.borrow_mut().teardown();
    }

    /// Re-measure the container and resize the surface to match.
    pub fn resize(&self) {
        let mut inner = self.inner.borrow_mut();
        if !inner.destroyed {
            inner.resize();
        }
    }

    /// Whether the animation loop is running.
    #[wasm_bindgen(getter, js_name = isActive)]
    pub fn is_active(&self) -> bool {
        let inner = self.inner.borrow();
        !inner.destroyed && inner.program.is_some()
    }

    /// Current normalized pointer as `[x, y]`.
    #[wasm_bindgen(getter, js_name = pointer)]
    pub fn pointer_js(&self) -> Vec<f32> {
        let p = self.pointer();
        vec![p.x, p.y]
    }

    /// Current `uResolution` value, empty before the first resize.
    #[wasm_bindgen(getter)]
    pub fn resolution(&self) -> Vec<f32> {
        self.surface_size()
            .map(|s| s.resolution().to_vec())
            .unwrap_or_default()
    }
}

impl LiquidChrome {
    pub fn new(container: HtmlElement, config: ChromeConfig) -> Result<Self, ChromeError> {
        Self::with_context_provider(container, config, acquire_webgl)
    }

    /// Like [`LiquidChrome::new`] with a custom way of obtaining the GL context.
    pub fn with_context_provider<F>(
        container: HtmlElement,
        config: ChromeConfig,
        acquire: F,
    ) -> Result<Self, ChromeError>
    where
        F: FnOnce(&HtmlCanvasElement) -> Result<GL, ChromeError>,
    {
        Self::with_sources(container, config, acquire, ShaderSources::default())
    }

    /// Full constructor: custom context acquisition and shader sources.
    pub fn with_sources<F>(
        container: HtmlElement,
        config: ChromeConfig,
        acquire: F,
        sources: ShaderSources,
    ) -> Result<Self, ChromeError>
    where
        F: FnOnce(&HtmlCanvasElement) -> Result<GL, ChromeError>,
    {
        let config = config.sanitized();
        let window = web_sys::window().ok_or_else(|| ChromeError::Dom("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| ChromeError::Dom("no document".into()))?;
        let canvas = document
            .create_element("canvas")
            .and_then(|e| e.dyn_into::<HtmlCanvasElement>().map_err(JsValue::from))
            .map_err(|e| ChromeError::Dom(format!("unable to create canvas: {e:?}")))?;

        let style = canvas.style();
        for (prop, value) in [("width", "100%"), ("height", "100%"), ("display", "block")] {
            style
                .set_property(prop, value)
                .map_err(|e| ChromeError::Dom(format!("unable to style canvas: {e:?}")))?;
        }
        container
            .append_child(&canvas)
            .map_err(|e| ChromeError::Dom(format!("unable to attach canvas: {e:?}")))?;

        let inner = Rc::new(RefCell::new(Inner {
            window,
            container,
            canvas,
            gl: None,
            program: None,
            state: FrameState::new(&config),
            frame: Rc::new(RefCell::new(None)),
            frame_handle: None,
            listeners: Vec::new(),
            frames_drawn: 0,
            destroyed: false,
        }));
        let chrome = Self { inner };

        // A page without the background still works, so GL failures stop here.
        match chrome.init_gl(&config, acquire, sources) {
            Ok(()) => chrome.start(),
            Err(e) => error!("liquid chrome disabled: {e}"),
        }
        Ok(chrome)
    }

    fn init_gl<F>(
        &self,
        config: &ChromeConfig,
        acquire: F,
        sources: ShaderSources,
    ) -> Result<(), ChromeError>
    where
        F: FnOnce(&HtmlCanvasElement) -> Result<GL, ChromeError>,
    {
        let mut inner = self.inner.borrow_mut();
        let gl = acquire(&inner.canvas)?;
        gl.clear_color(1.0, 1.0, 1.0, 1.0);
        // Keep the context even if the program fails so teardown can release it.
        inner.gl = Some(gl.clone());

        let program = ChromeProgram::build_from(&gl, sources)?;
        program.write_constants(&gl, config);
        inner.program = Some(program);
        Ok(())
    }

    fn start(&self) {
        self.attach_listeners();

        let weak = Rc::downgrade(&self.inner);
        let mut inner = self.inner.borrow_mut();
        inner.resize();
        let now = inner
            .window
            .performance()
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now);
        inner.state.start(now);

        *inner.frame.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut inner = inner.borrow_mut();
            if inner.destroyed {
                return;
            }
            inner.frame_handle = None;
            inner.render(now);
            inner.schedule();
        }) as Box<dyn FnMut(f64)>));
        inner.schedule();

        if let Some(size) = inner.state.surface() {
            info!("liquid chrome started at {}x{}", size.width, size.height);
        }
    }

    fn attach_listeners(&self) {
        let mut listeners = Vec::new();
        let (window, container, interactive) = {
            let inner = self.inner.borrow();
            (
                inner.window.clone(),
                inner.container.clone(),
                inner.state.interactive(),
            )
        };

        listeners.extend(self.listen(window.into(), "resize", |inner, _| inner.resize()));

        if interactive {
            listeners.extend(self.listen(container.clone().into(), "mousemove", |inner, event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    let rect = inner.client_rect();
                    inner
                        .state
                        .pointer_moved(event.client_x() as f64, event.client_y() as f64, rect);
                }
            }));
            listeners.extend(self.listen(container.into(), "touchmove", |inner, event| {
                if let Some(event) = event.dyn_ref::<TouchEvent>() {
                    let first = event
                        .touches()
                        .get(0)
                        .map(|t| (t.client_x() as f64, t.client_y() as f64));
                    let rect = inner.client_rect();
                    inner.state.touch_moved(first, rect);
                }
            }));
        }

        self.inner.borrow_mut().listeners = listeners;
    }

    fn listen<H>(&self, target: EventTarget, event: &'static str, mut handler: H) -> Option<Listener>
    where
        H: FnMut(&mut Inner, Event) + 'static,
    {
        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
        let callback = Closure::wrap(Box::new(move |e: Event| {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.borrow_mut();
                if !inner.destroyed {
                    handler(&mut *inner, e);
                }
            }
        }) as Box<dyn FnMut(Event)>);

        match target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref()) {
            Ok(()) => Some(Listener {
                target,
                event,
                callback,
            }),
            Err(e) => {
                error!("failed to attach {event} listener: {:?}", e);
                None
            }
        }
    }

    pub fn pointer(&self) -> Pointer {
        self.inner.borrow().state.pointer()
    }

    pub fn surface_size(&self) -> Option<SurfaceSize> {
        self.inner.borrow().state.surface()
    }

    /// Whether a frame callback is currently scheduled.
    pub fn frame_pending(&self) -> bool {
        self.inner.borrow().frame_handle.is_some()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.inner.borrow().frames_drawn
    }

    /// Number of DOM listeners currently attached.
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    pub fn canvas(&self) -> HtmlCanvasElement {
        self.inner.borrow().canvas.clone()
    }

    /// The context and linked program, `None` when inert or destroyed.
    pub fn gl_program(&self) -> Option<(GL, WebGlProgram)> {
        let inner = self.inner.borrow();
        let gl = inner.gl.clone()?;
        let program = inner.program.as_ref()?.handle().clone();
        Some((gl, program))
    }
}

impl Drop for LiquidChrome {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.teardown();
        }
    }
}

/// Ask the canvas for an antialiased WebGL context.
///
/// The program is GLSL ES 1.00 and uses nothing beyond WebGL 1, so the
/// version 1 context is requested; it is available wherever WebGL2 is.
pub fn acquire_webgl(canvas: &HtmlCanvasElement) -> Result<GL, ChromeError> {
    let attrs = WebGlContextAttributes::new();
    attrs.set_antialias(true);
    canvas
        .get_context_with_context_options("webgl", &attrs)
        .ok()
        .flatten()
        .ok_or(ChromeError::ContextUnavailable)?
        .dyn_into::<GL>()
        .map_err(|_| ChromeError::ContextUnavailable)
}
