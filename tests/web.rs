#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use liquid_chrome::shader::uniforms;
use liquid_chrome::{acquire_webgl, ChromeConfig, ChromeError, LiquidChrome, Pointer, ShaderSources};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{HtmlElement, MouseEvent, MouseEventInit, WebGlProgram, WebGlRenderingContext};

wasm_bindgen_test_configure!(run_in_browser);

/// A fixed-position container at the given viewport rect.
fn container(left: u32, top: u32, width: u32, height: u32) -> HtmlElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let div = document
        .create_element("div")
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap();
    div.set_attribute(
        "style",
        &format!(
            "position:fixed;left:{left}px;top:{top}px;width:{width}px;height:{height}px;margin:0;padding:0;border:0"
        ),
    )
    .unwrap();
    document.body().unwrap().append_child(&div).unwrap();
    div
}

fn mouse_move(target: &HtmlElement, x: i32, y: i32) {
    let init = MouseEventInit::new();
    init.set_client_x(x);
    init.set_client_y(y);
    let event = MouseEvent::new_with_mouse_event_init_dict("mousemove", &init).unwrap();
    target.dispatch_event(&event).unwrap();
}

/// Resolves on the next animation frame, after callbacks requested earlier.
async fn next_frame() {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        web_sys::window()
            .unwrap()
            .request_animation_frame(&resolve)
            .unwrap();
    });
    JsFuture::from(promise).await.unwrap();
}

fn read_uniform(gl: &WebGlRenderingContext, program: &WebGlProgram, name: &str) -> wasm_bindgen::JsValue {
    let loc = gl
        .get_uniform_location(program, name)
        .unwrap_or_else(|| panic!("{name} not active"));
    gl.get_uniform(program, &loc)
}

fn active(div: &HtmlElement, config: ChromeConfig) -> LiquidChrome {
    let chrome = LiquidChrome::new(div.clone(), config).unwrap();
    assert!(chrome.is_active(), "test browser must provide WebGL");
    chrome
}

#[wasm_bindgen_test]
fn canvas_is_appended_as_last_child() {
    let div = container(0, 0, 120, 80);
    let sibling = web_sys::window().unwrap().document().unwrap().create_element("span").unwrap();
    div.append_child(&sibling).unwrap();

    let chrome = LiquidChrome::new(div.clone(), ChromeConfig::default()).unwrap();
    let canvas = chrome.canvas();
    assert_eq!(div.last_child().unwrap(), canvas.clone().into());
    assert_eq!(canvas.style().get_property_value("display").unwrap(), "block");
    assert_eq!(canvas.style().get_property_value("width").unwrap(), "100%");

    chrome.destroy();
    assert!(canvas.parent_node().is_none());
    // Unrelated siblings stay put.
    assert_eq!(div.child_element_count(), 1);
    div.remove();
}

#[wasm_bindgen_test]
fn destroy_twice_leaves_nothing_pending() {
    let div = container(0, 0, 64, 64);
    let chrome = active(&div, ChromeConfig::default());
    assert!(chrome.frame_pending());
    assert_eq!(chrome.listener_count(), 3);

    chrome.destroy();
    chrome.destroy();
    assert!(!chrome.is_active());
    assert!(!chrome.frame_pending());
    assert_eq!(chrome.listener_count(), 0);
    div.remove();
}

#[wasm_bindgen_test]
fn surface_matches_layout_times_pixel_ratio() {
    let div = container(0, 0, 400, 300);
    let chrome = LiquidChrome::new(div.clone(), ChromeConfig::default()).unwrap();
    let dpr = web_sys::window().unwrap().device_pixel_ratio();
    let expected_w = (400.0 * dpr).trunc() as u32;
    let expected_h = (300.0 * dpr).trunc() as u32;

    chrome.resize();
    let canvas = chrome.canvas();
    assert_eq!((canvas.width(), canvas.height()), (expected_w, expected_h));
    let res = chrome.resolution();
    assert_eq!(res[0], expected_w as f32);
    assert_eq!(res[1], expected_h as f32);
    assert!((res[2] - 4.0 / 3.0).abs() < 1e-3);

    chrome.destroy();
    div.remove();
}

#[wasm_bindgen_test(async)]
async fn pointer_follows_mouse_with_flipped_y() {
    let div = container(100, 50, 200, 100);
    let chrome = active(&div, ChromeConfig::default());
    mouse_move(&div, 150, 75);
    assert_eq!(chrome.pointer(), Pointer { x: 0.25, y: 0.75 });

    // The next frame hands the new position to the shader.
    next_frame().await;
    let (gl, program) = chrome.gl_program().unwrap();
    let mouse = js_sys::Float32Array::from(read_uniform(&gl, &program, uniforms::MOUSE)).to_vec();
    assert_eq!(mouse, vec![0.25, 0.75]);

    chrome.destroy();
    // Listeners are gone after teardown.
    mouse_move(&div, 300, 150);
    assert_eq!(chrome.pointer(), Pointer { x: 0.25, y: 0.75 });
    div.remove();
}

#[wasm_bindgen_test]
fn non_interactive_ignores_pointer() {
    let div = container(100, 50, 200, 100);
    let config = ChromeConfig {
        interactive: false,
        ..ChromeConfig::default()
    };
    let chrome = active(&div, config);
    // Only the window resize listener.
    assert_eq!(chrome.listener_count(), 1);
    mouse_move(&div, 150, 75);
    assert_eq!(chrome.pointer(), Pointer::CENTER);

    chrome.destroy();
    div.remove();
}

#[wasm_bindgen_test]
fn missing_context_leaves_renderer_inert() {
    let div = container(0, 0, 50, 50);
    let chrome = LiquidChrome::with_context_provider(div.clone(), ChromeConfig::default(), |_| {
        Err(ChromeError::ContextUnavailable)
    })
    .unwrap();

    assert!(!chrome.is_active());
    assert!(!chrome.frame_pending());
    assert_eq!(chrome.listener_count(), 0);
    assert_eq!(chrome.frames_drawn(), 0);
    // The blank surface stays attached until teardown.
    assert!(chrome.canvas().parent_node().is_some());

    chrome.destroy();
    chrome.destroy();
    assert!(chrome.canvas().parent_node().is_none());
    assert_eq!(chrome.frames_drawn(), 0);
    div.remove();
}

#[wasm_bindgen_test]
fn dropping_the_instance_tears_it_down() {
    let div = container(0, 0, 50, 50);
    let canvas = {
        let chrome = LiquidChrome::new(div.clone(), ChromeConfig::default()).unwrap();
        chrome.canvas()
    };
    assert!(canvas.parent_node().is_none());
    div.remove();
}

#[wasm_bindgen_test]
fn shader_failure_leaves_renderer_inert_and_releases_context() {
    let div = container(0, 0, 50, 50);
    let acquired: Rc<RefCell<Option<WebGlRenderingContext>>> = Rc::new(RefCell::new(None));
    let slot = acquired.clone();
    let sources = ShaderSources {
        fragment: "precision highp float; void main() { gl_FragColor = vec4(nope); }",
        ..ShaderSources::default()
    };
    let chrome = LiquidChrome::with_sources(
        div.clone(),
        ChromeConfig::default(),
        move |canvas| {
            let gl = acquire_webgl(canvas)?;
            *slot.borrow_mut() = Some(gl.clone());
            Ok(gl)
        },
        sources,
    )
    .unwrap();

    assert!(!chrome.is_active());
    assert!(!chrome.frame_pending());
    assert_eq!(chrome.listener_count(), 0);
    assert!(chrome.gl_program().is_none());

    let gl = acquired.borrow().clone().expect("context was acquired");
    assert!(!gl.is_context_lost());
    chrome.destroy();
    assert!(gl.is_context_lost());
    assert!(chrome.canvas().parent_node().is_none());
    assert_eq!(chrome.frames_drawn(), 0);
    div.remove();
}

#[wasm_bindgen_test(async)]
async fn frames_write_uniforms_and_draw() {
    let div = container(0, 0, 160, 90);
    let chrome = active(&div, ChromeConfig::default());
    let (gl, program) = chrome.gl_program().unwrap();

    let size = chrome.surface_size().unwrap();
    let resolution = js_sys::Float32Array::from(read_uniform(&gl, &program, uniforms::RESOLUTION)).to_vec();
    assert_eq!(
        resolution,
        vec![size.width as f32, size.height as f32, size.width as f32 / size.height as f32]
    );
    let canvas = chrome.canvas();
    assert_eq!((canvas.width(), canvas.height()), (size.width, size.height));

    next_frame().await;
    let drawn = chrome.frames_drawn();
    assert!(drawn >= 1, "no frame drawn");
    let t1 = read_uniform(&gl, &program, uniforms::TIME).as_f64().unwrap();

    next_frame().await;
    assert!(chrome.frames_drawn() > drawn, "loop did not reschedule");
    let t2 = read_uniform(&gl, &program, uniforms::TIME).as_f64().unwrap();
    assert!(t2 >= t1, "uTime went backwards: {t1} -> {t2}");
    assert!(chrome.frame_pending());

    chrome.destroy();
    assert!(!chrome.frame_pending());
    let after = chrome.frames_drawn();
    next_frame().await;
    assert_eq!(chrome.frames_drawn(), after);
    div.remove();
}
