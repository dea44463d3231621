//! Animated "liquid chrome" WebGL background for web pages.
//!
//! The browser side lives in the `wasm` module and is only compiled for
//! `wasm32`. The remaining modules are plain Rust and build (and test) on
//! any host.

pub mod config;
pub mod error;
pub mod frame;
pub mod reference;
pub mod shader;

pub use config::ChromeConfig;
pub use error::{ChromeError, ShaderStage};
pub use shader::ShaderSources;
pub use frame::{ClientRect, FrameState, FrameUniforms, Pointer, SurfaceSize};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    use crate::config::ChromeConfig;

    pub mod chrome;
    mod program;

    /// Selector of the landing-page element that gets the background.
    const HERO_SELECTOR: &str = ".hero-background";

    thread_local! {
        // Lives for the page; dropping it would tear the effect down.
        static HERO: RefCell<Option<chrome::LiquidChrome>> = const { RefCell::new(None) };
    }

    fn init_logging() {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();
        // A second init (tests, repeated start) only reports that a logger exists.
        console_log::init_with_level(log::Level::Info).ok();
    }

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        init_logging();

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let Some(hero) = document.query_selector(HERO_SELECTOR)? else {
            log::debug!("no {HERO_SELECTOR} element, background not mounted");
            return Ok(());
        };
        let hero = hero.dyn_into::<web_sys::HtmlElement>()?;

        let chrome = chrome::LiquidChrome::new(hero, ChromeConfig::hero())?;
        HERO.with(|slot| *slot.borrow_mut() = Some(chrome));
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::chrome::{acquire_webgl, create, LiquidChrome};
