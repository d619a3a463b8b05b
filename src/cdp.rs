//! Chrome DevTools Protocol driver (uses the blocking `headless_chrome` crate)
//!
//! [`CdpPage`] owns one Chrome process and a single tab. Every render
//! navigates the tab to a blank document first, so items never see each
//! other's DOM. The async wrapper in [`crate::browser`] runs this type on a
//! dedicated thread.

use crate::engine::SizingPolicy;
use crate::{EngineConfig, Error, Result, Viewport};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::{Emulation, Page, DOM};
use headless_chrome::types::Bounds;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, warn};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Bounded settle primitive. Resolves to `"settled"` once the optional ready
/// selector has a laid-out box and every image has either loaded or failed,
/// or to `"timeout"` when the deadline passes first.
const SETTLE_TEMPLATE: &str = r#"(() => {
    const selector = {{SELECTOR}};
    const whenSelector = () => new Promise((resolve) => {
        if (selector === null) return resolve();
        const ready = () => {
            const el = document.querySelector(selector);
            return !!el && el.getBoundingClientRect().height > 0;
        };
        if (ready()) return resolve();
        const observer = new MutationObserver(() => {
            if (ready()) { observer.disconnect(); resolve(); }
        });
        observer.observe(document.documentElement, { childList: true, subtree: true, attributes: true });
    });
    const whenImages = () => Promise.all(Array.from(document.images).map((img) => {
        if (img.complete) return Promise.resolve();
        return new Promise((resolve) => {
            img.addEventListener('load', resolve, { once: true });
            img.addEventListener('error', resolve, { once: true });
        });
    }));
    const settled = whenSelector()
        .then(whenImages)
        .then(() => document.fonts ? document.fonts.ready : null)
        .then(() => 'settled');
    const deadline = new Promise((resolve) => setTimeout(() => resolve('timeout'), {{TIMEOUT_MS}}));
    return Promise.race([settled, deadline]);
})()"#;

const ELEMENT_RECT_TEMPLATE: &str = r#"(() => {
    const el = document.querySelector({{SELECTOR}});
    if (!el) return null;
    const r = el.getBoundingClientRect();
    return JSON.stringify({ x: r.x + window.scrollX, y: r.y + window.scrollY, width: r.width, height: r.height });
})()"#;

const BODY_HEIGHT_SCRIPT: &str = "Math.ceil(document.body.getBoundingClientRect().height)";

#[derive(Debug, Deserialize)]
struct ElementRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Capture rectangle in whole CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Clip {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Clip {
    fn of_viewport(viewport: Viewport) -> Self {
        Clip {
            x: 0,
            y: 0,
            width: viewport.width,
            height: viewport.height,
        }
    }

    /// Grow fractional element bounds outwards to whole pixels
    fn enclosing(rect: &ElementRect) -> Self {
        let x = rect.x.max(0.0).floor();
        let y = rect.y.max(0.0).floor();
        let right = (rect.x + rect.width).ceil();
        let bottom = (rect.y + rect.height).ceil();
        Clip {
            x: x as u32,
            y: y as u32,
            width: (right - x).max(1.0) as u32,
            height: (bottom - y).max(1.0) as u32,
        }
    }

    fn to_cdp(self) -> Page::Viewport {
        Page::Viewport {
            x: self.x as f64,
            y: self.y as f64,
            width: self.width as f64,
            height: self.height as f64,
            scale: 1.0,
        }
    }
}

/// One Chrome process with one tab
pub struct CdpPage {
    browser: Browser,
    tab: Arc<Tab>,
    config: EngineConfig,
}

impl CdpPage {
    /// Launch Chrome. Any launch failure is `Error::EngineUnavailable`.
    pub fn launch(config: EngineConfig) -> Result<Self> {
        let initial = Viewport::default();
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(config.sandbox)
            .path(config.chrome_path.clone())
            .window_size(Some((initial.width, initial.height)))
            .idle_browser_timeout(Duration::from_millis(
                config.navigation_timeout_ms + config.settle_timeout_ms,
            ))
            .build()
            .map_err(|e| Error::EngineUnavailable(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::EngineUnavailable(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::EngineUnavailable(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(Duration::from_millis(config.navigation_timeout_ms));

        debug!("Chrome launched (sandbox: {})", config.sandbox);
        Ok(Self { browser, tab, config })
    }

    /// Render `markup` and return the PNG bytes of the capture
    pub fn render(&self, markup: &str, sizing: &SizingPolicy) -> Result<Vec<u8>> {
        self.resize(sizing.initial_viewport())?;
        self.load_markup(markup)?;
        self.settle(sizing.ready_selector())?;

        let clip = match sizing {
            SizingPolicy::Fixed(viewport) => Clip::of_viewport(*viewport),
            SizingPolicy::FitContent { width } => {
                let height = self.body_height()?;
                let fitted = Viewport {
                    width: *width,
                    height,
                };
                self.resize(fitted)?;
                Clip::of_viewport(fitted)
            }
            SizingPolicy::FitElement { selector, viewport } => {
                let clip = self.element_clip(selector)?;
                let needed = Viewport {
                    width: viewport.width.max(clip.x + clip.width),
                    height: viewport.height.max(clip.y + clip.height),
                };
                if needed != *viewport {
                    self.resize(needed)?;
                }
                clip
            }
        };

        self.tab
            .capture_screenshot(
                Page::CaptureScreenshotFormatOption::Png,
                None,
                Some(clip.to_cdp()),
                true,
            )
            .map_err(|e| self.cdp_error(e))
    }

    fn load_markup(&self, markup: &str) -> Result<()> {
        self.tab
            .navigate_to("about:blank")
            .map_err(|e| self.cdp_error(e))?
            .wait_until_navigated()
            .map_err(|e| self.cdp_error(e))?;

        self.tab
            .call_method(Emulation::SetDefaultBackgroundColorOverride {
                color: Some(DOM::RGBA {
                    r: 0,
                    g: 0,
                    b: 0,
                    a: Some(0.0),
                }),
            })
            .map_err(|e| self.cdp_error(e))?;

        // A JSON string literal is a valid JS string literal
        let literal = serde_json::to_string(markup)
            .map_err(|e| Error::RenderFailed(format!("Failed to encode markup: {}", e)))?;
        self.tab
            .evaluate(
                &format!("document.open(); document.write({}); document.close();", literal),
                false,
            )
            .map_err(|e| self.cdp_error(e))?;
        Ok(())
    }

    fn settle(&self, ready_selector: Option<&str>) -> Result<()> {
        let selector = match ready_selector {
            Some(s) => serde_json::to_string(s)
                .map_err(|e| Error::RenderFailed(format!("Failed to encode selector: {}", e)))?,
            None => "null".to_string(),
        };
        let script = SETTLE_TEMPLATE
            .replace("{{SELECTOR}}", &selector)
            .replace("{{TIMEOUT_MS}}", &self.config.settle_timeout_ms.to_string());

        let outcome = self
            .tab
            .evaluate(&script, true)
            .map_err(|e| self.cdp_error(e))?;

        match outcome.value.as_ref().and_then(|v| v.as_str()) {
            Some("settled") => Ok(()),
            Some("timeout") => {
                warn!(
                    "Resources did not settle within {}ms",
                    self.config.settle_timeout_ms
                );
                Err(Error::RenderTimeout(self.config.settle_timeout_ms))
            }
            other => Err(Error::RenderFailed(format!(
                "Unexpected settle result: {:?}",
                other
            ))),
        }
    }

    fn body_height(&self) -> Result<u32> {
        let eval = self
            .tab
            .evaluate(BODY_HEIGHT_SCRIPT, false)
            .map_err(|e| self.cdp_error(e))?;
        let height = eval
            .value
            .and_then(|v| v.as_f64())
            .ok_or_else(|| Error::RenderFailed("Body height was not a number".into()))?;
        if height < 1.0 {
            return Err(Error::RenderFailed("Content has no height".into()));
        }
        Ok(height.ceil() as u32)
    }

    fn element_clip(&self, selector: &str) -> Result<Clip> {
        let literal = serde_json::to_string(selector)
            .map_err(|e| Error::RenderFailed(format!("Failed to encode selector: {}", e)))?;
        let eval = self
            .tab
            .evaluate(&ELEMENT_RECT_TEMPLATE.replace("{{SELECTOR}}", &literal), false)
            .map_err(|e| self.cdp_error(e))?;

        let raw = eval
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::RenderFailed(format!("No element matches {}", selector)))?;
        let rect: ElementRect = serde_json::from_str(raw)
            .map_err(|e| Error::RenderFailed(format!("Bad element bounds: {}", e)))?;
        Ok(Clip::enclosing(&rect))
    }

    fn resize(&self, viewport: Viewport) -> Result<()> {
        self.tab
            .set_bounds(Bounds::Normal {
                left: Some(0),
                top: Some(0),
                width: Some(viewport.width as f64),
                height: Some(viewport.height as f64),
            })
            .map_err(|e| self.cdp_error(e))?;
        Ok(())
    }

    fn cdp_error(&self, err: anyhow::Error) -> Error {
        Error::from_cdp(err, self.config.navigation_timeout_ms)
    }

    /// Terminate the Chrome process
    pub fn close(self) -> Result<()> {
        // Dropping the browser kills the child process
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_bounds_round_outwards() {
        let clip = Clip::enclosing(&ElementRect {
            x: 10.4,
            y: 0.6,
            width: 100.2,
            height: 50.5,
        });
        assert_eq!(
            clip,
            Clip {
                x: 10,
                y: 0,
                width: 101,
                height: 52
            }
        );
    }

    #[test]
    fn settle_script_embeds_selector_and_deadline() {
        let script = SETTLE_TEMPLATE
            .replace("{{SELECTOR}}", "\".x\"")
            .replace("{{TIMEOUT_MS}}", "250");
        assert!(script.contains("const selector = \".x\";"));
        assert!(script.contains("resolve('timeout'), 250"));
    }

    #[test]
    fn test_cdp_page_launch() {
        // This test requires Chrome to be installed, so we skip it in CI
        if std::env::var("CI").is_ok() {
            return;
        }
        match CdpPage::launch(EngineConfig::default()) {
            Ok(page) => page.close().expect("close"),
            Err(e) => eprintln!(
                "Skipping CDP launch test because Chrome is not available or failed to launch: {}",
                e
            ),
        }
    }
}
