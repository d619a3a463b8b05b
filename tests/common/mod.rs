//! In-process stand-in for Chrome.
//!
//! `FakeEngine` renders every item into a real PNG whose size depends on the
//! sizing policy and on the item's position in the batch, so ordering and
//! per-page dimensions are observable in the assembled PDF.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tweetpress::{Error, RenderEngine, RenderSession, RenderedImage, Result, SizingPolicy};

#[derive(Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub live: AtomicUsize,
    pub markups: Mutex<Vec<String>>,
}

#[derive(Clone, Default)]
pub struct FakeEngine {
    pub counters: Arc<Counters>,
    /// Fail the render of the item at this position
    pub fail_at: Option<usize>,
    /// Refuse to start, like a missing Chrome binary
    pub unavailable: bool,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub fn markups(&self) -> Vec<String> {
        self.counters.markups.lock().unwrap().clone()
    }
}

pub struct FakeSession {
    counters: Arc<Counters>,
    fail_at: Option<usize>,
    rendered: usize,
    closed: bool,
}

#[async_trait]
impl RenderEngine for FakeEngine {
    type Session = FakeSession;

    async fn open(&self) -> Result<FakeSession> {
        if self.unavailable {
            return Err(Error::EngineUnavailable("no browser binary".into()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            counters: self.counters.clone(),
            fail_at: self.fail_at,
            rendered: 0,
            closed: false,
        })
    }
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn render_to_image(&mut self, markup: &str, sizing: &SizingPolicy) -> Result<RenderedImage> {
        let index = self.rendered;
        self.rendered += 1;
        if self.fail_at == Some(index) {
            return Err(Error::RenderTimeout(25));
        }
        self.counters.markups.lock().unwrap().push(markup.to_string());

        let (width, height) = fake_size(sizing, index);
        RenderedImage::from_png(solid_png(width, height), 0)
    }

    async fn close(mut self) -> Result<()> {
        self.closed = true;
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        if !self.closed {
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Scaled-down capture size; height grows with the batch position
pub fn fake_size(sizing: &SizingPolicy, index: usize) -> (u32, u32) {
    let step = 3 * index as u32;
    match sizing {
        SizingPolicy::Fixed(v) => (v.width / 10, v.height / 10 + step),
        SizingPolicy::FitContent { width } => (width / 10, 20 + step),
        SizingPolicy::FitElement { viewport, .. } => (viewport.width / 10, viewport.height / 20 + step),
    }
}

pub fn solid_png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().expect("png header");
        let pixels = vec![0x40u8; (width * height * 4) as usize];
        writer.write_image_data(&pixels).expect("png data");
    }
    out
}

/// Page MediaBoxes of a PDF, in page order
pub fn page_sizes(pdf: &[u8]) -> Vec<(i64, i64)> {
    let doc = lopdf::Document::load_mem(pdf).expect("valid pdf");
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_object(*id).unwrap().as_dict().unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            (media_box[2].as_i64().unwrap(), media_box[3].as_i64().unwrap())
        })
        .collect()
}
