//! Batch image production
//!
//! One batch = one browser session. Items are rendered one after another in
//! the same session and the session is closed on every exit path. A failure
//! on any item fails the whole batch; callers never see partial results.

use crate::engine::{RenderEngine, RenderSession, SizingPolicy};
use crate::model::{ContentItem, RenderedImage};
use crate::template::{self, LayoutVariant};
use crate::Result;
use log::{debug, info, warn};

pub struct BatchImageProducer<E> {
    engine: E,
}

impl<E: RenderEngine> BatchImageProducer<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Render `items` with the variant's own sizing policy.
    pub async fn produce(&self, items: &[ContentItem], variant: LayoutVariant) -> Result<Vec<RenderedImage>> {
        self.produce_with(items, variant, &variant.sizing_policy()).await
    }

    /// Render `items` with an explicit sizing policy. The result is
    /// index-aligned with `items`.
    pub async fn produce_with(
        &self,
        items: &[ContentItem],
        variant: LayoutVariant,
        sizing: &SizingPolicy,
    ) -> Result<Vec<RenderedImage>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut session = self.engine.open().await?;
        let rendered = render_all(&mut session, items, variant, sizing).await;
        let closed = session.close().await;

        match (rendered, closed) {
            (Ok(images), Ok(())) => {
                info!("Rendered {} {} image(s)", images.len(), variant.as_str());
                Ok(images)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!("Failed to close session after render error: {}", close_err);
                }
                Err(e)
            }
        }
    }
}

async fn render_all<S: RenderSession>(
    session: &mut S,
    items: &[ContentItem],
    variant: LayoutVariant,
    sizing: &SizingPolicy,
) -> Result<Vec<RenderedImage>> {
    let mut images = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let markup = template::render(item, variant);
        let image = session
            .render_to_image(&markup, sizing)
            .await
            .map_err(|e| {
                warn!("Item {} of {} failed: {}", index + 1, items.len(), e);
                e
            })?
            .with_source_index(index);
        debug!(
            "Item {} rendered at {}x{}",
            index + 1,
            image.width(),
            image.height()
        );
        images.push(image);
    }
    Ok(images)
}
