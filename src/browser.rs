use crate::cdp::CdpPage;
use crate::engine::{RenderEngine, RenderSession, SizingPolicy};
use crate::model::RenderedImage;
use crate::{EngineConfig, Error, Result};
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Render(String, SizingPolicy, oneshot::Sender<Result<Vec<u8>>>),
    Close(oneshot::Sender<Result<()>>),
}

/// Chrome-backed [`RenderEngine`].
///
/// Each [`open`](RenderEngine::open) launches a fresh Chrome process on its
/// own worker thread, so concurrent requests never share a page.
#[derive(Debug, Clone, Default)]
pub struct ChromeEngine {
    config: EngineConfig,
}

impl ChromeEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

/// An async-friendly session backed by a dedicated worker thread.
///
/// The worker thread owns the blocking [`CdpPage`] and executes commands sent
/// from async tasks. When the session is dropped the command channel closes,
/// the worker loop ends and the Chrome process is torn down with it.
pub struct ChromeSession {
    cmd_tx: Sender<Command>,
}

#[async_trait]
impl RenderEngine for ChromeEngine {
    type Session = ChromeSession;

    async fn open(&self) -> Result<ChromeSession> {
        let config = self.config.clone();

        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::Builder::new()
            .name("chrome-session".into())
            .spawn(move || {
                // Launch Chrome on the worker thread
                let page = match CdpPage::launch(config) {
                    Ok(p) => p,
                    Err(err) => {
                        let _ = init_tx.send(Err(err));
                        return;
                    }
                };

                let _ = init_tx.send(Ok(()));

                // Command loop
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        Command::Render(markup, sizing, resp) => {
                            let res = page.render(&markup, &sizing);
                            let _ = resp.send(res);
                        }
                        Command::Close(resp) => {
                            let _ = resp.send(page.close());
                            return;
                        }
                    }
                }

                debug!("Chrome session dropped without close; shutting down");
                if let Err(e) = page.close() {
                    warn!("Failed to shut down abandoned Chrome session: {}", e);
                }
            })
            .map_err(|e| Error::EngineUnavailable(format!("Failed to spawn session thread: {}", e)))?;

        // Wait for the worker to report launch success or failure
        init_rx
            .await
            .map_err(|e| Error::EngineUnavailable(format!("Session worker exited during launch: {}", e)))??;

        Ok(ChromeSession { cmd_tx })
    }
}

#[async_trait]
impl RenderSession for ChromeSession {
    async fn render_to_image(&mut self, markup: &str, sizing: &SizingPolicy) -> Result<RenderedImage> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Render(markup.to_string(), sizing.clone(), tx))
            .map_err(|_| Error::EngineCrashed("Session worker is gone".into()))?;
        let png = rx
            .await
            .map_err(|e| Error::EngineCrashed(format!("Render canceled: {}", e)))??;
        RenderedImage::from_png(png, 0)
    }

    async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Close(tx))
            .map_err(|_| Error::EngineCrashed("Session worker is gone".into()))?;
        rx.await
            .map_err(|e| Error::EngineCrashed(format!("Close canceled: {}", e)))?
    }
}
