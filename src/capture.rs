//! Capture pipeline: turn a finalized selection into encoded pixels.
//!
//! A dedicated worker thread owns the [`Rasterizer`] and executes commands
//! sent from async callers, mirroring a browser's single raster thread.
//! Every capture moves its own [`CaptureRequest`] into the command, so
//! requests that overlap in time never share mutable state.

use crate::geometry::SelectionRect;
use crate::platform::ScrollMetrics;
use crate::{Error, Result};
use base64::Engine as Base64Engine;
use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, info, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

/// Snapshot taken when a gesture finalizes.
///
/// Geometry is viewport-relative; the scroll offset and document extents
/// come from one [`crate::platform::ViewportMetrics::read`] call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CaptureRequest {
    /// Gesture sequence number the request was built from
    pub gesture: u64,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub document_width: u32,
    pub document_height: u32,
    pub device_pixel_ratio: f32,
}

impl CaptureRequest {
    pub fn new(
        gesture: u64,
        rect: &SelectionRect,
        metrics: ScrollMetrics,
        device_pixel_ratio: f32,
    ) -> Self {
        CaptureRequest {
            gesture,
            left: rect.left,
            top: rect.top,
            width: rect.width,
            height: rect.height,
            scroll_x: metrics.scroll_x,
            scroll_y: metrics.scroll_y,
            document_width: metrics.document_width,
            document_height: metrics.document_height,
            device_pixel_ratio,
        }
    }

    /// Document-space region handed to the rasterizer
    pub fn region(&self) -> RasterRegion {
        RasterRegion {
            x: self.left + self.scroll_x,
            y: self.top + self.scroll_y,
            width: self.width,
            height: self.height,
            window_width: self.document_width,
            window_height: self.document_height,
            device_pixel_ratio: self.device_pixel_ratio,
        }
    }
}

impl fmt::Display for CaptureRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gesture #{} {}x{} at ({}, {}) scrolled ({}, {})",
            self.gesture, self.width, self.height, self.left, self.top, self.scroll_x, self.scroll_y
        )
    }
}

/// What the rasterizer is asked to paint, in document coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub window_width: u32,
    pub window_height: u32,
    pub device_pixel_ratio: f32,
}

impl RasterRegion {
    /// Output size in device pixels, at least 1x1
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpr = self.device_pixel_ratio as f64;
        (
            ((self.width * dpr).round() as u32).max(1),
            ((self.height * dpr).round() as u32).max(1),
        )
    }
}

/// Encoded image payload produced by a rasterizer
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn png(width: u32, height: u32, bytes: Vec<u8>) -> Self {
        EncodedImage {
            mime: "image/png".to_string(),
            width,
            height,
            bytes,
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureResult {
    pub request: CaptureRequest,
    pub image: EncodedImage,
    /// Hex SHA-256 of the encoded bytes
    pub digest: String,
}

/// The external pixel producer.
///
/// Implementations may fail for any reason; the pipeline turns every failure
/// (including a panic) into [`Error::RasterizationFailure`].
pub trait Rasterizer: Send {
    fn rasterize(&mut self, region: &RasterRegion) -> Result<EncodedImage>;
}

impl<F> Rasterizer for F
where
    F: FnMut(&RasterRegion) -> Result<EncodedImage> + Send,
{
    fn rasterize(&mut self, region: &RasterRegion) -> Result<EncodedImage> {
        self(region)
    }
}

/// Run on the worker when a capture fails, before the reply is sent.
/// Runs even if nobody awaits the capture's future.
pub type FailureHook = Box<dyn FnOnce(&Error) + Send>;

/// Holds a [`FailureHook`] until the capture settles. Dropping an armed
/// notice (the command never reached a live worker) reports cancellation.
struct FailureNotice(Option<FailureHook>);

impl FailureNotice {
    fn settle(mut self, res: &Result<CaptureResult>) {
        let hook = self.0.take();
        if let (Err(e), Some(hook)) = (res, hook) {
            hook(e);
        }
    }
}

impl Drop for FailureNotice {
    fn drop(&mut self) {
        if let Some(hook) = self.0.take() {
            hook(&Error::CaptureCanceled("capture worker has shut down".into()));
        }
    }
}

enum Command {
    Rasterize {
        request: CaptureRequest,
        resp: oneshot::Sender<Result<CaptureResult>>,
        notice: FailureNotice,
    },
    Close(oneshot::Sender<()>),
}

fn run_capture(rasterizer: &mut dyn Rasterizer, request: CaptureRequest) -> Result<CaptureResult> {
    let region = request.region();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| rasterizer.rasterize(&region)));
    let image = match outcome {
        Ok(Ok(image)) => image,
        Ok(Err(Error::RasterizationFailure { reason, .. })) => {
            return Err(Error::RasterizationFailure { request, reason })
        }
        Ok(Err(e)) => {
            return Err(Error::RasterizationFailure {
                request,
                reason: e.to_string(),
            })
        }
        Err(_) => {
            return Err(Error::RasterizationFailure {
                request,
                reason: "rasterizer panicked".to_string(),
            })
        }
    };
    let digest = hex::encode(Sha256::digest(&image.bytes));
    Ok(CaptureResult {
        request,
        image,
        digest,
    })
}

/// Handle to the capture worker. Cheap to clone.
#[derive(Clone)]
pub struct CapturePipeline {
    cmd_tx: Sender<Command>,
}

impl CapturePipeline {
    /// Spawn the worker thread that owns `rasterizer`.
    pub fn spawn<R>(rasterizer: R) -> Result<Self>
    where
        R: Rasterizer + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        thread::Builder::new()
            .name("rfsnip-capture".into())
            .spawn(move || {
                let mut rasterizer = rasterizer;
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        Command::Rasterize {
                            request,
                            resp,
                            notice,
                        } => {
                            let res = run_capture(&mut rasterizer, request);
                            notice.settle(&res);
                            let _ = resp.send(res);
                        }
                        Command::Close(resp) => {
                            let _ = resp.send(());
                            break;
                        }
                    }
                }
                debug!("capture worker exiting");
            })
            .map_err(|e| Error::Other(format!("Failed to spawn capture worker: {}", e)))?;

        Ok(Self { cmd_tx })
    }

    /// Queue `request` now and return a future for its result.
    ///
    /// The request is handed to the worker before this returns, so captures
    /// are rasterized in submission order even if their futures are polled
    /// out of order.
    pub fn submit(&self, request: CaptureRequest) -> BoxFuture<'static, Result<CaptureResult>> {
        self.submit_inner(request, None)
    }

    /// Like [`CapturePipeline::submit`], running `on_failure` if the capture
    /// fails or the worker is gone.
    pub fn submit_with(
        &self,
        request: CaptureRequest,
        on_failure: FailureHook,
    ) -> BoxFuture<'static, Result<CaptureResult>> {
        self.submit_inner(request, Some(on_failure))
    }

    fn submit_inner(
        &self,
        request: CaptureRequest,
        on_failure: Option<FailureHook>,
    ) -> BoxFuture<'static, Result<CaptureResult>> {
        let (tx, rx) = oneshot::channel();
        info!("capture started: {}", request);
        let cmd = Command::Rasterize {
            request,
            resp: tx,
            notice: FailureNotice(on_failure),
        };
        // A rejected command drops here, which fires its notice.
        let sent = self.cmd_tx.send(cmd).is_ok();
        async move {
            if !sent {
                return Err(Error::CaptureCanceled("capture worker has shut down".into()));
            }
            let res = rx
                .await
                .map_err(|e| Error::CaptureCanceled(format!("capture reply dropped: {}", e)))?;
            match &res {
                Ok(r) => info!(
                    "capture finished: gesture #{} -> {}x{} {}",
                    r.request.gesture, r.image.width, r.image.height, r.digest
                ),
                Err(e) => warn!("capture failed: {}", e),
            }
            res
        }
        .boxed()
    }

    pub async fn capture(&self, request: CaptureRequest) -> Result<CaptureResult> {
        self.submit(request).await
    }

    /// Stop the worker after it drains already queued captures.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Close(tx))
            .map_err(|_| Error::CaptureCanceled("capture worker already stopped".into()))?;
        rx.await
            .map_err(|e| Error::CaptureCanceled(format!("Close canceled: {}", e)))
    }
}
