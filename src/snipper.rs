//! The snipping session: wires input events through the activation gate and
//! the selection machine, and hands finalized selections to the capture
//! pipeline.
//!
//! Events can only be delivered through an [`Attachment`]. Dropping the
//! attachment detaches the session: any drag is abandoned, the overlay is
//! hidden and the cursor goes back to the default.

use crate::activation::{ActivationGate, ActivationTarget, HoverAffordance};
use crate::capture::{CapturePipeline, CaptureRequest, CaptureResult, Rasterizer};
use crate::coalesce::MoveCoalescer;
use crate::geometry::{PointerPoint, SelectionRect};
use crate::platform::{CursorStyle, PlatformApi, ViewportMetrics};
use crate::rendering::document::NodeId;
use crate::rendering::ContentHost;
use crate::selection::{Finalization, GestureState, SelectionMachine};
use crate::{Error, Result, SnipConfig};
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Input delivered by the host, in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerOver { target: Option<NodeId> },
    PointerOut { target: Option<NodeId> },
    PointerDown { point: PointerPoint, target: Option<NodeId> },
    PointerMove { point: PointerPoint },
    PointerUp { point: PointerPoint },
    Scroll,
    /// Abandon the active drag (escape key, lost pointer capture)
    Cancel,
    /// Animation-frame tick; applies coalesced moves
    Frame,
}

/// A capture in flight. Resolves once the rasterizer is done.
///
/// A failed capture hides its gesture's overlay on the capture worker, so
/// dropping the future unpolled still leaves no stale overlay behind.
pub type PendingCapture = BoxFuture<'static, Result<CaptureResult>>;

fn lock(machine: &Mutex<SelectionMachine>) -> MutexGuard<'_, SelectionMachine> {
    machine.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Snipper {
    config: SnipConfig,
    host: ContentHost,
    gate: ActivationGate,
    machine: Arc<Mutex<SelectionMachine>>,
    hover: HoverAffordance,
    viewport: Arc<dyn ViewportMetrics>,
    coalescer: MoveCoalescer,
    pipeline: CapturePipeline,
}

impl Snipper {
    /// Render `config.content` and start a capture worker around `rasterizer`.
    pub fn new<R>(config: SnipConfig, platform: &dyn PlatformApi, rasterizer: R) -> Result<Self>
    where
        R: Rasterizer + 'static,
    {
        config.validate()?;
        let host = ContentHost::render(&config)?;
        Self::build(config, host, platform, rasterizer)
    }

    /// Use already rendered content
    pub fn with_host<R>(
        config: SnipConfig,
        host: ContentHost,
        platform: &dyn PlatformApi,
        rasterizer: R,
    ) -> Result<Self>
    where
        R: Rasterizer + 'static,
    {
        config.validate()?;
        Self::build(config, host, platform, rasterizer)
    }

    /// Render and capture with the built-in paint rasterizer
    #[cfg(feature = "raster")]
    pub fn with_paint_rasterizer(config: SnipConfig, platform: &dyn PlatformApi) -> Result<Self> {
        config.validate()?;
        let host = ContentHost::render(&config)?;
        let rasterizer = host.rasterizer();
        Self::build(config, host, platform, rasterizer)
    }

    /// Assemble a session from a validated config.
    fn build<R>(
        config: SnipConfig,
        host: ContentHost,
        platform: &dyn PlatformApi,
        rasterizer: R,
    ) -> Result<Self>
    where
        R: Rasterizer + 'static,
    {
        let viewport = platform.viewport();
        viewport.content_rendered(config.viewport, host.extents());
        let pipeline = CapturePipeline::spawn(rasterizer)?;
        Ok(Self {
            gate: ActivationGate::new(&config.activation_prefix, &config.annotated_tag),
            config,
            host,
            machine: Arc::new(Mutex::new(SelectionMachine::new())),
            hover: HoverAffordance::new(platform.cursor()),
            viewport,
            coalescer: MoveCoalescer::new(),
            pipeline,
        })
    }

    /// Start receiving events. Events stop when the returned guard drops.
    pub fn attach(&mut self) -> Attachment<'_> {
        debug!("snipper attached");
        Attachment { snipper: self }
    }

    pub fn config(&self) -> &SnipConfig {
        &self.config
    }

    pub fn host(&self) -> &ContentHost {
        &self.host
    }

    pub fn state(&self) -> GestureState {
        *lock(&self.machine).state()
    }

    pub fn overlay(&self) -> SelectionRect {
        lock(&self.machine).overlay()
    }

    pub fn cursor(&self) -> CursorStyle {
        self.hover.current()
    }

    pub fn classify(&self, target: Option<NodeId>) -> ActivationTarget {
        self.gate.classify(self.host.document(), target)
    }

    /// Element under a viewport point, for hosts that only report coordinates
    pub fn target_at(&self, point: PointerPoint) -> Option<NodeId> {
        let metrics = self.viewport.read().ok()?;
        self.host.hit_test(point, metrics.scroll_x, metrics.scroll_y)
    }

    /// Stop the capture worker once queued captures finish
    pub async fn close(self) -> Result<()> {
        self.pipeline.close().await
    }

    fn apply_pending_move(&mut self) {
        if let Some(point) = self.coalescer.flush() {
            lock(&self.machine).pointer_move(point);
        }
    }

    fn handle(&mut self, event: InputEvent) -> Option<PendingCapture> {
        match event {
            InputEvent::PointerOver { target } => {
                let class = self.classify(target);
                self.hover.set(class.cursor());
                None
            }
            InputEvent::PointerOut { .. } => {
                self.hover.reset();
                None
            }
            InputEvent::PointerDown { point, target } => {
                let class = self.classify(target);
                lock(&self.machine).pointer_down(point, class.starts_gesture());
                None
            }
            InputEvent::PointerMove { point } => {
                let mut machine = lock(&self.machine);
                if !machine.is_dragging() {
                    return None;
                }
                if self.config.coalesce_moves {
                    self.coalescer.push(point);
                } else {
                    machine.pointer_move(point);
                }
                None
            }
            InputEvent::Frame => {
                self.apply_pending_move();
                None
            }
            InputEvent::PointerUp { point } => {
                self.apply_pending_move();
                let fin = lock(&self.machine).pointer_up(Some(point));
                match fin {
                    Finalization::Capture { gesture, rect } => Some(self.start_capture(gesture, rect)),
                    Finalization::Degenerate { .. } | Finalization::NotDragging => None,
                }
            }
            InputEvent::Scroll => {
                self.apply_pending_move();
                if lock(&self.machine).scroll() {
                    debug!("overlay hidden after scroll");
                }
                None
            }
            InputEvent::Cancel => {
                self.coalescer.clear();
                lock(&self.machine).cancel();
                None
            }
        }
    }

    /// Snapshot metrics and submit. Failures hide this gesture's overlay.
    fn start_capture(&self, gesture: u64, rect: SelectionRect) -> PendingCapture {
        let metrics = match self.viewport.read() {
            Ok(m) => m,
            Err(e) => {
                warn!("gesture #{}: capture aborted: {}", gesture, e);
                lock(&self.machine).clear_if(gesture);
                return future::ready(Err::<CaptureResult, _>(e)).boxed();
            }
        };
        let request = CaptureRequest::new(gesture, &rect, metrics, self.config.device_pixel_ratio);
        let machine = self.machine.clone();
        self.pipeline.submit_with(
            request,
            Box::new(move |_: &Error| {
                if lock(&machine).clear_if(gesture) {
                    info!("gesture #{}: overlay cleared after failed capture", gesture);
                }
            }),
        )
    }

    fn detach(&mut self) {
        self.coalescer.clear();
        {
            let mut machine = lock(&self.machine);
            machine.cancel();
            machine.scroll();
        }
        self.hover.reset();
        debug!("snipper detached");
    }
}

/// Scoped event subscription for a [`Snipper`]
pub struct Attachment<'a> {
    snipper: &'a mut Snipper,
}

impl Attachment<'_> {
    /// Deliver one event. Returns a pending capture when a gesture finalized
    /// with a non-empty selection.
    pub fn dispatch(&mut self, event: InputEvent) -> Option<PendingCapture> {
        self.snipper.handle(event)
    }

    pub fn snipper(&self) -> &Snipper {
        self.snipper
    }
}

impl Drop for Attachment<'_> {
    fn drop(&mut self) {
        self.snipper.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{EncodedImage, RasterRegion};
    use crate::platform::HeadlessPlatform;
    use crate::platform::cursor::CursorSink;

    const PAGE: &str = r#"<div id="overlay-1"><p id="para">Hello world</p></div><p><span id="note">n</span></p>"#;

    fn snipper(coalesce: bool) -> (Snipper, HeadlessPlatform) {
        let platform = HeadlessPlatform::default();
        let config = SnipConfig {
            content: format!("{}{}", PAGE, "<p>filler</p>".repeat(60)),
            coalesce_moves: coalesce,
            ..Default::default()
        };
        let s = Snipper::new(config, &platform, |r: &RasterRegion| -> Result<EncodedImage> {
            let (w, h) = r.pixel_size();
            Ok(EncodedImage::png(w, h, vec![1]))
        })
        .unwrap();
        (s, platform)
    }

    fn id(s: &Snipper, name: &str) -> Option<NodeId> {
        s.host().document().find_by_id(name)
    }

    #[test]
    fn hover_sets_and_resets_cursor() {
        let (mut s, platform) = snipper(false);
        let para = id(&s, "para");
        let note = id(&s, "note");
        let mut a = s.attach();
        a.dispatch(InputEvent::PointerOver { target: para });
        assert_eq!(a.snipper().cursor(), CursorStyle::Crosshair);
        a.dispatch(InputEvent::PointerOver { target: note });
        assert_eq!(a.snipper().cursor(), CursorStyle::Pointer);
        a.dispatch(InputEvent::PointerOut { target: note });
        assert_eq!(platform.cursor.cursor(), CursorStyle::Default);
        // hovering never starts a gesture
        assert!(!a.snipper().state().is_dragging());
    }

    #[tokio::test]
    async fn coalesced_moves_apply_on_frame_and_release() {
        let (mut s, _platform) = snipper(true);
        let para = id(&s, "para");
        let mut a = s.attach();
        a.dispatch(InputEvent::PointerDown {
            point: PointerPoint::new(10.0, 10.0),
            target: para,
        });
        a.dispatch(InputEvent::PointerMove { point: PointerPoint::new(20.0, 20.0) });
        a.dispatch(InputEvent::PointerMove { point: PointerPoint::new(30.0, 40.0) });
        assert_eq!(a.snipper().overlay().width, 0.0);
        a.dispatch(InputEvent::Frame);
        let r = a.snipper().overlay();
        assert_eq!((r.width, r.height), (20.0, 30.0));

        // a buffered move lands before scroll is handled, drag continues
        a.dispatch(InputEvent::PointerMove { point: PointerPoint::new(50.0, 70.0) });
        a.dispatch(InputEvent::Scroll);
        assert!(a.snipper().state().is_dragging());
        let r = a.snipper().overlay();
        assert_eq!((r.width, r.height), (40.0, 60.0));

        // and before release finalizes; nothing is left over for the next gesture
        a.dispatch(InputEvent::PointerMove { point: PointerPoint::new(90.0, 20.0) });
        let pending = a
            .dispatch(InputEvent::PointerUp { point: PointerPoint::new(90.0, 20.0) })
            .expect("capture");
        let capture = pending.await.unwrap();
        assert_eq!((capture.request.width, capture.request.height), (80.0, 10.0));

        a.dispatch(InputEvent::PointerDown {
            point: PointerPoint::new(5.0, 5.0),
            target: para,
        });
        a.dispatch(InputEvent::Frame);
        let r = a.snipper().overlay();
        assert_eq!((r.left, r.top, r.width, r.height), (5.0, 5.0, 0.0, 0.0));
    }

    #[test]
    fn detach_cancels_drag_and_resets_cursor() {
        let (mut s, platform) = snipper(false);
        let para = id(&s, "para");
        {
            let mut a = s.attach();
            a.dispatch(InputEvent::PointerOver { target: para });
            a.dispatch(InputEvent::PointerDown {
                point: PointerPoint::new(10.0, 10.0),
                target: para,
            });
            a.dispatch(InputEvent::PointerMove { point: PointerPoint::new(50.0, 50.0) });
            assert!(a.snipper().overlay().visible);
        }
        assert!(!s.state().is_dragging());
        assert!(!s.overlay().visible);
        assert_eq!(platform.cursor.cursor(), CursorStyle::Default);
    }

    #[test]
    fn cancel_drops_the_gesture_without_capture() {
        let (mut s, _platform) = snipper(false);
        let para = id(&s, "para");
        let mut a = s.attach();
        a.dispatch(InputEvent::PointerDown {
            point: PointerPoint::new(10.0, 10.0),
            target: para,
        });
        a.dispatch(InputEvent::PointerMove { point: PointerPoint::new(50.0, 50.0) });
        a.dispatch(InputEvent::Cancel);
        assert!(a
            .dispatch(InputEvent::PointerUp { point: PointerPoint::new(50.0, 50.0) })
            .is_none());
        assert!(!a.snipper().overlay().visible);
    }

    #[tokio::test]
    async fn unmounted_viewport_aborts_capture() {
        let (mut s, platform) = snipper(false);
        let para = id(&s, "para");
        let pending = {
            let mut a = s.attach();
            a.dispatch(InputEvent::PointerDown {
                point: PointerPoint::new(10.0, 10.0),
                target: para,
            });
            platform.viewport.unmount();
            a.dispatch(InputEvent::PointerUp { point: PointerPoint::new(60.0, 30.0) })
                .expect("non-empty selection should start a capture")
        };
        assert!(matches!(pending.await, Err(Error::MetricsUnavailable(_))));
        assert!(!s.overlay().visible);
    }

    #[test]
    fn constructor_syncs_rendered_extents_into_viewport() {
        let (s, platform) = snipper(false);
        let (w, h) = s.host().extents();
        assert!(h > 720);
        let m = platform.viewport.read().unwrap();
        assert_eq!((m.document_width, m.document_height), (w, h));
        // scrolling to the end is possible, and no further
        platform.viewport.scroll_to(0.0, 1.0e6);
        assert_eq!(platform.viewport.read().unwrap().scroll_y, (h - 720) as f64);
    }

    #[test]
    fn invalid_config_is_rejected_before_rendering() {
        let platform = HeadlessPlatform::default();
        let config = SnipConfig {
            device_pixel_ratio: 0.0,
            ..Default::default()
        };
        let res = Snipper::new(config, &platform, |_: &RasterRegion| -> Result<EncodedImage> {
            Ok(EncodedImage::png(1, 1, Vec::new()))
        });
        assert!(matches!(res, Err(Error::ConfigError(_))));
        // the platform was never touched
        assert_eq!(platform.viewport.read().unwrap().document_height, 720);
    }

    #[test]
    fn target_at_uses_layout_and_scroll() {
        let (s, platform) = snipper(false);
        let para = id(&s, "para").unwrap();
        let rect = s.host().layout().find(para).unwrap().lb.rect;
        platform.viewport.scroll_to(0.0, 4.0);
        let point = PointerPoint::new(rect.x as f64 + 1.0, rect.y as f64 - 3.0);
        assert_eq!(s.target_at(point), Some(para));
    }
}
