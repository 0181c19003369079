// SPDX-License-Identifier: GPL-3.0-only

//! Streaming driver shim
//!
//! [`StreamingCamera`] implements the whole [`DepthCamera`] contract on top
//! of a narrow [`FrameSource`]: a driver only has to hand over raw frames,
//! and gets the acquisition thread, snapshot publishing, vertex projection,
//! smoothing, audio queueing and the failure policy for free.
//!
//! # Threading
//!
//! `start()` moves the source onto an acquisition thread. Each raw frame is
//! validated, projected and smoothed there, then published as one immutable
//! [`FrameSnapshot`]. Capture calls clone the latest snapshot `Arc` and copy
//! out of it, so they never see a partially built frame and never wait on
//! the hardware.
//!
//! # Failure policy
//!
//! - `SourceEvent::Dropped` is transient and only logged, until
//!   `max_consecutive_drops` happen in a row.
//! - `SourceEvent::Disconnected` fails the device immediately.
//! - A failed device stays failed; every capture reports `DeviceFailed`.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use image::{ImageBuffer, Pixel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use super::DepthCamera;
use super::frame_loop::{AcquisitionLoop, LoopAction};
use super::snapshot::{AudioQueue, SnapshotSlot};
use super::types::*;
use crate::constants::{
    AUDIO_QUEUE_BYTES, FIRST_FRAME_TIMEOUT, IDLE_BACKOFF, MAX_CONSECUTIVE_DROPS,
};
use crate::errors::{CaptureError, CaptureResult};
use crate::pipelines::scene::{
    CameraIntrinsics, ColorRegistration, SmoothingConfig, VertexProjector, VertexSmoother,
};

/// Raw data delivered by a source for one device tick
///
/// Any subset of modalities may be present: sensors that run at different
/// rates deliver separately, and missing modalities carry over from the
/// previous snapshot.
#[derive(Debug, Clone, Default)]
pub struct RawFrame {
    /// Device timestamp in microseconds, non-decreasing
    pub timestamp_us: u64,
    pub depth: Option<DepthImage>,
    pub amplitude: Option<AmplitudeImage>,
    pub color: Option<ColorImage>,
    /// Audio bytes captured since the previous frame
    pub audio: Vec<u8>,
    pub acceleration: Option<Acceleration>,
}

/// Outcome of one source poll
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// New data
    Frame(RawFrame),
    /// Nothing new yet; the loop backs off briefly
    Idle,
    /// One frame was lost (transfer error, checksum); not surfaced to callers
    Dropped(String),
    /// The device is gone; the handle fails
    Disconnected(String),
}

/// Hardware-facing half of a driver
///
/// `capabilities` lists the raw modalities the source delivers (depth,
/// amplitude, color, audio, acceleration). Vertex and smoothed vertex
/// clouds are derived from depth by [`StreamingCamera`].
pub trait FrameSource: Send + 'static {
    /// Short name used in logs and thread names
    fn name(&self) -> &str;

    fn depth_size(&self) -> Size;

    fn color_size(&self) -> Size;

    fn capabilities(&self) -> Capabilities;

    /// Claim the device and begin streaming
    fn open(&mut self) -> Result<(), String>;

    /// Poll for the next event; must return within a bounded time
    fn next_event(&mut self) -> SourceEvent;
}

/// Tuning for [`StreamingCamera`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    pub smoothing: SmoothingConfig,
    /// Depth intrinsics; `None` uses the Kinect defaults scaled to the depth size
    pub intrinsics: Option<CameraIntrinsics>,
    /// Fixed depth-to-color pixel offset (x, y) in color pixels
    pub color_offset: [i32; 2],
    /// Upper bound on the wait for the first frame in `start()`
    pub first_frame_timeout_ms: u64,
    /// Dropped frames in a row before the device is declared failed
    pub max_consecutive_drops: u32,
    /// Audio bytes buffered between captures
    pub audio_queue_bytes: usize,
    /// Sleep when the source is idle
    pub idle_backoff_us: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            smoothing: SmoothingConfig::default(),
            intrinsics: None,
            color_offset: [0, 0],
            first_frame_timeout_ms: FIRST_FRAME_TIMEOUT.as_millis() as u64,
            max_consecutive_drops: MAX_CONSECUTIVE_DROPS,
            audio_queue_bytes: AUDIO_QUEUE_BYTES,
            idle_backoff_us: IDLE_BACKOFF.as_micros() as u64,
        }
    }
}

impl StreamingConfig {
    pub fn first_frame_timeout(&self) -> Duration {
        Duration::from_millis(self.first_frame_timeout_ms)
    }

    pub fn idle_backoff(&self) -> Duration {
        Duration::from_micros(self.idle_backoff_us)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.smoothing.validate()?;
        if self.max_consecutive_drops == 0 {
            return Err("max_consecutive_drops must be at least 1".to_string());
        }
        if self.first_frame_timeout_ms == 0 {
            return Err("first_frame_timeout_ms must be positive".to_string());
        }
        if let Some(intrinsics) = &self.intrinsics {
            if !(intrinsics.fx > 0.0 && intrinsics.fy > 0.0) {
                return Err("focal lengths must be positive".to_string());
            }
            if intrinsics.min_depth_mm >= intrinsics.max_depth_mm {
                return Err("min_depth_mm must be below max_depth_mm".to_string());
            }
        }
        Ok(())
    }
}

/// One published, immutable device state
///
/// Fields for modalities the source does not provide are `None`; fields
/// for provided modalities are always populated.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub stamp: FrameStamp,
    pub depth: Option<Arc<DepthImage>>,
    pub amplitude: Option<Arc<AmplitudeImage>>,
    pub color: Option<Arc<ColorImage>>,
    pub vertices: Option<Arc<Vec<PointXyzRgb>>>,
    pub smoothed: Option<Arc<Vec<PointXyzRgb>>>,
    pub acceleration: Option<Acceleration>,
}

/// State shared between the handle and its acquisition thread
struct Shared {
    name: String,
    state: Mutex<DeviceState>,
    snapshots: SnapshotSlot<FrameSnapshot>,
    audio: AudioQueue,
}

impl Shared {
    fn state(&self) -> DeviceState {
        match self.state.lock() {
            Ok(state) => state.clone(),
            Err(_) => DeviceState::Failed("device state lock poisoned".to_string()),
        }
    }

    fn set_running(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = DeviceState::Running;
        }
    }

    /// Enter the failed state; the first reason wins
    fn fail(&self, reason: &str) {
        if let Ok(mut state) = self.state.lock() {
            if state.is_failed() {
                return;
            }
            warn!(device = %self.name, reason, "Depth camera failed");
            *state = DeviceState::Failed(reason.to_string());
        }
    }
}

/// [`DepthCamera`] implementation driving a [`FrameSource`]
pub struct StreamingCamera<S: FrameSource> {
    /// Present until `start()` moves it onto the acquisition thread
    source: Mutex<Option<S>>,
    config: StreamingConfig,
    capabilities: Capabilities,
    /// (depth, color) sizes, known once started
    sizes: Option<(Size, Size)>,
    shared: Arc<Shared>,
    acquisition: Option<AcquisitionLoop>,
}

impl<S: FrameSource> StreamingCamera<S> {
    /// Wrap a source; nothing touches the hardware until `start()`
    pub fn new(source: S, config: StreamingConfig) -> Self {
        let name = source.name().to_string();
        let capabilities = derived_capabilities(source.capabilities());

        Self {
            source: Mutex::new(Some(source)),
            config: config.clone(),
            capabilities,
            sizes: None,
            shared: Arc::new(Shared {
                name,
                state: Mutex::new(DeviceState::Constructed),
                snapshots: SnapshotSlot::new(),
                audio: AudioQueue::new(config.audio_queue_bytes),
            }),
            acquisition: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Stamp of the most recent published snapshot
    pub fn latest_stamp(&self) -> Option<FrameStamp> {
        self.shared.snapshots.latest().map(|s| s.stamp)
    }

    /// Completed acquisition loop iterations (0 before start)
    pub fn acquisition_iterations(&self) -> u64 {
        self.acquisition
            .as_ref()
            .map(|a| a.iterations())
            .unwrap_or(0)
    }

    fn ensure_running(&self) -> CaptureResult<()> {
        match self.shared.state() {
            DeviceState::Constructed => Err(CaptureError::NotStarted),
            DeviceState::Running => Ok(()),
            DeviceState::Failed(reason) => Err(CaptureError::DeviceFailed(reason)),
        }
    }

    /// Latest snapshot for a capture of `modality`, after capability and state checks
    fn snapshot_for(&self, modality: Modality) -> CaptureResult<Arc<FrameSnapshot>> {
        if !self.capabilities.contains(modality) {
            return Err(CaptureError::Unsupported(modality));
        }
        self.ensure_running()?;
        self.shared
            .snapshots
            .latest()
            .ok_or_else(|| CaptureError::DeviceFailed("no frame published".to_string()))
    }

    /// Wait for the first snapshot, giving up early if the thread fails
    fn wait_for_first_frame(&self) -> Result<(), String> {
        let deadline = Instant::now() + self.config.first_frame_timeout();
        let slice = Duration::from_millis(10);

        loop {
            if self.shared.snapshots.wait_for_first(slice).is_some() {
                return Ok(());
            }
            if let DeviceState::Failed(reason) = self.shared.state() {
                return Err(reason);
            }
            if Instant::now() >= deadline {
                return Err(format!(
                    "no frame within {} ms",
                    self.config.first_frame_timeout_ms
                ));
            }
        }
    }

    fn abort_start(&mut self, reason: String) -> CaptureError {
        self.shared.fail(&reason);
        if let Some(mut acquisition) = self.acquisition.take() {
            acquisition.stop();
        }
        CaptureError::StartFailed(reason)
    }
}

impl<S: FrameSource> DepthCamera for StreamingCamera<S> {
    fn depth_size(&self) -> Size {
        self.sizes.map(|(depth, _)| depth).unwrap_or(Size::ZERO)
    }

    fn color_size(&self) -> Size {
        self.sizes.map(|(_, color)| color).unwrap_or(Size::ZERO)
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn state(&self) -> DeviceState {
        self.shared.state()
    }

    fn start(&mut self) -> CaptureResult<()> {
        match self.shared.state() {
            DeviceState::Constructed => {}
            DeviceState::Running => return Err(CaptureError::AlreadyStarted),
            DeviceState::Failed(reason) => return Err(CaptureError::DeviceFailed(reason)),
        }

        let mut source = self
            .source
            .get_mut()
            .ok()
            .and_then(Option::take)
            .ok_or(CaptureError::AlreadyStarted)?;

        if let Err(reason) = self.config.validate() {
            return Err(self.abort_start(format!("invalid configuration: {}", reason)));
        }

        info!(
            device = %self.shared.name,
            capabilities = ?self.capabilities.iter().collect::<Vec<_>>(),
            "Starting depth camera"
        );

        if let Err(reason) = source.open() {
            return Err(self.abort_start(reason));
        }

        let depth_size = source.depth_size();
        let color_size = source.color_size();
        let raw_caps = source.capabilities();
        if raw_caps.contains(Modality::Depth) && depth_size.is_empty() {
            return Err(self.abort_start("source reported an empty depth size".to_string()));
        }
        if raw_caps.contains(Modality::Color) && color_size.is_empty() {
            return Err(self.abort_start("source reported an empty color size".to_string()));
        }

        let geometry = raw_caps.contains(Modality::Depth).then(|| {
            let intrinsics = self
                .config
                .intrinsics
                .unwrap_or_else(|| CameraIntrinsics::default().scaled_to(depth_size));
            let registration =
                ColorRegistration::new(depth_size, color_size, self.config.color_offset);
            (
                VertexProjector::new(intrinsics, registration),
                VertexSmoother::new(self.config.smoothing, depth_size.area()),
            )
        });

        self.shared.set_running();

        let mut acquisition = Acquisition {
            source,
            shared: Arc::clone(&self.shared),
            raw_caps,
            depth_size,
            color_size,
            geometry,
            current: Current::default(),
            sequence: 0,
            last_timestamp_us: None,
            consecutive_drops: 0,
            max_consecutive_drops: self.config.max_consecutive_drops,
            idle_backoff: self.config.idle_backoff(),
        };

        let thread_name = format!("{}-acquisition", self.shared.name);
        match AcquisitionLoop::start(&thread_name, move || acquisition.step()) {
            Ok(controller) => self.acquisition = Some(controller),
            Err(e) => {
                return Err(self.abort_start(format!("failed to spawn acquisition thread: {}", e)));
            }
        }

        if let Err(reason) = self.wait_for_first_frame() {
            return Err(self.abort_start(reason));
        }

        self.sizes = Some((depth_size, color_size));
        info!(
            device = %self.shared.name,
            depth = %depth_size,
            color = %color_size,
            "Depth camera running"
        );
        Ok(())
    }

    fn capture_depth(&self, buffer: &mut DepthImage) -> CaptureResult<FrameStamp> {
        let snapshot = self.snapshot_for(Modality::Depth)?;
        let depth: &DepthImage = snapshot_field(&snapshot.depth, Modality::Depth)?;
        copy_image(depth, buffer, Modality::Depth, self.depth_size())?;
        Ok(snapshot.stamp)
    }

    fn capture_amplitude(&self, buffer: &mut AmplitudeImage) -> CaptureResult<FrameStamp> {
        let snapshot = self.snapshot_for(Modality::Amplitude)?;
        let amplitude: &AmplitudeImage = snapshot_field(&snapshot.amplitude, Modality::Amplitude)?;
        copy_image(amplitude, buffer, Modality::Amplitude, self.depth_size())?;
        Ok(snapshot.stamp)
    }

    fn capture_color(&self, buffer: &mut ColorImage) -> CaptureResult<FrameStamp> {
        let snapshot = self.snapshot_for(Modality::Color)?;
        let color: &ColorImage = snapshot_field(&snapshot.color, Modality::Color)?;
        copy_image(color, buffer, Modality::Color, self.color_size())?;
        Ok(snapshot.stamp)
    }

    fn capture_vertex(&self, buffer: &mut [PointXyzRgb]) -> CaptureResult<FrameStamp> {
        let snapshot = self.snapshot_for(Modality::Vertex)?;
        let vertices: &[PointXyzRgb] = snapshot_field(&snapshot.vertices, Modality::Vertex)?;
        copy_points(vertices, buffer, Modality::Vertex, self.depth_size())?;
        Ok(snapshot.stamp)
    }

    fn capture_moving_averaged_vertex(
        &self,
        buffer: &mut [PointXyzRgb],
    ) -> CaptureResult<FrameStamp> {
        let snapshot = self.snapshot_for(Modality::SmoothedVertex)?;
        let smoothed: &[PointXyzRgb] =
            snapshot_field(&snapshot.smoothed, Modality::SmoothedVertex)?;
        copy_points(smoothed, buffer, Modality::SmoothedVertex, self.depth_size())?;
        Ok(snapshot.stamp)
    }

    fn capture_audio(&self, buffer: &mut [u8]) -> CaptureResult<usize> {
        if !self.capabilities.contains(Modality::Audio) {
            return Err(CaptureError::Unsupported(Modality::Audio));
        }
        self.ensure_running()?;
        Ok(self.shared.audio.drain_into(buffer))
    }

    fn capture_acceleration(&self, acceleration: &mut Acceleration) -> CaptureResult<FrameStamp> {
        let snapshot = self.snapshot_for(Modality::Acceleration)?;
        *acceleration = *snapshot_field(&snapshot.acceleration, Modality::Acceleration)?;
        Ok(snapshot.stamp)
    }
}

/// Public capabilities: raw modalities plus the clouds derived from depth
fn derived_capabilities(raw: Capabilities) -> Capabilities {
    let mut caps = raw;
    caps.remove(Modality::Vertex);
    caps.remove(Modality::SmoothedVertex);
    if raw.contains(Modality::Depth) {
        caps.insert(Modality::Vertex);
        caps.insert(Modality::SmoothedVertex);
    }
    caps
}

fn snapshot_field<T>(field: &Option<T>, modality: Modality) -> CaptureResult<&T> {
    field
        .as_ref()
        .ok_or_else(|| CaptureError::DeviceFailed(format!("snapshot has no {} data", modality)))
}

/// Overwrite `dst` with `src` after checking the caller's shape
fn copy_image<P: Pixel>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    dst: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    modality: Modality,
    expected: Size,
) -> CaptureResult<()> {
    let actual = Size::of(dst);
    if actual != expected {
        return Err(CaptureError::BufferShape {
            modality,
            expected,
            actual,
        });
    }
    (**dst).copy_from_slice(src.as_raw());
    Ok(())
}

/// Overwrite `dst` with `src` after checking the caller's length
fn copy_points(
    src: &[PointXyzRgb],
    dst: &mut [PointXyzRgb],
    modality: Modality,
    depth_size: Size,
) -> CaptureResult<()> {
    let expected = depth_size.area();
    if dst.len() != expected {
        return Err(CaptureError::BufferLength {
            modality,
            expected,
            actual: dst.len(),
        });
    }
    dst.copy_from_slice(src);
    Ok(())
}

/// Latest value of every modality, as it will appear in the next snapshot
#[derive(Default)]
struct Current {
    depth: Option<Arc<DepthImage>>,
    amplitude: Option<Arc<AmplitudeImage>>,
    color: Option<Arc<ColorImage>>,
    vertices: Option<Arc<Vec<PointXyzRgb>>>,
    smoothed: Option<Arc<Vec<PointXyzRgb>>>,
    acceleration: Option<Acceleration>,
}

/// Acquisition-thread half of a [`StreamingCamera`]
struct Acquisition<S: FrameSource> {
    source: S,
    shared: Arc<Shared>,
    raw_caps: Capabilities,
    depth_size: Size,
    color_size: Size,
    geometry: Option<(VertexProjector, VertexSmoother)>,
    current: Current,
    sequence: u64,
    last_timestamp_us: Option<u64>,
    consecutive_drops: u32,
    max_consecutive_drops: u32,
    idle_backoff: Duration,
}

impl<S: FrameSource> Acquisition<S> {
    fn step(&mut self) -> LoopAction {
        match self.source.next_event() {
            SourceEvent::Frame(frame) => self.handle_frame(frame),
            SourceEvent::Idle => {
                thread::sleep(self.idle_backoff);
                LoopAction::Continue
            }
            SourceEvent::Dropped(reason) => self.drop_frame(&reason),
            SourceEvent::Disconnected(reason) => {
                self.shared.fail(&format!("disconnected: {}", reason));
                LoopAction::Stop
            }
        }
    }

    fn drop_frame(&mut self, reason: &str) -> LoopAction {
        self.consecutive_drops += 1;
        debug!(
            device = %self.shared.name,
            reason,
            consecutive = self.consecutive_drops,
            "Dropped frame"
        );

        if self.consecutive_drops >= self.max_consecutive_drops {
            self.shared.fail(&format!(
                "{} consecutive frames dropped (last: {})",
                self.consecutive_drops, reason
            ));
            return LoopAction::Stop;
        }
        LoopAction::Continue
    }

    /// Reason the frame cannot be used, if any
    fn reject_reason(&self, frame: &RawFrame) -> Option<String> {
        if let Some(last) = self.last_timestamp_us {
            if frame.timestamp_us < last {
                return Some(format!(
                    "timestamp went backwards ({} < {})",
                    frame.timestamp_us, last
                ));
            }
        }

        let checks = [
            (
                Modality::Depth,
                frame.depth.as_ref().map(Size::of),
                self.depth_size,
            ),
            (
                Modality::Amplitude,
                frame.amplitude.as_ref().map(Size::of),
                self.depth_size,
            ),
            (
                Modality::Color,
                frame.color.as_ref().map(Size::of),
                self.color_size,
            ),
        ];
        for (modality, actual, expected) in checks {
            match actual {
                Some(actual) if !self.raw_caps.contains(modality) => {
                    return Some(format!("unexpected {} frame of {}", modality, actual));
                }
                Some(actual) if actual != expected => {
                    return Some(format!(
                        "{} frame is {}, expected {}",
                        modality, actual, expected
                    ));
                }
                _ => {}
            }
        }
        None
    }

    fn handle_frame(&mut self, frame: RawFrame) -> LoopAction {
        // Audio is its own stream and survives a rejected image payload
        if self.raw_caps.contains(Modality::Audio) && !frame.audio.is_empty() {
            self.shared.audio.push(&frame.audio);
        }

        if let Some(reason) = self.reject_reason(&frame) {
            warn!(device = %self.shared.name, reason = %reason, "Rejecting malformed frame");
            return self.drop_frame(&reason);
        }

        self.consecutive_drops = 0;
        self.last_timestamp_us = Some(frame.timestamp_us);

        let depth_changed = frame.depth.is_some();
        let color_changed = frame.color.is_some();
        // Without snapshot modalities every accepted frame is news
        let mut changed = depth_changed || color_changed || self.audio_only();

        if let Some(depth) = frame.depth {
            self.current.depth = Some(Arc::new(depth));
        }
        if let Some(color) = frame.color {
            self.current.color = Some(Arc::new(color));
        }
        if let Some(amplitude) = frame.amplitude {
            self.current.amplitude = Some(Arc::new(amplitude));
            changed = true;
        }
        if self.raw_caps.contains(Modality::Acceleration) {
            if let Some(acceleration) = frame.acceleration {
                self.current.acceleration = Some(acceleration);
                changed = true;
            }
        }

        if depth_changed || color_changed {
            self.update_clouds(depth_changed);
        }

        if !changed || !self.is_complete() {
            trace!(device = %self.shared.name, "Frame held back, snapshot incomplete or unchanged");
            return LoopAction::Continue;
        }

        self.sequence += 1;
        let snapshot = FrameSnapshot {
            stamp: FrameStamp {
                sequence: self.sequence,
                timestamp_us: frame.timestamp_us,
            },
            depth: self.current.depth.clone(),
            amplitude: self.current.amplitude.clone(),
            color: self.current.color.clone(),
            vertices: self.current.vertices.clone(),
            smoothed: self.current.smoothed.clone(),
            acceleration: self.current.acceleration,
        };
        trace!(
            device = %self.shared.name,
            sequence = self.sequence,
            timestamp_us = frame.timestamp_us,
            "Publishing snapshot"
        );
        self.shared.snapshots.publish(snapshot);

        LoopAction::Continue
    }

    /// Recompute the raw cloud, and fold it into the smoothed one on new depth
    fn update_clouds(&mut self, depth_changed: bool) {
        let Some((projector, smoother)) = self.geometry.as_mut() else {
            return;
        };
        let Some(depth) = self.current.depth.as_deref() else {
            return;
        };

        let mut vertices = vec![PointXyzRgb::INVALID; self.depth_size.area()];
        projector.project(depth, self.current.color.as_deref(), &mut vertices);

        if depth_changed {
            let mut smoothed = vec![PointXyzRgb::INVALID; vertices.len()];
            smoother.update(&vertices, &mut smoothed);
            self.current.smoothed = Some(Arc::new(smoothed));
        } else if !smoother.config().smooth_color {
            // Color-only update: positions keep their average, colors follow the new frame
            if let Some(previous) = self.current.smoothed.as_deref() {
                let recolored = previous
                    .iter()
                    .zip(&vertices)
                    .map(|(avg, raw)| {
                        if avg.is_valid() {
                            PointXyzRgb::new(avg.x, avg.y, avg.z, raw.rgb())
                        } else {
                            *avg
                        }
                    })
                    .collect();
                self.current.smoothed = Some(Arc::new(recolored));
            }
        }

        self.current.vertices = Some(Arc::new(vertices));
    }

    /// Source delivers nothing a snapshot could carry
    fn audio_only(&self) -> bool {
        self.raw_caps.iter().all(|modality| modality == Modality::Audio)
    }

    /// Every modality the source advertises has been seen at least once
    fn is_complete(&self) -> bool {
        let current = &self.current;
        let present = |modality: Modality| match modality {
            Modality::Depth => current.depth.is_some() && current.smoothed.is_some(),
            Modality::Amplitude => current.amplitude.is_some(),
            Modality::Color => current.color.is_some(),
            Modality::Acceleration => current.acceleration.is_some(),
            Modality::Vertex | Modality::SmoothedVertex | Modality::Audio => true,
        };
        self.raw_caps.iter().all(present)
    }
}
