// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic depth camera
//!
//! A [`FrameSource`] that renders a fixed scene (a tilted back wall with a
//! sphere in front of it) at a configurable resolution and frame rate. It
//! stands in for hardware in the CLI and in tests, and [`SyntheticControl`]
//! lets a test pause frame production, inject dropped frames or pull the
//! virtual cable.

use std::f32::consts::PI;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use image::{Luma, Rgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::streaming::{FrameSource, RawFrame, SourceEvent, StreamingCamera, StreamingConfig};
use super::types::*;
use crate::constants::{DEFAULT_COLOR_SIZE, DEFAULT_DEPTH_SIZE, DEFAULT_FRAME_RATE, GRAVITY};

/// Audio format produced by the synthetic microphone: 16-bit LE mono PCM
pub const AUDIO_SAMPLE_RATE: u32 = 16_000;

/// Synthetic device settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub name: String,
    pub depth_size: Size,
    pub color_size: Size,
    pub frame_rate: u32,
    /// Uniform depth noise amplitude in millimetres (0 = noise free)
    pub noise_mm: f32,
    /// Seed for the noise generator
    pub seed: u64,
    /// Raw modalities the device provides
    pub modalities: Vec<Modality>,
    /// Frequency of the audio test tone
    pub tone_hz: f32,
    /// Forward tilt of the device in degrees, reflected in the gravity vector
    pub tilt_deg: f32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            name: "synthetic".to_string(),
            depth_size: DEFAULT_DEPTH_SIZE,
            color_size: DEFAULT_COLOR_SIZE,
            frame_rate: DEFAULT_FRAME_RATE,
            noise_mm: 4.0,
            seed: 0x5eed,
            modalities: vec![
                Modality::Depth,
                Modality::Amplitude,
                Modality::Color,
                Modality::Audio,
                Modality::Acceleration,
            ],
            tone_hz: 440.0,
            tilt_deg: 0.0,
        }
    }
}

impl SyntheticConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_rate == 0 || self.frame_rate > 1000 {
            return Err(format!("frame rate {} out of range 1..=1000", self.frame_rate));
        }
        if self.depth_size.is_empty() {
            return Err(format!("depth size {} is empty", self.depth_size));
        }
        if self.color_size.is_empty() && self.modalities.contains(&Modality::Color) {
            return Err(format!("color size {} is empty", self.color_size));
        }
        if !self.noise_mm.is_finite() || self.noise_mm < 0.0 {
            return Err("noise_mm must be a non-negative number".to_string());
        }
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        self.modalities
            .iter()
            .copied()
            .filter(|m| !matches!(m, Modality::Vertex | Modality::SmoothedVertex))
            .collect()
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.frame_rate.max(1) as u64)
    }
}

#[derive(Debug, Default)]
struct ControlFlags {
    paused: AtomicBool,
    disconnected: AtomicBool,
    pending_drops: AtomicU32,
    frames: AtomicU64,
}

/// Remote control for a running [`SyntheticSource`]
#[derive(Debug, Clone, Default)]
pub struct SyntheticControl {
    flags: Arc<ControlFlags>,
}

impl SyntheticControl {
    /// Stop producing frames; the source reports idle until resumed
    pub fn pause(&self) {
        self.flags.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.flags.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.flags.paused.load(Ordering::SeqCst)
    }

    /// Replace the next `count` frames with dropped-frame events
    pub fn drop_frames(&self, count: u32) {
        self.flags.pending_drops.fetch_add(count, Ordering::SeqCst);
    }

    /// Simulate the device being unplugged
    pub fn disconnect(&self) {
        self.flags.disconnected.store(true, Ordering::SeqCst);
    }

    /// Frames delivered so far
    pub fn frames_produced(&self) -> u64 {
        self.flags.frames.load(Ordering::SeqCst)
    }
}

/// Precomputed noise-free scene
struct Scene {
    depth: DepthImage,
    amplitude: AmplitudeImage,
    color: ColorImage,
}

impl Scene {
    fn render(config: &SyntheticConfig) -> Self {
        let Size { width, height } = config.depth_size;

        let depth = DepthImage::from_fn(width, height, |u, v| {
            let nu = (u as f32 + 0.5) / width as f32;
            let nv = (v as f32 + 0.5) / height as f32;
            Luma([scene_depth_mm(nu, nv, width as f32 / height as f32)])
        });

        // Reflected intensity falls off with the square of the distance
        let amplitude = AmplitudeImage::from_fn(width, height, |u, v| {
            let z = depth.get_pixel(u, v).0[0] / 1000.0;
            Luma([4000.0 / (z * z)])
        });

        let Size {
            width: cw,
            height: ch,
        } = config.color_size;
        let color = ColorImage::from_fn(cw.max(1), ch.max(1), |x, y| {
            let nu = (x as f32 + 0.5) / cw.max(1) as f32;
            let nv = (y as f32 + 0.5) / ch.max(1) as f32;
            if in_sphere(nu, nv, cw as f32 / ch.max(1) as f32).is_some() {
                Rgb([220, 60, 40])
            } else {
                Rgb([(nu * 255.0) as u8, (nv * 255.0) as u8, 128])
            }
        });

        Self {
            depth,
            amplitude,
            color,
        }
    }
}

const WALL_NEAR_MM: f32 = 2100.0;
const WALL_FAR_MM: f32 = 2900.0;
const SPHERE_CENTER_MM: f32 = 1600.0;
const SPHERE_BULGE_MM: f32 = 300.0;
const SPHERE_RADIUS: f32 = 0.22;

/// Normalised radius from the sphere center, when (nu, nv) hits the sphere
fn in_sphere(nu: f32, nv: f32, aspect: f32) -> Option<f32> {
    let dx = (nu - 0.5) * aspect;
    let dy = nv - 0.55;
    let r = (dx * dx + dy * dy).sqrt() / SPHERE_RADIUS;
    (r < 1.0).then_some(r)
}

/// Depth in mm of the scene at normalised image coordinates
fn scene_depth_mm(nu: f32, nv: f32, aspect: f32) -> f32 {
    match in_sphere(nu, nv, aspect) {
        Some(r) => SPHERE_CENTER_MM - SPHERE_BULGE_MM * (1.0 - r * r).sqrt(),
        // Wall tilted away from the camera towards the top of the image
        None => WALL_FAR_MM - (WALL_FAR_MM - WALL_NEAR_MM) * nv,
    }
}

/// [`FrameSource`] rendering the synthetic scene
pub struct SyntheticSource {
    config: SyntheticConfig,
    control: SyntheticControl,
    scene: Option<Scene>,
    rng: StdRng,
    opened_at: Option<Instant>,
    next_due: Option<Instant>,
    audio_phase: f32,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            control: SyntheticControl::default(),
            scene: None,
            rng,
            opened_at: None,
            next_due: None,
            audio_phase: 0.0,
        }
    }

    /// Handle for steering this source after it moved onto its thread
    pub fn control(&self) -> SyntheticControl {
        self.control.clone()
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    fn gravity(&self) -> Acceleration {
        let tilt = self.config.tilt_deg * PI / 180.0;
        Acceleration::new(0.0, GRAVITY * tilt.cos(), GRAVITY * tilt.sin())
    }

    fn audio_chunk(&mut self) -> Vec<u8> {
        let samples = (AUDIO_SAMPLE_RATE / self.config.frame_rate.max(1)) as usize;
        let step = 2.0 * PI * self.config.tone_hz / AUDIO_SAMPLE_RATE as f32;
        let mut bytes = Vec::with_capacity(samples * 2);
        for _ in 0..samples {
            let sample = (self.audio_phase.sin() * i16::MAX as f32 * 0.25) as i16;
            bytes.extend_from_slice(&sample.to_le_bytes());
            self.audio_phase = (self.audio_phase + step) % (2.0 * PI);
        }
        bytes
    }

    fn build_frame(&mut self, now: Instant) -> Option<RawFrame> {
        let caps = self.config.capabilities();
        let noise = self.config.noise_mm;
        let opened_at = self.opened_at?;

        let (depth, amplitude, color) = {
            let scene = self.scene.as_ref()?;
            (
                caps.contains(Modality::Depth).then(|| scene.depth.clone()),
                caps.contains(Modality::Amplitude)
                    .then(|| scene.amplitude.clone()),
                caps.contains(Modality::Color).then(|| scene.color.clone()),
            )
        };

        let depth = depth.map(|mut depth| {
            if noise > 0.0 {
                for sample in depth.iter_mut() {
                    *sample += self.rng.gen_range(-noise..=noise);
                }
            }
            depth
        });

        let audio = if caps.contains(Modality::Audio) {
            self.audio_chunk()
        } else {
            Vec::new()
        };

        Some(RawFrame {
            timestamp_us: now.duration_since(opened_at).as_micros() as u64,
            depth,
            amplitude,
            color,
            audio,
            acceleration: caps
                .contains(Modality::Acceleration)
                .then(|| self.gravity()),
        })
    }
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn depth_size(&self) -> Size {
        self.config.depth_size
    }

    fn color_size(&self) -> Size {
        if self.config.capabilities().contains(Modality::Color) {
            self.config.color_size
        } else {
            Size::ZERO
        }
    }

    fn capabilities(&self) -> Capabilities {
        self.config.capabilities()
    }

    fn open(&mut self) -> Result<(), String> {
        self.config.validate()?;
        self.scene = Some(Scene::render(&self.config));

        let now = Instant::now();
        self.opened_at = Some(now);
        self.next_due = Some(now);

        info!(
            name = %self.config.name,
            depth = %self.config.depth_size,
            color = %self.config.color_size,
            fps = self.config.frame_rate,
            "Synthetic device opened"
        );
        Ok(())
    }

    fn next_event(&mut self) -> SourceEvent {
        let flags = &self.control.flags;
        if flags.disconnected.load(Ordering::SeqCst) {
            return SourceEvent::Disconnected("synthetic device unplugged".to_string());
        }
        if flags.paused.load(Ordering::SeqCst) {
            return SourceEvent::Idle;
        }

        let now = Instant::now();
        let Some(due) = self.next_due else {
            return SourceEvent::Disconnected("synthetic device not opened".to_string());
        };
        if now < due {
            return SourceEvent::Idle;
        }

        let interval = self.config.frame_interval();
        // Skip ahead rather than burst when the consumer of events fell behind
        self.next_due = Some(if now.duration_since(due) > interval {
            now + interval
        } else {
            due + interval
        });

        let dropped = flags
            .pending_drops
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if dropped {
            debug!(name = %self.config.name, "Simulated frame drop");
            return SourceEvent::Dropped("simulated transfer error".to_string());
        }

        match self.build_frame(now) {
            Some(frame) => {
                self.control.flags.frames.fetch_add(1, Ordering::SeqCst);
                SourceEvent::Frame(frame)
            }
            None => SourceEvent::Disconnected("synthetic scene missing".to_string()),
        }
    }
}

/// Build a [`StreamingCamera`] over a synthetic source, with its control handle
pub fn synthetic_camera(
    config: SyntheticConfig,
    streaming: StreamingConfig,
) -> (StreamingCamera<SyntheticSource>, SyntheticControl) {
    let source = SyntheticSource::new(config);
    let control = source.control();
    (StreamingCamera::new(source, streaming), control)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SyntheticConfig {
        SyntheticConfig {
            depth_size: Size::new(32, 24),
            color_size: Size::new(64, 48),
            frame_rate: 200,
            ..Default::default()
        }
    }

    fn next_frame(source: &mut SyntheticSource) -> RawFrame {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if let SourceEvent::Frame(frame) = source.next_event() {
                return frame;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        panic!("no synthetic frame within 2s");
    }

    #[test]
    fn test_validate() {
        assert!(SyntheticConfig::default().validate().is_ok());
        let config = SyntheticConfig {
            frame_rate: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut source = SyntheticSource::new(config);
        assert!(source.open().is_err());
    }

    #[test]
    fn test_scene_depth_in_range() {
        for (nu, nv) in [(0.0, 0.0), (0.5, 0.55), (1.0, 1.0), (0.3, 0.9)] {
            let d = scene_depth_mm(nu, nv, 4.0 / 3.0);
            assert!((1000.0..=3000.0).contains(&d), "depth {} at {},{}", d, nu, nv);
        }
        // Sphere is closer than the wall behind it
        assert!(scene_depth_mm(0.5, 0.55, 1.0) < scene_depth_mm(0.05, 0.55, 1.0));
    }

    #[test]
    fn test_frame_contents() {
        let mut source = SyntheticSource::new(small_config());
        source.open().unwrap();
        let frame = next_frame(&mut source);

        let depth = frame.depth.unwrap();
        assert_eq!(Size::of(&depth), Size::new(32, 24));
        assert!(depth.iter().all(|d| d.is_finite() && *d > 0.0));
        assert_eq!(Size::of(&frame.color.unwrap()), Size::new(64, 48));
        assert_eq!(frame.audio.len(), 2 * (AUDIO_SAMPLE_RATE / 200) as usize);
        let acc = frame.acceleration.unwrap();
        assert!((acc.magnitude() - GRAVITY).abs() < 1e-3);
    }

    #[test]
    fn test_noise_is_seeded() {
        let mut a = SyntheticSource::new(small_config());
        let mut b = SyntheticSource::new(small_config());
        a.open().unwrap();
        b.open().unwrap();
        assert_eq!(next_frame(&mut a).depth, next_frame(&mut b).depth);
    }

    #[test]
    fn test_noise_free_frames_repeat() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            noise_mm: 0.0,
            ..small_config()
        });
        source.open().unwrap();
        let first = next_frame(&mut source);
        let second = next_frame(&mut source);
        assert_eq!(first.depth, second.depth);
        assert!(second.timestamp_us >= first.timestamp_us);
    }

    #[test]
    fn test_control_flags() {
        let mut source = SyntheticSource::new(small_config());
        let control = source.control();
        source.open().unwrap();

        control.pause();
        assert!(matches!(source.next_event(), SourceEvent::Idle));
        control.resume();

        control.drop_frames(1);
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut saw_drop = false;
        while Instant::now() < deadline && !saw_drop {
            saw_drop = matches!(source.next_event(), SourceEvent::Dropped(_));
        }
        assert!(saw_drop);

        control.disconnect();
        assert!(matches!(source.next_event(), SourceEvent::Disconnected(_)));
    }

    #[test]
    fn test_modalities_subset() {
        let source = SyntheticSource::new(SyntheticConfig {
            modalities: vec![Modality::Depth, Modality::Vertex],
            ..small_config()
        });
        let caps = source.capabilities();
        assert!(caps.contains(Modality::Depth));
        assert!(!caps.contains(Modality::Vertex));
        assert!(!caps.contains(Modality::Color));
        assert_eq!(source.color_size(), Size::ZERO);
    }
}
