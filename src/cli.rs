// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for depth camera operations
//!
//! This module provides command-line functionality for:
//! - Printing device information
//! - Writing a one-shot snapshot of every modality
//! - Streaming captures with freshness and smoothing statistics

use depth_capture::Config;
use depth_capture::backends::camera::format_converters::{
    DepthVisualizationOptions, amplitude_to_rgb, depth_to_rgb,
};
use depth_capture::backends::camera::{
    Acceleration, ColorImage, DepthCamera, DeviceState, FrameStamp, Modality, PointXyzRgb,
    StreamingCamera, SyntheticSource, synthetic_camera,
};
use depth_capture::errors::{AppError, AppResult, ExportError};
use depth_capture::pipelines::scene::export_point_cloud_las;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Build and start the configured device
fn open_camera(config: &Config) -> AppResult<StreamingCamera<SyntheticSource>> {
    let (mut camera, _control) = synthetic_camera(config.device.clone(), config.streaming.clone());
    camera.start()?;
    Ok(camera)
}

/// Print device information
pub fn show_info(config: &Config) -> AppResult<()> {
    let camera = open_camera(config)?;

    let capabilities: Vec<Modality> = camera.capabilities().iter().collect();
    let info = serde_json::json!({
        "name": camera.name(),
        "state": camera.state().to_string(),
        "depth_size": camera.depth_size(),
        "color_size": camera.color_size(),
        "capabilities": capabilities,
        "smoothing": camera.config().smoothing,
    });

    let text = serde_json::to_string_pretty(&info).map_err(|e| AppError::Other(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

/// Print the effective configuration, optionally saving it
pub fn show_config(config: &Config, path: Option<PathBuf>, save: bool) -> AppResult<()> {
    let text = serde_json::to_string_pretty(config).map_err(|e| AppError::Other(e.to_string()))?;
    println!("{}", text);

    if save {
        let path = path
            .or_else(Config::default_path)
            .ok_or("No config directory on this platform")?;
        config.save(&path)?;
        println!("Saved: {}", path.display());
    }
    Ok(())
}

/// Capture every supported modality once and write files to `output`
pub fn take_snapshot(config: &Config, output: Option<PathBuf>, warmup: u64) -> AppResult<()> {
    let output_dir = output
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&output_dir).map_err(ExportError::from)?;

    let camera = open_camera(config)?;
    println!(
        "Device: {} (depth {}, color {})",
        camera.name(),
        camera.depth_size(),
        camera.color_size()
    );

    // Let the smoother see a few frames before capturing
    let timeout = warmup_timeout(warmup, config.device.frame_rate);
    wait_for_sequence(&camera, warmup, timeout)?;

    let stamp = write_captures(&camera, &output_dir, config.streaming.audio_queue_bytes)?;
    info!(sequence = stamp.sequence, timestamp_us = stamp.timestamp_us, "Snapshot written");
    println!("Snapshot of frame {} saved to {}", stamp.sequence, output_dir.display());
    Ok(())
}

/// Time `warmup` frames take at `frame_rate`, plus two seconds of slack
fn warmup_timeout(warmup: u64, frame_rate: u32) -> Duration {
    let frame_rate = u64::from(frame_rate.max(1));
    Duration::from_millis(warmup.saturating_mul(1000) / frame_rate) + Duration::from_secs(2)
}

fn wait_for_sequence(
    camera: &StreamingCamera<SyntheticSource>,
    sequence: u64,
    timeout: Duration,
) -> AppResult<()> {
    let start = Instant::now();
    loop {
        if camera.latest_stamp().map(|s| s.sequence).unwrap_or(0) >= sequence {
            return Ok(());
        }
        if let Some(reason) = failure_reason(camera) {
            return Err(AppError::Other(reason));
        }
        if start.elapsed() > timeout {
            warn!(sequence, ?timeout, "Warm-up did not finish, capturing anyway");
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn failure_reason(camera: &dyn DepthCamera) -> Option<String> {
    match camera.state() {
        DeviceState::Failed(reason) => Some(reason),
        _ => None,
    }
}

fn save_png(image: &ColorImage, path: &Path) -> Result<(), ExportError> {
    image.save(path)?;
    println!("  {}", path.display());
    Ok(())
}

/// Capture each supported modality into freshly sized buffers and write it out
fn write_captures(
    camera: &dyn DepthCamera,
    dir: &Path,
    audio_bytes: usize,
) -> AppResult<FrameStamp> {
    let mut latest = FrameStamp::default();

    if camera.supports(Modality::Depth) {
        let mut depth = camera.depth_buffer();
        latest = latest.max(camera.capture_depth(&mut depth)?);
        let preview = depth_to_rgb(&depth, &DepthVisualizationOptions::kinect());
        save_png(&preview, &dir.join("depth.png"))?;
    }

    if camera.supports(Modality::Amplitude) {
        let mut amplitude = camera.amplitude_buffer();
        latest = latest.max(camera.capture_amplitude(&mut amplitude)?);
        save_png(&amplitude_to_rgb(&amplitude), &dir.join("amplitude.png"))?;
    }

    if camera.supports(Modality::Color) {
        let mut color = camera.color_buffer();
        latest = latest.max(camera.capture_color(&mut color)?);
        save_png(&color, &dir.join("color.png"))?;
    }

    if camera.supports(Modality::Vertex) {
        let mut points = camera.vertex_buffer();
        latest = latest.max(camera.capture_vertex(&mut points)?);
        write_cloud(&points, &dir.join("cloud.las"))?;
    }

    if camera.supports(Modality::SmoothedVertex) {
        let mut points = camera.vertex_buffer();
        latest = latest.max(camera.capture_moving_averaged_vertex(&mut points)?);
        write_cloud(&points, &dir.join("cloud_smoothed.las"))?;
    }

    if camera.supports(Modality::Audio) {
        let mut audio = vec![0u8; audio_bytes.max(1)];
        let len = camera.capture_audio(&mut audio)?;
        let path = dir.join("audio.raw");
        std::fs::write(&path, &audio[..len]).map_err(ExportError::from)?;
        println!("  {} ({} bytes)", path.display(), len);
    }

    if camera.supports(Modality::Acceleration) {
        let mut acc = Acceleration::default();
        latest = latest.max(camera.capture_acceleration(&mut acc)?);
        println!(
            "  acceleration: ({:.3}, {:.3}, {:.3}) m/s², |a| = {:.3}",
            acc.x,
            acc.y,
            acc.z,
            acc.magnitude()
        );
    }

    Ok(latest)
}

fn write_cloud(points: &[PointXyzRgb], path: &Path) -> AppResult<()> {
    match export_point_cloud_las(points, path) {
        Ok(count) => {
            println!("  {} ({} points)", path.display(), count);
            Ok(())
        }
        Err(ExportError::Empty) => {
            warn!(path = %path.display(), "Cloud has no valid points, skipped");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Mean distance in mm between smoothed and raw points valid in both clouds
fn smoothing_residual_mm(raw: &[PointXyzRgb], smoothed: &[PointXyzRgb]) -> Option<f32> {
    let (sum, count) = raw
        .iter()
        .zip(smoothed)
        .filter(|(r, s)| r.is_valid() && s.is_valid())
        .fold((0.0f64, 0usize), |(sum, count), (r, s)| {
            (sum + r.distance(s) as f64, count + 1)
        });
    (count > 0).then(|| (sum / count as f64 * 1000.0) as f32)
}

/// Counters reported at the end of a stream
#[derive(Debug, Default)]
struct StreamStats {
    polls: u64,
    fresh: u64,
    repeated: u64,
    skipped: u64,
    audio_bytes: usize,
}

/// Poll every modality at `interval_ms` for `duration` seconds or until Ctrl+C
pub fn stream(config: &Config, duration: u64, interval_ms: u64) -> AppResult<()> {
    let camera = open_camera(config)?;
    let camera: &dyn DepthCamera = &camera;

    println!(
        "Streaming depth {} / color {} for {} seconds (press Ctrl+C to stop early)",
        camera.depth_size(),
        camera.color_size(),
        duration
    );

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = Arc::clone(&stop_flag);
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| AppError::Other(format!("Failed to install Ctrl+C handler: {}", e)))?;

    let mut depth = camera.depth_buffer();
    let mut raw = camera.vertex_buffer();
    let mut smoothed = camera.vertex_buffer();
    let mut audio = vec![0u8; config.streaming.audio_queue_bytes.max(1)];
    let mut acceleration = Acceleration::default();
    let mut last: Option<FrameStamp> = None;
    let mut stats = StreamStats::default();

    let start = Instant::now();
    let target_duration = Duration::from_secs(duration);
    let interval = Duration::from_millis(interval_ms.max(1));

    while start.elapsed() < target_duration {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        let stamp = camera.capture_depth(&mut depth)?;
        stats.polls += 1;
        match last {
            Some(prev) if prev.sequence == stamp.sequence => stats.repeated += 1,
            Some(prev) => {
                stats.fresh += 1;
                stats.skipped += stamp.sequence - prev.sequence - 1;
            }
            None => stats.fresh += 1,
        }
        last = Some(stamp);

        let mut line = format!(
            "frame {:>6} t={:>8.1}ms",
            stamp.sequence,
            stamp.timestamp_us as f64 / 1000.0
        );

        if camera.supports(Modality::SmoothedVertex) {
            camera.capture_vertex(&mut raw)?;
            camera.capture_moving_averaged_vertex(&mut smoothed)?;
            let valid = raw.iter().filter(|p| p.is_valid()).count();
            line.push_str(&format!(" valid={}", valid));
            if let Some(residual) = smoothing_residual_mm(&raw, &smoothed) {
                line.push_str(&format!(" residual={:.2}mm", residual));
            }
        }

        if camera.supports(Modality::Audio) {
            let len = camera.capture_audio(&mut audio)?;
            stats.audio_bytes += len;
            line.push_str(&format!(" audio={}B", len));
        }

        if camera.supports(Modality::Acceleration) {
            camera.capture_acceleration(&mut acceleration)?;
            line.push_str(&format!(" |a|={:.2}", acceleration.magnitude()));
        }

        println!("{}", line);
        std::thread::sleep(interval);
    }

    info!(?stats, "Stream finished");
    println!();
    println!(
        "Polls: {}, fresh frames: {}, repeated: {}, skipped: {}, audio: {} bytes",
        stats.polls, stats.fresh, stats.repeated, stats.skipped, stats.audio_bytes
    );
    Ok(())
}
