// SPDX-License-Identifier: GPL-3.0-only

//! Temporal smoothing of vertex clouds
//!
//! Smoothing runs once per device frame, index by index, so the smoothed
//! cloud keeps the exact row-major layout of the raw cloud. Every output
//! position is a convex combination of past raw positions at that index:
//! it cannot leave the envelope spanned by the raw samples, and for a static
//! scene it settles on the raw value.

use serde::{Deserialize, Serialize};

use crate::backends::camera::types::PointXyzRgb;
use crate::constants::DEFAULT_SMOOTHING_ALPHA;

/// Averaging formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SmoothingMode {
    /// `avg += alpha * (new - avg)`, `alpha` in (0, 1]
    Exponential { alpha: f32 },
    /// Mean of the last `frames` valid samples
    Window { frames: usize },
}

impl Default for SmoothingMode {
    fn default() -> Self {
        SmoothingMode::Exponential {
            alpha: DEFAULT_SMOOTHING_ALPHA,
        }
    }
}

/// Smoothing settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub mode: SmoothingMode,
    /// Average colors as well as positions
    pub smooth_color: bool,
    /// Restart the average at an index when a new sample lands farther than
    /// this (metres) from it; `None` never restarts
    pub reset_distance_m: Option<f32>,
}

impl SmoothingConfig {
    pub fn validate(&self) -> Result<(), String> {
        match self.mode {
            SmoothingMode::Exponential { alpha } if !(alpha > 0.0 && alpha <= 1.0) => {
                return Err(format!("smoothing alpha must be in (0, 1], got {}", alpha));
            }
            SmoothingMode::Window { frames: 0 } => {
                return Err("smoothing window must hold at least one frame".to_string());
            }
            _ => {}
        }
        if let Some(distance) = self.reset_distance_m {
            if !(distance > 0.0) {
                return Err(format!(
                    "reset distance must be positive, got {}",
                    distance
                ));
            }
        }
        Ok(())
    }
}

enum SmootherState {
    Exponential {
        alpha: f32,
        /// Running average; `INVALID` where the history is empty
        average: Vec<PointXyzRgb>,
        /// Unrounded color averages
        colors: Vec<[f32; 3]>,
    },
    Window {
        /// Ring of the last `frames` raw clouds
        ring: Vec<Vec<PointXyzRgb>>,
        head: usize,
        /// Consecutive valid samples per index, capped at the ring length
        runs: Vec<usize>,
        /// Previous smoothed output, for the reset distance check
        last: Vec<PointXyzRgb>,
    },
}

/// Per-index moving average over successive vertex clouds
pub struct VertexSmoother {
    config: SmoothingConfig,
    len: usize,
    frames_seen: u64,
    state: SmootherState,
}

impl VertexSmoother {
    /// Smoother for clouds of `len` points
    pub fn new(config: SmoothingConfig, len: usize) -> Self {
        let state = match config.mode {
            SmoothingMode::Exponential { alpha } => SmootherState::Exponential {
                alpha,
                average: vec![PointXyzRgb::INVALID; len],
                colors: vec![[0.0; 3]; len],
            },
            SmoothingMode::Window { frames } => {
                let frames = frames.max(1);
                SmootherState::Window {
                    ring: vec![vec![PointXyzRgb::INVALID; len]; frames],
                    head: 0,
                    runs: vec![0; len],
                    last: vec![PointXyzRgb::INVALID; len],
                }
            }
        };

        Self {
            config,
            len,
            frames_seen: 0,
            state,
        }
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of clouds folded in since construction or the last reset
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Forget all history
    pub fn reset(&mut self) {
        *self = Self::new(self.config, self.len);
    }

    /// Fold `input` into the history and write the smoothed cloud to `out`
    ///
    /// Both slices must hold `len()` points.
    pub fn update(&mut self, input: &[PointXyzRgb], out: &mut [PointXyzRgb]) {
        debug_assert_eq!(input.len(), self.len);
        debug_assert_eq!(out.len(), self.len);

        let smooth_color = self.config.smooth_color;
        let reset_distance = self.config.reset_distance_m;

        match &mut self.state {
            SmootherState::Exponential {
                alpha,
                average,
                colors,
            } => {
                let alpha = *alpha;
                for (((sample, avg), color), dst) in input
                    .iter()
                    .zip(average.iter_mut())
                    .zip(colors.iter_mut())
                    .zip(out.iter_mut())
                {
                    if !sample.is_valid() {
                        *avg = PointXyzRgb::INVALID;
                        *dst = PointXyzRgb::INVALID;
                        continue;
                    }

                    let restart = !avg.is_valid()
                        || reset_distance.is_some_and(|d| avg.distance(sample) > d);
                    if restart {
                        *avg = *sample;
                        *color = rgb_to_f32(sample.rgb());
                    } else {
                        avg.x += alpha * (sample.x - avg.x);
                        avg.y += alpha * (sample.y - avg.y);
                        avg.z += alpha * (sample.z - avg.z);
                        let rgb = rgb_to_f32(sample.rgb());
                        for c in 0..3 {
                            color[c] += alpha * (rgb[c] - color[c]);
                        }
                    }

                    let rgb = if smooth_color {
                        f32_to_rgb(*color)
                    } else {
                        sample.rgb()
                    };
                    *dst = PointXyzRgb::new(avg.x, avg.y, avg.z, rgb);
                }
            }
            SmootherState::Window {
                ring,
                head,
                runs,
                last,
            } => {
                let frames = ring.len();
                *head = (*head + 1) % frames;
                ring[*head].copy_from_slice(input);

                for (i, sample) in input.iter().enumerate() {
                    if !sample.is_valid() {
                        runs[i] = 0;
                        last[i] = PointXyzRgb::INVALID;
                        out[i] = PointXyzRgb::INVALID;
                        continue;
                    }

                    if runs[i] > 0 && reset_distance.is_some_and(|d| last[i].distance(sample) > d)
                    {
                        runs[i] = 0;
                    }
                    runs[i] = (runs[i] + 1).min(frames);

                    let count = runs[i];
                    let mut position = [0.0f32; 3];
                    let mut rgb = [0.0f32; 3];
                    for k in 0..count {
                        let past = &ring[(*head + frames - k) % frames][i];
                        position[0] += past.x;
                        position[1] += past.y;
                        position[2] += past.z;
                        let past_rgb = rgb_to_f32(past.rgb());
                        for c in 0..3 {
                            rgb[c] += past_rgb[c];
                        }
                    }
                    let n = count as f32;
                    let rgb = if smooth_color {
                        f32_to_rgb([rgb[0] / n, rgb[1] / n, rgb[2] / n])
                    } else {
                        sample.rgb()
                    };

                    let smoothed =
                        PointXyzRgb::new(position[0] / n, position[1] / n, position[2] / n, rgb);
                    last[i] = smoothed;
                    out[i] = smoothed;
                }
            }
        }

        self.frames_seen += 1;
    }
}

fn rgb_to_f32(rgb: [u8; 3]) -> [f32; 3] {
    [rgb[0] as f32, rgb[1] as f32, rgb[2] as f32]
}

fn f32_to_rgb(rgb: [f32; 3]) -> [u8; 3] {
    [
        rgb[0].round().clamp(0.0, 255.0) as u8,
        rgb[1].round().clamp(0.0, 255.0) as u8,
        rgb[2].round().clamp(0.0, 255.0) as u8,
    ]
}
