// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines for captured depth data
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Depth Frame  │ ──▶ │  Scene Pipeline   │ ──▶ │ Vertex Cloud │
//! │ Color Frame  │     │  - Unprojection   │     │  (smoothed)  │
//! │              │     │  - Registration   │     │              │
//! │              │     │  - Smoothing      │     │              │
//! └──────────────┘     └───────────────────┘     └──────┬───────┘
//!                                                       │
//!                                                ┌──────▼───────┐
//!                                                │   LAS File   │
//!                                                └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`scene`]: Vertex projection, temporal smoothing and LAS export

pub mod scene;
