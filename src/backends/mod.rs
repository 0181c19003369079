// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for depth camera capture
//!
//! # Architecture
//!
//! The backend layer abstracts hardware access, providing a consistent API
//! regardless of the underlying device:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Consumers (CLI, tests)          │
//! └────────────────────┬────────────────────────┘
//!                      │ DepthCamera
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌────────────────┐   │
//! │  │ StreamingCamera  │◀─│  FrameSource   │   │
//! │  │ (snapshots)      │  │ (synthetic)    │   │
//! │  └──────────────────┘  └────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Capture contract, streaming driver shim and synthetic device

pub mod camera;
