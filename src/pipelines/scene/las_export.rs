// SPDX-License-Identifier: GPL-3.0-only

//! LAS point cloud export
//!
//! Writes the valid points of a captured vertex cloud as an uncompressed
//! LAS 1.4 file with color.

use std::path::Path;

use las::{Builder, Color, Point, Writer};
use tracing::{debug, info};

use crate::backends::camera::types::PointXyzRgb;
use crate::errors::ExportError;

/// Export a vertex cloud, returning the number of points written
///
/// Invalid points (no depth) are skipped. LAS colors are 16-bit, so 8-bit
/// channels are scaled by 257 to span the full range.
pub fn export_point_cloud_las(
    points: &[PointXyzRgb],
    output_path: &Path,
) -> Result<usize, ExportError> {
    let valid: Vec<&PointXyzRgb> = points.iter().filter(|p| p.is_valid()).collect();
    if valid.is_empty() {
        return Err(ExportError::Empty);
    }

    // Bounds for the header offsets
    let (min, max) = valid.iter().fold(
        ([f64::MAX; 3], [f64::MIN; 3]),
        |(mut min, mut max), p| {
            for (axis, value) in p.position().into_iter().enumerate() {
                min[axis] = min[axis].min(value as f64);
                max[axis] = max[axis].max(value as f64);
            }
            (min, max)
        },
    );

    let mut builder = Builder::from((1, 4)); // LAS 1.4
    builder.point_format.has_color = true;
    builder.point_format.is_compressed = false;

    let scale = 0.0001; // 0.1 mm precision
    builder.transforms = las::Vector {
        x: las::Transform {
            scale,
            offset: (min[0] + max[0]) / 2.0,
        },
        y: las::Transform {
            scale,
            offset: (min[1] + max[1]) / 2.0,
        },
        z: las::Transform {
            scale,
            offset: (min[2] + max[2]) / 2.0,
        },
    };

    let header = builder
        .into_header()
        .map_err(|e| ExportError::PointCloud(format!("Failed to build LAS header: {}", e)))?;

    let mut writer = Writer::from_path(output_path, header)
        .map_err(|e| ExportError::PointCloud(format!("Failed to create LAS writer: {}", e)))?;

    for p in &valid {
        let mut point = Point::default();
        point.x = p.x as f64;
        point.y = p.y as f64;
        point.z = p.z as f64;
        point.color = Some(Color::new(
            p.r as u16 * 257,
            p.g as u16 * 257,
            p.b as u16 * 257,
        ));

        writer
            .write_point(point)
            .map_err(|e| ExportError::PointCloud(format!("Failed to write point: {}", e)))?;
    }

    writer
        .close()
        .map_err(|e| ExportError::PointCloud(format!("Failed to close LAS file: {}", e)))?;

    debug!(path = %output_path.display(), "LAS export complete");
    info!(points = valid.len(), skipped = points.len() - valid.len(), "Exported point cloud");

    Ok(valid.len())
}
