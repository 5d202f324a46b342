//! Camera calibration data.
//!
//! Parses the classic ARToolkit `camera_para.dat` format: big-endian image
//! width and height as 32-bit integers, a 3x4 intrinsic matrix of 64-bit
//! floats, then the remaining bytes as 64-bit float distortion factors.

use glam::Mat4;

use crate::errors::{ArdentError, Result};

/// Fixed-size head of the file: 2 x i32 + 12 x f64.
const HEADER_SIZE: usize = 8 + 12 * 8;

#[derive(Debug, Clone)]
pub struct CameraCalibration {
    /// Calibrated image width in pixels
    pub xsize: u32,
    /// Calibrated image height in pixels
    pub ysize: u32,
    /// Row-major 3x4 intrinsic matrix
    pub matrix: [[f64; 4]; 3],
    /// Lens distortion factors (length varies by file version)
    pub dist_factors: Vec<f64>,
}

impl CameraCalibration {
    /// Parses the binary calibration format.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ArdentError::CalibrationError(format!(
                "File too short: {} bytes, expected at least {HEADER_SIZE}",
                bytes.len()
            )));
        }
        if (bytes.len() - HEADER_SIZE) % 8 != 0 {
            return Err(ArdentError::CalibrationError(
                "Trailing bytes are not a whole number of distortion factors".to_string(),
            ));
        }

        let read_i32 = |offset: usize| i32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap());
        let read_f64 = |offset: usize| f64::from_be_bytes(bytes[offset..offset + 8].try_into().unwrap());

        let xsize = read_i32(0);
        let ysize = read_i32(4);
        if xsize <= 0 || ysize <= 0 {
            return Err(ArdentError::CalibrationError(format!(
                "Invalid image size {xsize}x{ysize}"
            )));
        }

        let mut matrix = [[0.0f64; 4]; 3];
        for (i, row) in matrix.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = read_f64(8 + (i * 4 + j) * 8);
            }
        }

        let dist_factors: Vec<f64> = (HEADER_SIZE..bytes.len())
            .step_by(8)
            .map(read_f64)
            .collect();

        Ok(Self {
            xsize: xsize as u32,
            ysize: ysize as u32,
            matrix,
            dist_factors,
        })
    }

    /// Focal length in pixels along x, straight from the intrinsic matrix.
    #[must_use]
    pub fn focal_length_x(&self) -> f64 {
        self.matrix[0][0]
    }

    /// Builds a projection matrix matching the calibrated camera.
    ///
    /// Follows the ARToolkit frustum construction: intrinsics are mapped
    /// onto normalized device coordinates of the calibrated image size, with
    /// depth remapped to the wgpu [0, 1] range. Rendered geometry lines up
    /// with the video frame when this projection drives the scene camera.
    #[must_use]
    pub fn projection_matrix(&self, near: f32, far: f32) -> Mat4 {
        let w = self.xsize as f32;
        let h = self.ysize as f32;

        let fx = self.matrix[0][0] as f32;
        let skew = self.matrix[0][1] as f32;
        let cx = self.matrix[0][2] as f32;
        let fy = self.matrix[1][1] as f32;
        let cy = self.matrix[1][2] as f32;

        // Column-major construction. Camera looks down -Z; image y grows
        // downward, hence the flipped fy and principal point terms.
        let mut m = [[0.0f32; 4]; 4];
        m[0][0] = 2.0 * fx / w;
        m[1][0] = 2.0 * skew / w;
        m[2][0] = 1.0 - 2.0 * cx / w;

        m[1][1] = 2.0 * fy / h;
        m[2][1] = 2.0 * cy / h - 1.0;

        m[2][2] = far / (near - far);
        m[3][2] = near * far / (near - far);

        m[2][3] = -1.0;

        Mat4::from_cols_array_2d(&m)
    }
}
