//! Angle and rotation helpers for apertures.

/// Wraps an angle in degrees to the range [-180, 180).
pub(crate) fn wrap_deg(angle_deg: f64) -> f64 {
    let mut wrapped = angle_deg % 360.0;
    if wrapped < -180.0 {
        wrapped += 360.0;
    }
    if wrapped >= 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

/// Computes sine and cosine for an angle in degrees.
pub(crate) fn sin_cos_deg(angle_deg: f64) -> (f64, f64) {
    wrap_deg(angle_deg).to_radians().sin_cos()
}

/// Rotation matrix of a Z-X-Z Euler rotation, in row-major order.
///
/// Multiplying a vector in the rotated (aperture) frame by this matrix gives
/// the vector in the input frame; its transpose maps the other way.
pub(crate) fn euler_zxz(angles_deg: [f64; 3]) -> [[f64; 3]; 3] {
    let (s1, c1) = sin_cos_deg(angles_deg[0]);
    let (s2, c2) = sin_cos_deg(angles_deg[1]);
    let (s3, c3) = sin_cos_deg(angles_deg[2]);
    [
        [c1 * c3 - s1 * c2 * s3, -c1 * s3 - s1 * c2 * c3, s1 * s2],
        [s1 * c3 + c1 * c2 * s3, -s1 * s3 + c1 * c2 * c3, -c1 * s2],
        [s2 * s3, s2 * c3, c2],
    ]
}

#[cfg(test)]
mod tests {
    use super::{euler_zxz, sin_cos_deg, wrap_deg};

    #[test]
    fn wrap_deg_maps_to_expected_range() {
        assert!((wrap_deg(181.0) + 179.0).abs() < 1e-12);
        assert!((wrap_deg(-181.0) - 179.0).abs() < 1e-12);
        assert!((wrap_deg(540.0) + 180.0).abs() < 1e-12);
    }

    #[test]
    fn sin_cos_deg_matches_quadrants() {
        let (sin, cos) = sin_cos_deg(90.0);
        assert!((sin - 1.0).abs() < 1e-12);
        assert!(cos.abs() < 1e-12);
    }

    #[test]
    fn euler_zero_is_identity() {
        let m = euler_zxz([0.0, 0.0, 0.0]);
        for (i, row) in m.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((v - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn euler_first_angle_rotates_in_plane() {
        let m = euler_zxz([90.0, 0.0, 0.0]);
        // x axis of the rotated frame points along +y of the input frame
        assert!(m[0][0].abs() < 1e-12);
        assert!((m[1][0] - 1.0).abs() < 1e-12);
    }
}
