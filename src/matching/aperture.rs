//! Matching apertures: circles/spheres, ellipses and ellipsoids.

use crate::util::math::{euler_zxz, sin_cos_deg};
use crate::util::{GalError, GalResult};

/// Region around a point inside which another point counts as a candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Aperture {
    /// Circle (sphere in 3D, interval in 1D) of the given radius.
    Radius(f64),
    /// 2D ellipse.
    Ellipse {
        /// Semi-major axis.
        major: f64,
        /// Minor to major axis ratio, in `(0, 1]`.
        axis_ratio: f64,
        /// Angle of the major axis from the first axis, in degrees.
        position_angle_deg: f64,
    },
    /// 3D ellipsoid.
    Ellipsoid {
        /// Semi-major axis.
        major: f64,
        /// Ratios of the two other semi-axes to the major one, in `(0, 1]`.
        axis_ratios: [f64; 2],
        /// Z-X-Z Euler angles of the ellipsoid axes, in degrees.
        euler_deg: [f64; 3],
    },
}

/// Aperture prepared for repeated distance evaluation.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Prepared {
    Radius(f64),
    Ellipse {
        major: f64,
        ratio: f64,
        sin: f64,
        cos: f64,
    },
    Ellipsoid {
        major: f64,
        ratios: [f64; 2],
        /// Maps input-frame offsets into the ellipsoid frame.
        to_local: [[f64; 3]; 3],
    },
}

fn check_ratio(q: f64) -> GalResult<()> {
    if q > 0.0 && q <= 1.0 {
        Ok(())
    } else {
        Err(GalError::InvalidInput("aperture axis ratio must be in (0, 1]"))
    }
}

impl Aperture {
    /// Number of coordinate dimensions this aperture can be used with.
    pub fn supports(&self, ndim: usize) -> bool {
        match self {
            Aperture::Radius(_) => (1..=3).contains(&ndim),
            Aperture::Ellipse { .. } => ndim == 2,
            Aperture::Ellipsoid { .. } => ndim == 3,
        }
    }

    /// Largest extent of the aperture along any axis.
    pub fn major(&self) -> f64 {
        match *self {
            Aperture::Radius(r) => r,
            Aperture::Ellipse { major, .. } | Aperture::Ellipsoid { major, .. } => major,
        }
    }

    pub(crate) fn prepare(&self) -> GalResult<Prepared> {
        let major = self.major();
        if !(major > 0.0 && major.is_finite()) {
            return Err(GalError::InvalidInput("aperture size must be positive and finite"));
        }
        Ok(match *self {
            Aperture::Radius(r) => Prepared::Radius(r),
            Aperture::Ellipse {
                major,
                axis_ratio,
                position_angle_deg,
            } => {
                check_ratio(axis_ratio)?;
                let (sin, cos) = sin_cos_deg(position_angle_deg);
                Prepared::Ellipse {
                    major,
                    ratio: axis_ratio,
                    sin,
                    cos,
                }
            }
            Aperture::Ellipsoid {
                major,
                axis_ratios,
                euler_deg,
            } => {
                check_ratio(axis_ratios[0])?;
                check_ratio(axis_ratios[1])?;
                let m = euler_zxz(euler_deg);
                let mut to_local = [[0.0; 3]; 3];
                for (i, row) in to_local.iter_mut().enumerate() {
                    for (j, v) in row.iter_mut().enumerate() {
                        *v = m[j][i];
                    }
                }
                Prepared::Ellipsoid {
                    major,
                    ratios: axis_ratios,
                    to_local,
                }
            }
        })
    }
}

impl Prepared {
    /// Aperture-scaled distance of offset `d`, if it falls inside.
    pub(crate) fn distance(&self, d: &[f64]) -> Option<f64> {
        let (r, limit) = match *self {
            Prepared::Radius(radius) => (d.iter().map(|v| v * v).sum::<f64>().sqrt(), radius),
            Prepared::Ellipse {
                major,
                ratio,
                sin,
                cos,
            } => {
                let x = d[0] * cos + d[1] * sin;
                let y = -d[0] * sin + d[1] * cos;
                let yq = y / ratio;
                ((x * x + yq * yq).sqrt(), major)
            }
            Prepared::Ellipsoid {
                major,
                ratios,
                to_local,
            } => {
                let mut local = [0.0; 3];
                for (l, row) in local.iter_mut().zip(&to_local) {
                    *l = row[0] * d[0] + row[1] * d[1] + row[2] * d[2];
                }
                let y = local[1] / ratios[0];
                let z = local[2] / ratios[1];
                ((local[0] * local[0] + y * y + z * z).sqrt(), major)
            }
        };
        (r <= limit).then_some(r)
    }
}
