//! Structural world-coordinate metadata.
//!
//! Projection math lives with the file I/O collaborators; here the WCS is only
//! carried along, truncated when a dimension disappears and shifted when a
//! sub-region is copied out. Axes use the same slowest-first order as
//! [`crate::Data::dsize`]; reference pixels are zero-based.

/// Linear WCS description, one entry per axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Wcs {
    pub crpix: Vec<f64>,
    pub crval: Vec<f64>,
    pub cdelt: Vec<f64>,
    pub ctype: Vec<String>,
    pub cunit: Vec<String>,
    /// Row-major `naxis x naxis` linear transformation matrix.
    pub pc: Vec<f64>,
}

impl Wcs {
    /// Identity WCS with unit increments for `naxis` axes.
    pub fn identity(naxis: usize) -> Self {
        let mut pc = vec![0.0; naxis * naxis];
        for i in 0..naxis {
            pc[i * naxis + i] = 1.0;
        }
        Self {
            crpix: vec![0.0; naxis],
            crval: vec![0.0; naxis],
            cdelt: vec![1.0; naxis],
            ctype: vec![String::new(); naxis],
            cunit: vec![String::new(); naxis],
            pc,
        }
    }

    pub fn naxis(&self) -> usize {
        self.crpix.len()
    }

    /// Drops axis `axis`, including its row and column of the PC matrix.
    pub fn remove_axis(&mut self, axis: usize) {
        let n = self.naxis();
        if axis >= n {
            return;
        }
        self.crpix.remove(axis);
        self.crval.remove(axis);
        self.cdelt.remove(axis);
        self.ctype.remove(axis);
        self.cunit.remove(axis);
        let mut pc = Vec::with_capacity((n - 1) * (n - 1));
        for i in (0..n).filter(|&i| i != axis) {
            for j in (0..n).filter(|&j| j != axis) {
                pc.push(self.pc[i * n + j]);
            }
        }
        self.pc = pc;
    }

    /// Moves the reference pixel for a sub-array that starts at `start`.
    pub fn shift_reference(&mut self, start: &[usize]) {
        for (crpix, &s) in self.crpix.iter_mut().zip(start) {
            *crpix -= s as f64;
        }
    }
}
