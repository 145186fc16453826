//! Vector operations shared by dense and RAS CI vectors

use color_eyre::eyre::{bail, Result};

/// What the Davidson solver and the CI drivers need from a CI vector
pub trait CiVector: Clone + Send + Sync {
    /// Zero vector over the same space
    fn zeros_like(&self) -> Self;

    fn dot(&self, other: &Self) -> f64;

    /// self += a * other
    fn ax_plus_y(&mut self, a: f64, other: &Self);

    fn scale(&mut self, factor: f64);

    /// Number of coefficients
    fn ndet(&self) -> usize;

    /// Elementwise self_I /= min(energy - diag_I, -0.1)
    fn precondition(&mut self, energy: f64, diag: &Self);

    /// S² applied to the vector
    fn spin(&self) -> Self;

    /// (nelea - neleb, nelea + neleb) of the underlying space
    fn spin_range(&self) -> (usize, usize);

    /// <c|S²|c>
    fn spin_expectation(&self) -> f64 {
        self.dot(&self.spin())
    }

    /// Project out spin contaminants S > nspin/2 until <S²> is pure
    ///
    /// Each step applies 1 - S²/(s(s+1)) for the next contaminant s = k/2 and
    /// renormalises. Fails once every representable contaminant is exhausted.
    fn spin_decontaminate(&mut self, thresh: f64) -> Result<()> {
        let (nspin, max_spin) = self.spin_range();
        let pure_expectation = 0.25 * (nspin * (nspin + 2)) as f64;

        self.normalize();
        let mut s2 = self.spin();
        let mut actual_expectation = self.dot(&s2);
        let mut k = nspin + 2;
        while (actual_expectation - pure_expectation).abs() > thresh {
            if k > max_spin {
                bail!(
                    "Spin decontamination failed: <S^2> = {:.12}, expected {:.12}",
                    actual_expectation,
                    pure_expectation
                );
            }
            let factor = -4.0 / (k * (k + 2)) as f64;
            self.ax_plus_y(factor, &s2);
            self.normalize();

            s2 = self.spin();
            actual_expectation = self.dot(&s2);
            k += 2;
        }
        Ok(())
    }

    fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    fn rms(&self) -> f64 {
        let n = self.ndet();
        if n == 0 {
            0.0
        } else {
            self.norm() / (n as f64).sqrt()
        }
    }

    /// Normalise in place; returns the norm before scaling
    fn normalize(&mut self) -> f64 {
        let norm = self.norm();
        let rescale = if norm * norm > 1.0e-60 { 1.0 / norm } else { 0.0 };
        self.scale(rescale);
        norm
    }

    /// Remove the component along a normalised vector
    fn project_out(&mut self, other: &Self) {
        let overlap = self.dot(other);
        self.ax_plus_y(-overlap, other);
    }
}

#[inline]
pub(crate) fn precondition_slice(data: &mut [f64], energy: f64, diag: &[f64]) {
    for (x, d) in data.iter_mut().zip(diag) {
        *x /= (energy - d).min(-0.1);
    }
}
