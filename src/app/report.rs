use crate::rdm::Rdm1;
use crate::{Fci, RasCi};
use tracing::info;

pub fn report_fci_summary(fci: &Fci) {
    info!("\nFCI calculation finished ({:?}).", fci.status());
    report_energies(fci.energies(), fci.errors());
    report_occupations(&fci.rdm1_av());
}

pub fn report_ras_summary(ci: &RasCi) {
    info!("\nRAS-CI calculation finished ({:?}).", ci.status());
    report_energies(ci.energies(), ci.errors());
    report_occupations(&ci.rdm1_av());
}

pub fn report_rdm34(fci: &Fci, state: usize) {
    let (rdm3, rdm4) = fci.compute_rdm34(state);
    let n = fci.norb();
    let trace3: f64 = (0..n.pow(3))
        .map(|x| rdm3.element(&[x / (n * n), x / (n * n), (x / n) % n, (x / n) % n, x % n, x % n]))
        .sum();
    let trace4: f64 = (0..n.pow(4))
        .map(|x| {
            let (i, j, k, l) = (x / n.pow(3), (x / (n * n)) % n, (x / n) % n, x % n);
            rdm4.element(&[i, i, j, j, k, k, l, l])
        })
        .sum();
    info!("\nState {} three-particle RDM trace: {:.8}", state, trace3);
    info!("State {} four-particle RDM trace:  {:.8}", state, trace4);
}

fn report_energies(energies: &[f64], errors: &[f64]) {
    info!("\nFinal state energies:");
    for (state, (energy, error)) in energies.iter().zip(errors).enumerate() {
        info!("  State {:>3}: {:.10} au  (residual {:.2e})", state, energy, error);
    }
}

fn report_occupations(rdm1: &Rdm1) {
    let (occupations, _) = rdm1.natural_orbitals();
    info!("\nState-averaged natural orbital occupations:");
    for (i, n) in occupations.iter().enumerate() {
        info!("  {:>3}: {:.6}", i + 1, n);
    }
}
