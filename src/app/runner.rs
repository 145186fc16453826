use crate::config::{Args, Config, FciParams, RasParams};
use crate::integrals::{MoIntegrals, Reference};
use crate::{Fci, RasCi};
use color_eyre::eyre::Result;
use tracing::info;

/// FCI options from the configuration file with command-line overrides applied
pub fn resolve_params(args: &Args, config: &Config) -> FciParams {
    let mut params = config.fci_params();
    if args.nstate.is_some() {
        params.nstate = args.nstate;
        params.nguess = args.nstate.max(params.nguess);
    }
    if args.nspin.is_some() {
        params.nspin = args.nspin;
    }
    if args.charge.is_some() {
        params.charge = args.charge;
    }
    if args.max_iter.is_some() {
        params.max_iter = args.max_iter;
    }
    if args.thresh.is_some() {
        params.thresh = args.thresh;
    }
    if args.threads.is_some() {
        params.nthreads = args.threads;
    }
    if args.restart {
        params.restart = Some(true);
    }
    params
}

pub fn run_fci<I: MoIntegrals + ?Sized>(
    reference: &Reference,
    integrals: &I,
    params: FciParams,
) -> Result<Fci> {
    info!("\nInitializing FCI calculation...");
    let mut fci = Fci::new(reference, integrals, params)?;
    info!("\nStarting Davidson iterations...\n");
    fci.compute()?;
    fci.compute_rdm12();
    Ok(fci)
}

pub fn run_ras<I: MoIntegrals + ?Sized>(
    reference: &Reference,
    integrals: &I,
    params: FciParams,
    ras: RasParams,
) -> Result<RasCi> {
    info!("\nInitializing RAS-CI calculation...");
    let mut ci = RasCi::new(reference, integrals, params, ras)?;
    info!("\nStarting Davidson iterations...\n");
    ci.compute()?;
    ci.compute_rdm1();
    Ok(ci)
}
