mod report;
mod runner;

pub use report::{report_fci_summary, report_ras_summary, report_rdm34};
pub use runner::{resolve_params, run_fci, run_ras};

use crate::config::{Args, Config};
use crate::io::{load_config, load_system, setup_output};
use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;

pub struct FciApplication {
    args: Args,
    config: Config,
}

impl FciApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let config = load_config(&args.config_file)?;
        Ok(Self { args, config })
    }

    pub fn new(args: Args, config: Config) -> Self {
        Self { args, config }
    }

    pub fn run(self) -> Result<()> {
        let output = self.args.output.as_ref().or(self.config.output.as_ref());
        setup_output(output);

        let (reference, integrals) = load_system(&self.config)?;
        let params = resolve_params(&self.args, &self.config);

        match &self.config.ras {
            Some(ras) => {
                info!("Using RAS-CI with partition {:?}", ras.ras);
                let ci = run_ras(&reference, &integrals, params, ras.clone())?;
                report_ras_summary(&ci);
            }
            None => {
                info!("Using determinant FCI");
                let fci = run_fci(&reference, &integrals, params)?;
                report_fci_summary(&fci);
                if self.args.rdm34 {
                    report_rdm34(&fci, 0);
                }
            }
        }

        Ok(())
    }
}
