// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::telemetry::setup_simple_tracing;
use crate::{check, keygen, list, show, submit, verify, watch};
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing::{info, instrument, Level};
use tvr_config::load_config;
use tvr_reports::DraftReport;

#[derive(Parser, Debug)]
#[command(name = "violations")]
#[command(about = "Report traffic violations with an encrypted severity and reveal it on request", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Increase log output with additional `-v` arguments. Eg. `violations -vvv` gives trace
    /// level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Only log errors. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        setup_simple_tracing(self.log_level());
        let config = load_config(self.config.as_deref())?;
        info!("Config loaded from: {:?}", config.config_file());

        match self.command {
            Commands::List { search, json } => list::execute(&config, search, json).await?,
            Commands::Show { id } => show::execute(&config, &id).await?,
            Commands::Submit {
                plate,
                location,
                severity,
                reference_hash,
            } => {
                let draft = DraftReport {
                    license_plate: plate,
                    location,
                    severity,
                    reference_hash,
                };
                submit::execute(&config, draft).await?
            }
            Commands::Verify { id } => verify::execute(&config, &id).await?,
            Commands::Check => check::execute(&config).await?,
            Commands::Keygen => keygen::execute(&config)?,
            Commands::Watch { search } => watch::execute(&config, search).await?,
        }

        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the dashboard: counters and the report grid
    List {
        /// Only show reports whose plate or location contains this text
        #[arg(long)]
        search: Option<String>,

        /// Print the dashboard as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single report
    Show {
        /// Report id, eg. `violation-1700000000000-a1b2`
        id: String,
    },

    /// Submit a new report with an encrypted severity
    Submit {
        /// License plate of the vehicle
        #[arg(long)]
        plate: String,

        /// Where the violation happened
        #[arg(long)]
        location: String,

        /// Severity from 1 to 10
        #[arg(long)]
        severity: String,

        /// Hash of the evidence backing the report
        #[arg(long = "reference-hash")]
        reference_hash: String,
    },

    /// Reveal the severity of a report on chain
    Verify {
        /// Report id
        id: String,
    },

    /// Check that the reports contract answers
    Check,

    /// Generate the BFV key pair at the configured paths
    Keygen,

    /// Redraw the dashboard whenever a report is created or verified
    Watch {
        /// Only show reports whose plate or location contains this text
        #[arg(long)]
        search: Option<String>,
    },
}
