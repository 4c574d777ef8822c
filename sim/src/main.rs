// Copyright (c) 2022-2023 The MobileCoin Foundation

use clap::Parser;
use log::{debug, info, LevelFilter};

use jade_sim::*;

/// Jade device simulator
///
/// This runs a software wallet behind the device RPC protocol,
/// with serial and BLE transports exposed as TCP listeners
/// (see https://docs.rs/jade-sim).
#[derive(Clone, Debug, PartialEq, Parser)]
pub struct Args {
    #[clap(flatten)]
    sim_opts: Options,

    /// Log level
    #[clap(long, default_value = "debug", env)]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging
    let mut c = simplelog::ConfigBuilder::new();
    c.add_filter_ignore_str("tokio");
    c.add_filter_ignore_str("mio");

    let _ = simplelog::SimpleLogger::init(args.log_level, c.build());

    info!("Launching simulator...");

    let drv = SoftDriver::new(args.sim_opts.driver());
    let sim = Simulator::new(drv, args.sim_opts.config());

    // Await listener exit or exit signal
    tokio::select!(
        r = sim.run(&args.sim_opts) => {
            debug!("Complete!");
            r?;
        }
        // Exit on ctrl + c
        _ = tokio::signal::ctrl_c() => {
            debug!("Exit!");
        },
    );

    Ok(())
}
