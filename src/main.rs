use clap::Parser;
use log::{debug, info};
use snafu::ErrorCompat;

mod args;
mod epi;

fn main() {
    let args = args::Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    debug!("args: {:?}", args);

    let res = epi::run_report(&args);
    if let Err(e) = res {
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
    info!("Report completed");
}
