//! Standalone `Endpoint` address substitution for an unprivileged file.
use clap::Parser;
use std::process::ExitCode;
use tunnel_roster::cli::RewriteEndpointArgs;
use tunnel_roster::{error, logging, workflow};

#[derive(Parser, Debug)]
#[command(
    name = "endpoint-rewrite",
    version,
    about = "Replace the Endpoint address in a tunnel config file"
)]
struct Args {
    #[command(flatten)]
    rewrite: RewriteEndpointArgs,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(false);
    match workflow::run_rewrite_endpoint(args.rewrite) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(error::exit_code_for(&err))
        }
    }
}
