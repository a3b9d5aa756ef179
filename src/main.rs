use clap::Parser;
use std::process::ExitCode;
use tunnel_roster::cli::{Command, RootArgs};
use tunnel_roster::{error, logging, workflow};

fn main() -> ExitCode {
    let args = RootArgs::parse();
    logging::init(args.verbose);

    let result = match args.command {
        Command::Provision(args) => workflow::run_provision(args),
        Command::Revoke(args) => workflow::run_revoke(args),
        Command::SetMode(args) => workflow::run_set_mode(args),
        Command::ResolveIp(args) => workflow::run_resolve_ip(args),
        Command::UpdateEndpoint(args) => workflow::run_update_endpoint(args),
        Command::WritePrefs(args) => workflow::run_write_prefs(args),
        Command::RewriteEndpoint(args) => workflow::run_rewrite_endpoint(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(error::exit_code_for(&err))
        }
    }
}
