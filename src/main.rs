use clap::Parser;
use log::error;

use surveyqa::cli::{run, Cli, ReportConfig};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = ReportConfig::from(cli);
    match run(&config) {
        Ok(output) => {
            println!(
                "Wrote {} pages for {} exposures on {} tiles over {} nights to {}",
                output.files.len(),
                output.n_exposures,
                output.n_tiles,
                output.n_nights,
                config.outdir.display()
            );
            std::process::ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            std::process::ExitCode::FAILURE
        }
    }
}
