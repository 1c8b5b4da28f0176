use anyhow::Result;
use clap::Parser;
use ttstream::cli::{
    Cli, Commands, apply_overrides, handle_config_command, load_config, run_convert,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config { ref action }) => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        None => {
            let config = load_config(cli.config.as_deref())?;
            let config = apply_overrides(&cli, config)?;
            let stats = run_convert(&cli, &config)?;
            if !cli.quiet && cli.verbose >= 1 {
                eprintln!("ttstream {}: {}", ttstream::version_string(), stats);
            }
            if !cli.quiet && stats.malformed_records > 0 {
                eprintln!(
                    "ttstream: skipped {} malformed record(s)",
                    stats.malformed_records
                );
            }
        }
    }

    Ok(())
}
