mod cli;
mod paths;
mod run;
mod settings;

use anyhow::Result;
use cli::{Command, ConfigAction, RunArgs};
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Config(config_cmd)) => handle_config_command(config_cmd.action, &cli.run),
        None => run::run(cli.run),
    }
}

fn handle_config_command(action: ConfigAction, args: &RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    match action {
        ConfigAction::Show => run_config_show(&paths, args),
        ConfigAction::Where => run_config_where(&paths, args),
        ConfigAction::Save => run_config_save(&paths, args),
    }
}

fn run_config_show(paths: &AppPaths, args: &RunArgs) -> Result<()> {
    let config = run::effective_configuration(args, paths)?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn run_config_where(paths: &AppPaths, args: &RunArgs) -> Result<()> {
    let file = run::config_path(args, paths);
    println!("Configuration:");
    println!("  dir:    {}", paths.config_dir().display());
    println!(
        "  file:   {} ({})",
        file.display(),
        if file.exists() { "present" } else { "missing" }
    );
    Ok(())
}

fn run_config_save(paths: &AppPaths, args: &RunArgs) -> Result<()> {
    let config = run::effective_configuration(args, paths)?;
    let file = run::config_path(args, paths);
    settings::save_configuration(&config, &file)?;
    println!("Saved settings to {}", file.display());
    Ok(())
}
