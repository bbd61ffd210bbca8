use anyhow::{bail, Result};
use clap::{ArgMatches, Command};
use clap_complete::{generate, Shell};
use std::io;

const SUPPORTED_SHELLS: &str = "bash, zsh, fish, powershell, elvish";

fn parse_shell(name: &str) -> Option<Shell> {
    match name.to_lowercase().as_str() {
        "bash" => Some(Shell::Bash),
        "zsh" => Some(Shell::Zsh),
        "fish" => Some(Shell::Fish),
        "powershell" => Some(Shell::PowerShell),
        "elvish" => Some(Shell::Elvish),
        _ => None,
    }
}

/// Print a completion script for the requested shell to stdout
pub fn execute(matches: &ArgMatches, cli: &mut Command) -> Result<()> {
    let Some(name) = matches.get_one::<String>("shell") else {
        bail!("shell argument is required (supported: {})", SUPPORTED_SHELLS);
    };

    let Some(shell) = parse_shell(name) else {
        bail!("Unsupported shell: {} (supported: {})", name, SUPPORTED_SHELLS);
    };

    generate(shell, cli, "thermwatch", &mut io::stdout());
    Ok(())
}
