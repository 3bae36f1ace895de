//! Update command - Run the configured update command with elevated privileges

use anyhow::Result;
use owo_colors::OwoColorize;

use projdock::process::{require_command, Invocation, Runner};
use projdock::workspace::{settings, ConfigStore};

const ELEVATE: &str = "sudo";

pub fn execute<R: Runner>(store: &ConfigStore, runner: &R) -> Result<()> {
    let [command] = settings::require(store, [settings::UPDATE_COMMAND])?;
    require_command(ELEVATE, "Updating needs administrator rights via sudo.")?;

    println!("{} {}", "Updating:".green(), command.dimmed());
    let inv = Invocation::new(ELEVATE, ["sh", "-c", command]).interactive();
    runner.run(&inv)?.check(&inv)?;

    println!("{}", "Update complete.".green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use projdock::process::SystemRunner;

    #[test]
    fn test_update_requires_command_setting() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("config")).unwrap();
        let err = execute(&store, &SystemRunner).unwrap_err();
        assert!(err.to_string().contains("update_command"));
    }
}
