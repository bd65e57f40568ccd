// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

use camino::Utf8Path;

use crate::config;

#[derive(clap::Args)]
pub struct ExecCommand {
    /// Path to the configuration file (e.g., "mdkatex.toml").
    #[arg(long, default_value_t = config::DEFAULT_CONFIG_PATH.into())]
    config: String,

    /// Arguments passed on to katex.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Run katex with the given arguments. Returns its exit code.
pub fn exec(command: &ExecCommand) -> eyre::Result<i32> {
    let config = config::load_config(Utf8Path::new(&command.config))?;
    let katex = config.katex.katex_command()?;

    if command.args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!(
            "{} version: {} (using binary: {})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            katex.parts().join(" ")
        );
    }

    Ok(katex.passthrough(&command.args)?)
}
