// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

use camino::Utf8Path;
use eyre::WrapErr;

use crate::config;

#[derive(clap::Args)]
pub struct OptionsCommand {
    /// Path to the configuration file (e.g., "mdkatex.toml").
    #[arg(short, long, default_value_t = config::DEFAULT_CONFIG_PATH.into())]
    config: String,
}

/// Print the options accepted by the resolved katex as JSON.
pub fn options(command: &OptionsCommand) -> eyre::Result<()> {
    let config = config::load_config(Utf8Path::new(&command.config))?;
    let renderer = config.katex.renderer()?;
    let json = serde_json::to_string_pretty(renderer.schema())
        .wrap_err("failed to serialize katex options")?;
    println!("{}", json);
    Ok(())
}
