// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

mod cache;
mod cli;
mod config;
mod error;
mod html_flake;
mod katex_cli;
mod markdown;
mod options;
mod process;
mod renderer;

#[cfg(all(test, unix))]
mod test_support;

use clap::Parser;

use crate::cli::{
    exec::ExecCommand, options::OptionsCommand, render::RenderCommand,
    selftest::SelftestCommand,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Render markdown files with katex formulas to HTML.
    #[command(visible_alias = "r")]
    Render(RenderCommand),

    /// Print the options accepted by the installed katex.
    #[command(visible_alias = "o")]
    Options(OptionsCommand),

    /// Render the built-in test formulas into a standalone page.
    #[command()]
    Selftest(SelftestCommand),

    /// Run katex directly with the given arguments.
    #[command(disable_help_flag = true)]
    Exec(ExecCommand),
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Render(command) => crate::cli::render::render(command)?,
        Command::Options(command) => crate::cli::options::options(command)?,
        Command::Selftest(command) => crate::cli::selftest::selftest(command)?,
        Command::Exec(command) => {
            let code = crate::cli::exec::exec(command)?;
            if code != 0 {
                std::process::exit(code);
            }
        }
    };
    Ok(())
}
