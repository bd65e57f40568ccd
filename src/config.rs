// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{eyre, WrapErr};
use serde::{Deserialize, Serialize};

use crate::{
    cache::RenderCache,
    katex_cli::{self, KatexCommand},
    markdown::MathExtension,
    options::{OptionMap, OptionValue, INSERT_FONTS_CSS, NO_INLINE_SVG},
    renderer::Renderer,
};

pub const DEFAULT_CONFIG_PATH: &str = "./mdkatex.toml";
pub const DEFAULT_CACHE_DIR_NAME: &str = "mdkatex";

#[derive(Deserialize, Debug, Default, Serialize)]
pub struct Config {
    #[serde(default)]
    pub katex: Katex,
}

#[derive(Deserialize, Debug, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Katex {
    /// Explicit katex command line; discovered on `PATH` when absent.
    pub command: Option<Vec<String>>,
    pub cache_dir: Option<Utf8PathBuf>,
    pub no_inline_svg: bool,
    pub insert_fonts_css: bool,
    /// Default options passed to katex for every formula.
    pub options: OptionMap,
}

impl Default for Katex {
    fn default() -> Self {
        Self {
            command: None,
            cache_dir: None,
            no_inline_svg: false,
            insert_fonts_css: true,
            options: OptionMap::new(),
        }
    }
}

impl Katex {
    pub fn cache_dir(&self) -> Utf8PathBuf {
        match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => {
                let temp_dir = std::env::temp_dir().join(DEFAULT_CACHE_DIR_NAME);
                Utf8PathBuf::from_path_buf(temp_dir)
                    .unwrap_or_else(|_| Utf8PathBuf::from(".cache").join(DEFAULT_CACHE_DIR_NAME))
            }
        }
    }

    /// Options of the extension: katex defaults plus the extension switches.
    pub fn extension_options(&self) -> OptionMap {
        let mut options = self.options.clone();
        if self.no_inline_svg {
            options.insert(NO_INLINE_SVG.to_string(), OptionValue::Bool(true));
        }
        if !self.insert_fonts_css {
            options.insert(INSERT_FONTS_CSS.to_string(), OptionValue::Bool(false));
        }
        options
    }

    pub fn katex_command(&self) -> eyre::Result<KatexCommand> {
        match &self.command {
            Some(parts) if !parts.is_empty() => Ok(KatexCommand::new(parts.clone())),
            _ => Ok(katex_cli::discover(self.cache_dir().as_std_path())?),
        }
    }

    pub fn renderer(&self) -> eyre::Result<Renderer> {
        let cache_dir = self.cache_dir();
        let cache = RenderCache::new(&cache_dir)
            .wrap_err_with(|| eyre!("failed to create cache directory `{}`", cache_dir))?;
        Ok(Renderer::new(self.katex_command()?, cache))
    }

    pub fn extension(&self) -> eyre::Result<MathExtension> {
        Ok(MathExtension::new(self.renderer()?, self.extension_options())?)
    }
}

/// Load the configuration at `toml_file`, or the defaults if there is none.
pub fn load_config(toml_file: &Utf8Path) -> eyre::Result<Config> {
    if !toml_file.exists() {
        return Ok(Config::default());
    }
    let toml = std::fs::read_to_string(toml_file)
        .wrap_err_with(|| eyre!("failed to read configuration file `{}`", toml_file))?;
    parse_config(&toml)
}

pub fn parse_config(config: &str) -> eyre::Result<Config> {
    let config: Config =
        toml::from_str(config).map_err(|e| eyre!("failed to parse config file: {}", e))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml() {
        let config = parse_config("").unwrap();
        assert!(config.katex.command.is_none());
        assert!(config.katex.cache_dir.is_none());
        assert!(!config.katex.no_inline_svg);
        assert!(config.katex.insert_fonts_css);
        assert!(config.katex.options.is_empty());
        assert!(config.katex.extension_options().is_empty());
        assert!(config.katex.cache_dir().ends_with(DEFAULT_CACHE_DIR_NAME));
    }

    #[test]
    fn test_simple_toml() {
        let config = parse_config(
            r#"
            [katex]
            command = ["npx", "--no-install", "katex"]
            cache-dir = "/tmp/formulas"
            no-inline-svg = true
            insert-fonts-css = false

            [katex.options]
            macro-file = "macros.tex"
            max-size = 10
            fleqn = true
            "#,
        )
        .unwrap();

        let katex = &config.katex;
        assert_eq!(katex.command.as_ref().unwrap().len(), 3);
        assert_eq!(katex.cache_dir(), Utf8PathBuf::from("/tmp/formulas"));
        assert_eq!(katex.options["macro-file"], OptionValue::from("macros.tex"));
        assert_eq!(katex.options["max-size"].to_string(), "10");
        assert_eq!(
            katex.options.keys().collect::<Vec<_>>(),
            ["macro-file", "max-size", "fleqn"]
        );

        let options = katex.extension_options();
        assert_eq!(options[NO_INLINE_SVG], OptionValue::Bool(true));
        assert_eq!(options[INSERT_FONTS_CSS], OptionValue::Bool(false));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Utf8Path::new("./no-such-dir/mdkatex.toml")).unwrap();
        assert!(config.katex.insert_fonts_css);
    }
}
