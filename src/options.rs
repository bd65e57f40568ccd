// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

use std::{fmt::Display, sync::LazyLock};

use indexmap::IndexMap;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Replace inline `<svg>` elements of the output with `<img>` tags.
pub const NO_INLINE_SVG: &str = "no_inline_svg";

/// Prepend the shared stylesheet to documents containing math.
pub const INSERT_FONTS_CSS: &str = "insert_fonts_css";

/// Options consumed by the extension itself, never passed to katex.
pub const EXTENSION_ONLY: [&str; 2] = [NO_INLINE_SVG, INSERT_FONTS_CSS];

pub const DISPLAY_MODE: &str = "display-mode";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Number(n) => write!(f, "{}", n),
            OptionValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl OptionValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            OptionValue::Bool(b) => *b,
            OptionValue::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            OptionValue::String(s) => !s.is_empty(),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::String(value.to_string())
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Number(value.into())
    }
}

pub type OptionMap = IndexMap<String, OptionValue>;

pub fn is_extension_only(name: &str) -> bool {
    EXTENSION_ONLY.contains(&name)
}

/// Turn an option map into katex command line arguments.
///
/// `true` emits a bare flag, `false` emits nothing, any other value emits
/// the flag followed by the value.
pub fn command_args(options: &OptionMap) -> Vec<String> {
    let mut args = Vec::new();
    for (name, value) in options {
        if is_extension_only(name) {
            continue;
        }
        let flag = match name.starts_with("--") {
            true => name.to_string(),
            false => format!("--{}", name),
        };
        match value {
            OptionValue::Bool(true) => args.push(flag),
            OptionValue::Bool(false) => (),
            other => {
                args.push(flag);
                args.push(other.to_string());
            }
        }
    }
    args
}

/// Known katex options, used when the installed binary cannot be asked.
pub const DEFAULT_HELP_TEXT: &str = r#"
Options:
  -V, --version              output the version number
  -d, --display-mode         Render math in display mode, which puts the math
                             in display style (so \int and \sum are large, for
                             example), and centers the math on the page on its
                             own line.
  --leqno                    Render display math in leqno style (left-justified
                             tags).
  --fleqn                    Render display math flush left.
  -t, --no-throw-on-error    Render errors (in the color given by --error-color)
                             instead of throwing a ParseError exception when
                             encountering an error.
  -c, --error-color <color>  A color string given in the format 'rgb' or
                             'rrggbb' (no #). This option determines the color
                             of errors rendered by the -t option.
  -b, --color-is-text-color  Makes \color behave like LaTeX's 2-argument
                             \textcolor, instead of LaTeX's one-argument \color
                             mode change.
  -S, --strict               Turn on strict / LaTeX faithfulness mode, which
                             throws an error if the input uses features that
                             are not supported by LaTeX.
  -s, --max-size <n>         If non-zero, all user-specified sizes, e.g. in
                             \rule{500em}{500em}, will be capped to maxSize ems.
                             Otherwise, elements and spaces can be arbitrarily
                             large
  -e, --max-expand <n>       Limit the number of macro expansions to the
                             specified number, to prevent e.g. infinite macro
                             loops. If set to Infinity, the macro expander will
                             try to fully expand as in LaTeX.
  -m, --macro <def>          Define custom macro of the form '\foo:expansion'
                             (use multiple -m arguments for multiple macros).
  -f, --macro-file <path>    Read macro definitions, one per line, from the
                             given file.
  -i, --input <path>         Read LaTeX input from the given file.
  -o, --output <path>        Write html output to the given file.
  -h, --help                 output usage information
"#;

static OPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:-[A-Za-z],\s*)?--([a-z][a-z\-]*)(?:\s+<([a-z\-]+)>)?\s*(.*)$").unwrap()
});

const IGNORED_OPTIONS: [&str; 5] = ["version", "help", "input", "output", DISPLAY_MODE];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OptionSpec {
    /// Placeholder of the option argument, e.g. `color` for `--error-color <color>`.
    pub value: Option<String>,
    pub help: String,
}

/// Option names accepted by the installed katex, with their help text.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct OptionSchema {
    options: IndexMap<String, OptionSpec>,
}

impl OptionSchema {
    pub fn parse(help_text: &str) -> OptionSchema {
        let options_text = match help_text.split_once("Options:") {
            Some((_, rest)) => rest,
            None => help_text,
        };

        let mut options: IndexMap<String, OptionSpec> = IndexMap::new();
        let mut last: Option<String> = None;
        for line in options_text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                last = None;
                continue;
            }
            if let Some(caps) = OPTION_LINE.captures(line) {
                let name = caps[1].to_string();
                let spec = OptionSpec {
                    value: caps.get(2).map(|m| m.as_str().to_string()),
                    help: caps[3].trim().to_string(),
                };
                options.insert(name.clone(), spec);
                last = Some(name);
            } else if trimmed.starts_with('-') {
                last = None;
            } else if let Some(spec) = last.as_ref().and_then(|n| options.get_mut(n)) {
                spec.help.push(' ');
                spec.help.push_str(trimmed);
            }
        }

        for name in IGNORED_OPTIONS {
            options.shift_remove(name);
        }
        OptionSchema { options }
    }

    pub fn fallback() -> OptionSchema {
        OptionSchema::parse(DEFAULT_HELP_TEXT)
    }

    /// Entries of `other` override or extend this schema.
    pub fn merge(&mut self, other: OptionSchema) {
        self.options.extend(other.options);
    }

    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.options.get(name.trim_start_matches("--"))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Every option name must be known to katex or to the extension.
    pub fn validate(&self, options: &OptionMap) -> Result<(), RenderError> {
        for name in options.keys() {
            if !is_extension_only(name) && !self.contains(name) && name != DISPLAY_MODE {
                return Err(RenderError::UnknownOption(name.to_string()));
            }
        }
        Ok(())
    }
}
