// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

use std::sync::{LazyLock, OnceLock};

use base64::Engine;
use regex_lite::{Captures, Regex};

use crate::{
    cache::RenderCache,
    error::RenderError,
    html_flake,
    katex_cli::{HelpSource, KatexCommand},
    options::{command_args, OptionMap, OptionSchema, DISPLAY_MODE, NO_INLINE_SVG},
};

static SVG_ELEM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<svg.*?</svg>").unwrap());

const SVG_XMLNS: &str =
    r#"xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" "#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Block formula, rendered in display mode.
    Display,
    Inline,
}

impl Variant {
    pub fn tag(&self) -> &'static str {
        match self {
            Variant::Display => "block",
            Variant::Inline => "inline",
        }
    }
}

pub struct Renderer {
    command: KatexCommand,
    cache: RenderCache,
    help: Box<dyn HelpSource>,
    schema: OnceLock<OptionSchema>,
}

impl Renderer {
    pub fn new(command: KatexCommand, cache: RenderCache) -> Renderer {
        Renderer {
            help: Box::new(command.clone()),
            command,
            cache,
            schema: OnceLock::new(),
        }
    }

    /// Replace where the option help text comes from.
    #[cfg(test)]
    pub fn with_help_source<H: HelpSource + 'static>(mut self, help: H) -> Renderer {
        self.help = Box::new(help);
        self.schema = OnceLock::new();
        self
    }

    #[cfg(test)]
    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Options katex accepts: the built-in table, updated from the live
    /// `--help` output the first time it is asked for.
    pub fn schema(&self) -> &OptionSchema {
        self.schema.get_or_init(|| {
            let mut schema = OptionSchema::fallback();
            // no need to fail just for the options
            if let Ok(help_text) = self.help.help_text() {
                schema.merge(OptionSchema::parse(&help_text));
            }
            schema
        })
    }

    /// Render `tex` to HTML, going through the cache.
    pub fn render(&self, tex: &str, variant: Variant, options: &OptionMap) -> Result<String, RenderError> {
        let mut effective = OptionMap::new();
        if variant == Variant::Display {
            effective.insert(DISPLAY_MODE.to_string(), true.into());
        }
        effective.extend(options.iter().map(|(k, v)| (k.clone(), v.clone())));

        let no_inline_svg = effective.get(NO_INLINE_SVG).is_some_and(|v| v.is_truthy());
        let args = command_args(&effective);
        let key_parts: Vec<String> = self.command.parts().iter().chain(&args).cloned().collect();

        let html = self.cache.render(tex, &key_parts, |input, output| {
            self.command.render_file(tex, &args, input, output)
        })?;

        Ok(match no_inline_svg {
            true => svg_to_img(&html),
            false => html,
        })
    }
}

/// Convert inline `<svg>` elements into base64 data URI images.
pub fn svg_to_img(html: &str) -> String {
    SVG_ELEM_RE
        .replace_all(html, |caps: &Captures| {
            let mut svg_text = caps[0].to_string();
            if !svg_text.contains("xmlns") {
                svg_text = svg_text.replacen("<svg ", &format!("<svg {}", SVG_XMLNS), 1);
            }
            let img_b64 = base64::engine::general_purpose::STANDARD.encode(svg_text.as_bytes());
            html_flake::html_data_img("image/svg+xml", &img_b64)
        })
        .into_owned()
}
