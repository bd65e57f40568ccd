// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

use pulldown_cmark::{html, Options, Parser};

use crate::{
    error::RenderError,
    options::{OptionMap, INSERT_FONTS_CSS},
    process::{
        postprocess::{substitute_markers, Postprocessed},
        preprocess::MarkerPreprocessor,
        MarkerRegistry,
    },
    renderer::Renderer,
};

/// Math syntax stays disabled, formulas are handled by [`MathExtension`].
pub const OPTIONS: Options = Options::ENABLE_TABLES
    .union(Options::ENABLE_FOOTNOTES)
    .union(Options::ENABLE_STRIKETHROUGH);

/// Hooks rendering katex formulas around a markdown formatter.
pub struct MathExtension {
    renderer: Renderer,
    options: OptionMap,
}

impl MathExtension {
    /// `options` are the default katex options of every formula, plus the
    /// extension-only `no_inline_svg` and `insert_fonts_css`.
    pub fn new(renderer: Renderer, options: OptionMap) -> Result<MathExtension, RenderError> {
        renderer.schema().validate(&options)?;
        Ok(MathExtension { renderer, options })
    }

    #[cfg(test)]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    #[cfg(test)]
    pub fn options(&self) -> &OptionMap {
        &self.options
    }

    fn insert_fonts_css(&self) -> bool {
        self.options
            .get(INSERT_FONTS_CSS)
            .map_or(true, |v| v.is_truthy())
    }

    /// Replace every formula of `lines` with a marker recorded in `registry`.
    pub fn preprocess<I, S>(&self, lines: I, registry: &mut MarkerRegistry) -> Result<Vec<String>, RenderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MarkerPreprocessor::new(&self.renderer, &self.options, registry).run(lines)
    }

    pub fn postprocess(&self, text: &str, registry: &MarkerRegistry) -> Postprocessed {
        substitute_markers(text, registry, self.insert_fonts_css())
    }
}

/// Format a markdown document, rendering its formulas with katex.
///
/// `registry` is reset first; it holds this document's markers afterwards.
pub fn markdown_to_html(
    source: &str,
    ext: &MathExtension,
    registry: &mut MarkerRegistry,
) -> Result<String, RenderError> {
    registry.clear();
    let lines = ext.preprocess(source.lines(), registry)?;
    let markdown = lines.join("\n");

    let mut html_output = String::new();
    html::push_html(&mut html_output, Parser::new_ext(&markdown, OPTIONS));

    let Postprocessed { text, missing } = ext.postprocess(&html_output, registry);
    for marker in missing {
        color_print::ceprintln!("<y>Warning: could not find marker `{}` in the output.</>", marker);
    }
    Ok(text)
}
