// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::{
    error::RenderError,
    html_flake,
    options::OptionMap,
    renderer::{Renderer, Variant},
};

use super::{
    inline::{replace_spans, scan_inline},
    make_marker, MarkerRegistry,
};

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\s*)(`{3,}|~{3,})").unwrap());
static BLOCK_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(`{3,}|~{3,})math").unwrap());

enum Fence {
    None,
    /// Plain code fence, passed through untouched.
    Code { close: String },
    Math { close: String, lines: Vec<String> },
}

/// Swaps math blocks and inline formulas for marker tokens.
pub struct MarkerPreprocessor<'a> {
    renderer: &'a Renderer,
    options: &'a OptionMap,
    registry: &'a mut MarkerRegistry,
}

impl<'a> MarkerPreprocessor<'a> {
    pub fn new(
        renderer: &'a Renderer,
        options: &'a OptionMap,
        registry: &'a mut MarkerRegistry,
    ) -> MarkerPreprocessor<'a> {
        MarkerPreprocessor {
            renderer,
            options,
            registry,
        }
    }

    pub fn run<I, S>(&mut self, lines: I) -> Result<Vec<String>, RenderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Vec::new();
        let mut fence = Fence::None;

        for line in lines {
            let line: String = line.into();
            fence = match fence {
                Fence::Code { close } => {
                    let is_closing = line.trim_end() == close;
                    out.push(line);
                    match is_closing {
                        true => Fence::None,
                        false => Fence::Code { close },
                    }
                }
                Fence::Math { close, mut lines } => {
                    let is_closing = line.trim_end() == close;
                    lines.push(line);
                    match is_closing {
                        true => {
                            out.push(self.make_tag_for_block(&lines)?);
                            Fence::None
                        }
                        false => Fence::Math { close, lines },
                    }
                }
                Fence::None => {
                    if let Some(close) = closing_fence(&BLOCK_START_RE, &line) {
                        Fence::Math {
                            close,
                            lines: vec![line],
                        }
                    } else if let Some(close) = closing_fence(&FENCE_RE, &line) {
                        out.push(line);
                        Fence::Code { close }
                    } else {
                        out.push(self.replace_inline(&line)?);
                        Fence::None
                    }
                }
            };
        }

        // unclosed math block
        if let Fence::Math { lines, .. } = fence {
            out.extend(lines);
        }
        Ok(out)
    }

    fn make_tag_for_block(&mut self, block_lines: &[String]) -> Result<String, RenderError> {
        let first = &block_lines[0];
        let indent = &first[..first.len() - first.trim_start().len()];

        let block_text = block_lines
            .iter()
            .map(|line| dedent(line, indent.len()))
            .collect::<Vec<_>>()
            .join("\n");
        let block_text = block_text.trim_end();

        let marker = make_marker(Variant::Display, block_text);
        let html = block_to_html(self.renderer, block_text, self.options)?;
        self.registry.insert(marker.clone(), html_flake::html_paragraph(&html));
        Ok(format!("{}{}", indent, marker))
    }

    fn replace_inline(&mut self, line: &str) -> Result<String, RenderError> {
        let spans = scan_inline(line);
        if spans.is_empty() {
            return Ok(line.to_string());
        }

        let mut markers = Vec::with_capacity(spans.len());
        for span in &spans {
            let formula = span.formula(line);
            let marker = make_marker(Variant::Inline, formula);
            if !self.registry.contains(&marker) {
                let html = self.renderer.render(formula, Variant::Inline, self.options)?;
                self.registry.insert(marker.clone(), html);
            }
            markers.push(marker);
        }
        Ok(replace_spans(line, &spans, &markers))
    }
}

/// The line that closes a fence opened by `line`: same indent, same run.
fn closing_fence(opening: &Regex, line: &str) -> Option<String> {
    opening
        .captures(line)
        .map(|caps| format!("{}{}", &caps[1], &caps[2]))
}

/// Strip up to `indent` bytes of leading whitespace.
fn dedent(line: &str, indent: usize) -> &str {
    let mut cut = 0;
    for (i, c) in line.char_indices() {
        if i >= indent || !c.is_whitespace() {
            break;
        }
        cut = i + c.len_utf8();
    }
    &line[cut..]
}

/// Text between the opening ```` ```math ```` and the closing fence. Its first
/// line is whatever followed `math` on the opening fence.
fn strip_fences(block_text: &str) -> &str {
    let text = block_text.trim_start();
    let Some(fence_char) = text.chars().next().filter(|c| *c == '`' || *c == '~') else {
        return block_text;
    };
    let fence_len = text.len() - text.trim_start_matches(fence_char).len();
    let (fence, rest) = text.split_at(fence_len);
    match rest.strip_prefix("math").and_then(|rest| rest.strip_suffix(fence)) {
        Some(inner) if fence_len >= 3 => inner,
        _ => block_text,
    }
}

/// Render a whole fenced math block, including its optional `{...}` header.
pub fn block_to_html(
    renderer: &Renderer,
    block_text: &str,
    default_options: &OptionMap,
) -> Result<String, RenderError> {
    let mut options = default_options.clone();
    let mut tex = strip_fences(block_text);

    let (header, rest) = tex.split_once('\n').unwrap_or((tex, ""));
    if let (Some(open), Some(close)) = (header.find('{'), header.rfind('}')) {
        if open < close {
            let overrides: OptionMap =
                serde_json::from_str(&header[open..=close]).map_err(|source| RenderError::Header {
                    block: block_text.to_string(),
                    source,
                })?;
            options.extend(overrides);
            tex = rest;
        }
    }

    renderer.render(tex, Variant::Display, &options)
}
