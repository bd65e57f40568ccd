// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

use crate::html_flake;

use super::MarkerRegistry;

#[derive(Debug)]
pub struct Postprocessed {
    pub text: String,
    /// Registered markers absent from the formatted text.
    pub missing: Vec<String>,
}

/// Put the rendered markup back in place of every marker of `registry`.
///
/// A block marker usually comes back wrapped in a paragraph by the markdown
/// formatter; that wrapping is replaced along with it.
pub fn substitute_markers(text: &str, registry: &MarkerRegistry, insert_styles: bool) -> Postprocessed {
    let mut text = text.to_string();
    let mut missing = Vec::new();
    if registry.is_empty() {
        return Postprocessed { text, missing };
    }

    let styles = html_flake::html_katex_styles();
    if insert_styles && !text.contains(&styles) {
        text.insert_str(0, &styles);
    }

    for (marker, html) in registry.iter() {
        if !text.contains(marker) {
            missing.push(marker.to_string());
            continue;
        }
        let wrapped_marker = html_flake::html_paragraph(marker);
        while text.contains(marker) {
            text = match text.contains(&wrapped_marker) {
                true => text.replace(&wrapped_marker, html),
                false => text.replace(marker, html),
            };
        }
    }

    Postprocessed { text, missing }
}
