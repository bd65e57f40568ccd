// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

//! Formula extraction before markdown formatting and substitution after it.
//!
//! Each formula is swapped for an opaque marker token while the markdown is
//! formatted; the rendered HTML is recorded in a [`MarkerRegistry`] and put
//! back once formatting is done.

use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use crate::renderer::Variant;

pub mod inline;
pub mod postprocess;
pub mod preprocess;

pub const MARKER_PREFIX: &str = "tmp_";
pub const MARKER_INFIX: &str = "_md_katex_";

/// Marker token for a formula, stable across runs.
///
/// Equal `(variant, text)` pairs share a token; different text never does.
pub fn make_marker(variant: Variant, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(variant.tag().as_bytes());
    hasher.update(text.as_bytes());
    let marker_id = hex::encode(hasher.finalize());
    format!("{}{}{}{}", MARKER_PREFIX, variant.tag(), MARKER_INFIX, marker_id)
}

/// Marker token → rendered markup, for one document render.
#[derive(Debug, Default, Clone)]
pub struct MarkerRegistry {
    markers: IndexMap<String, String>,
}

impl MarkerRegistry {
    pub fn new() -> MarkerRegistry {
        MarkerRegistry::default()
    }

    /// Forget the previous document's markers.
    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn insert(&mut self, marker: String, html: String) {
        self.markers.insert(marker, html);
    }

    #[cfg(test)]
    pub fn get(&self, marker: &str) -> Option<&str> {
        self.markers.get(marker).map(|s| s.as_str())
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.markers.contains_key(marker)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.markers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
