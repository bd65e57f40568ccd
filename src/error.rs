// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// No usable katex command on any search path.
    #[error("katex binary not found (searched: {searched}). Install it using 'npm install katex'.")]
    Missing { searched: String },

    #[error("Error processing '{tex}': katex process ended with signal {signal}")]
    Terminated { tex: String, signal: String },

    #[error("Error processing '{tex}': {output}")]
    Failed {
        tex: String,
        code: i32,
        output: String,
    },

    #[error("invalid option header in math block '{block}': {source}")]
    Header {
        block: String,
        source: serde_json::Error,
    },

    #[error("unknown katex option `{0}`")]
    UnknownOption(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
