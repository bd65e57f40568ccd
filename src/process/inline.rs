// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

/// An inline formula `` $`...`$ `` or ``` $``...``$ ``` within a line.
///
/// Offsets are byte offsets into the original line; `start..end` covers the
/// surrounding `$` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineSpan {
    pub start: usize,
    pub end: usize,
    pub delim_len: usize,
}

impl InlineSpan {
    #[cfg(test)]
    /// The whole span, delimiters included.
    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        &line[self.start..self.end]
    }

    /// The formula between the backtick runs.
    pub fn formula<'a>(&self, line: &'a str) -> &'a str {
        &line[self.start + 1 + self.delim_len..self.end - 1 - self.delim_len]
    }
}

/// Find the inline formulas of a line, left to right.
///
/// A run of one or two backticks is matched with the next identical run; the
/// pair counts as math only when a `$` directly precedes the opening run and
/// directly follows the closing one. A missing neighbour at either end of the
/// line means "no math". Double-backtick quoting such as ``` ``$`a+b`$`` ```
/// therefore stays literal: the outer runs pair up first and fail the check.
pub fn scan_inline(line: &str) -> Vec<InlineSpan> {
    let bytes = line.as_bytes();
    let mut spans = Vec::new();
    let mut pos = 0;

    while let Some(offset) = bytes[pos..].iter().position(|&b| b == b'`') {
        let start = pos + offset;
        let delim_len = match bytes.get(start + 1) {
            Some(b'`') => 2,
            _ => 1,
        };
        let delim = &line[start..start + delim_len];
        pos = start + delim_len;

        let Some(close) = line[pos..].find(delim).map(|i| pos + i) else {
            continue;
        };
        // last byte of the closing run
        let end = close + delim_len - 1;
        pos = end;

        let before = start.checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(end + 1).copied();
        if before != Some(b'$') || after != Some(b'$') {
            continue;
        }

        spans.push(InlineSpan {
            start: start - 1,
            end: end + 2,
            delim_len,
        });
        pos = end + delim_len;
    }

    spans
}

/// Rewrite `line` with every span swapped for its replacement.
///
/// Spans must be sorted and non-overlapping, as returned by [`scan_inline`].
pub fn replace_spans(line: &str, spans: &[InlineSpan], replacements: &[String]) -> String {
    let mut result = String::with_capacity(line.len());
    let mut cursor = 0;
    for (span, replacement) in spans.iter().zip(replacements) {
        result.push_str(&line[cursor..span.start]);
        result.push_str(replacement);
        cursor = span.end;
    }
    result.push_str(&line[cursor..]);
    result
}
