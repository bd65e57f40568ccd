// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

//! Fake katex executables for tests.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::katex_cli::KatexCommand;

/// Stand-in for katex: wraps the input in a `katex` span, fails like katex
/// on unbalanced braces and logs every render to `calls.log`.
pub const FAKE_KATEX: &str = r#"
input=""
output=""
display=""
while [ "$#" -gt 0 ]; do
  case "$1" in
    --input) shift; input="$1" ;;
    --output) shift; output="$1" ;;
    --display-mode) display=1 ;;
    --version) echo "0.16.9"; exit 0 ;;
    --help)
      echo "Usage: katex [options]"
      echo "Options:"
      echo "  --trust                    Trust the input"
      echo "  -h, --help                 output usage information"
      exit 0
      ;;
  esac
  shift
done
echo "render" >> "$(dirname "$0")/calls.log"
tex=$(cat "$input")
opens=$(printf '%s' "$tex" | tr -cd '{' | wc -c)
closes=$(printf '%s' "$tex" | tr -cd '}' | wc -c)
if [ "$opens" -ne "$closes" ]; then
  printf "ParseError: KaTeX parse error: Expected '}', got 'EOF' at end of input: %s\n" "$tex" >&2
  exit 1
fi
if [ -n "$display" ]; then cls="katex-display"; else cls="katex"; fi
case "$tex" in
  *utilde*) svg='<svg width="1em"><path d="M0 0"/></svg>' ;;
  *) svg='' ;;
esac
printf '<span class="%s"><span class="katex-html">%s%s</span></span>\n' "$cls" "$tex" "$svg" > "$output"
"#;

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body)).expect("write script");
    path
}

/// Run `body` through `/bin/sh`, which sidesteps exec races on freshly written files.
pub fn sh_command(dir: &Path, name: &str, body: &str) -> KatexCommand {
    let script = write_script(dir, name, body);
    KatexCommand::new(vec!["/bin/sh".to_string(), script.display().to_string()])
}

pub fn fake_katex(dir: &Path) -> KatexCommand {
    sh_command(dir, "fake-katex", FAKE_KATEX)
}

/// Number of renders performed by [`fake_katex`] in `dir`.
pub fn render_calls(dir: &Path) -> usize {
    fs::read_to_string(dir.join("calls.log"))
        .map(|s| s.lines().count())
        .unwrap_or(0)
}
