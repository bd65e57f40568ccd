// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{eyre, WrapErr};

use crate::{
    config,
    error::RenderError,
    html_flake,
    options::OptionMap,
    renderer::{Renderer, Variant},
};

/// Formulas exercising fonts, stretchy delimiters and svg output.
pub const TEST_FORMULAS: &str = r#"
f(x) = \int_{-\infty}^\infty
\hat f(\xi)\,e^{2 \pi i \xi x}
\,d\xi

---

\displaystyle

\frac{1}{
  \Bigl(\sqrt{\phi \sqrt{5}}-\phi\Bigr) e^{\frac25 \pi}
} =
 1+\frac{e^{-2\pi}} {
   1+\frac{e^{-4\pi}} {
     1+\frac{e^{-6\pi}} {
       1+\frac{e^{-8\pi}}{
         1+\cdots
       }
     }
   }
}

---

\displaystyle

\left
  ( \sum_{k=1}^n a_k b_k
\right)^2

\leq

\left(
  \sum_{k=1}^n a_k^2
\right)
\left(
  \sum_{k=1}^n b_k^2
\right)

---

\overbrace{x + \cdots + x}^{n\rm\ times}
-
\underbrace{x + \cdots + x}_{n\rm\ times}

---

\oiiint \oiint \oint  \frac ab + {\scriptscriptstyle \frac cd + \frac ef} + \frac gh

---

\Overrightarrow{ABCDE}
-
\overrightharpoon{abcdec}
-
\overgroup{ABCDEF}
-
\undergroup{abcde}
-
\undergroup{efgp}
-
\utilde{AB}
-
\utilde{\utilde{\utilde{AB}}}
-
\widecheck{AB\widecheck{CD}EF}
-
\widehat{AB\widehat{CD}EF}

"#;

#[derive(clap::Args)]
pub struct SelftestCommand {
    /// Path to the generated page.
    #[arg(short, long, default_value = "test.html")]
    output: Utf8PathBuf,

    /// Path to the configuration file (e.g., "mdkatex.toml").
    #[arg(short, long, default_value_t = config::DEFAULT_CONFIG_PATH.into())]
    config: String,
}

pub fn selftest(command: &SelftestCommand) -> eyre::Result<()> {
    let config = config::load_config(Utf8Path::new(&command.config))?;
    let renderer = config.katex.renderer()?;

    println!("Command options:");
    println!("{}", serde_json::to_string_pretty(renderer.schema())?);
    println!();

    let page = selftest_page(&renderer, &config.katex.extension_options())?;
    std::fs::write(&command.output, page)
        .wrap_err_with(|| eyre!("failed to write `{}`", command.output))?;

    println!("Created '{}'", command.output);
    Ok(())
}

pub fn selftest_page(renderer: &Renderer, options: &OptionMap) -> Result<String, RenderError> {
    let formula_htmls = TEST_FORMULAS
        .split("---")
        .map(|tex| renderer.render(tex, Variant::Inline, options))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(html_flake::html_selftest_page(&formula_htmls))
}

#[cfg(all(test, unix))]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        cache::RenderCache,
        test_support::{fake_katex, render_calls},
    };

    #[test]
    fn test_selftest_page() {
        let dir = TempDir::new().unwrap();
        let cache = RenderCache::new(dir.path().join("cache")).unwrap();
        let renderer = Renderer::new(fake_katex(dir.path()), cache);

        let page = selftest_page(&renderer, &OptionMap::new()).unwrap();
        assert_eq!(render_calls(dir.path()), 6);
        assert_eq!(page.matches("\n<hr/>\n").count(), 5);
        assert!(page.contains(r"\oiiint"));
        assert!(page.contains("<svg"));

        selftest_page(&renderer, &OptionMap::new()).unwrap();
        assert_eq!(render_calls(dir.path()), 6);
    }
}
