// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

const STYLESHEET_LINK: &str = r#"
<link rel="stylesheet"
  href="https://cdn.jsdelivr.net/npm/katex@0.13.11/dist/katex.min.css"
  integrity="sha384-Um5gpz1odJg5Z4HAmzPtgZKdTBHZdw8S29IecapCSB31ligYPhHQZMIlWLYQGVoc"
  crossorigin="anonymous" />
"#;

const KATEX_IMAGE_STYLES: &str = r#"
<style type="text/css">
    .katex img {
      object-fit: fill;
      padding: unset;
      display: block;
      position: absolute;
      width: 100%;
      height: inherit;
    }
</style>
"#;

const SELFTEST_TEMPLATE: &str = r#"
<!DOCTYPE html>
<html>
<head>
  <title>Test Katex</title>
  {{stylesheet_link}}
  <style type="text/css">
    body{background: white; }
  </style>
</head>
<body>
Generated with mdkatex
<hr/>
{{content}}
</body>
</html>
"#;

/// Stylesheet block prepended once to every document containing math.
pub fn html_katex_styles() -> String {
    format!("{}{}", STYLESHEET_LINK, KATEX_IMAGE_STYLES)
}

pub fn html_paragraph(inner: &str) -> String {
    format!("<p>{}</p>", inner)
}

pub fn html_data_img(mime: &str, b64: &str) -> String {
    format!(r#"<img src="data:{};base64,{}"/>"#, mime, b64)
}

/// Standalone page showing each rendered formula, separated by rules.
pub fn html_selftest_page(formula_htmls: &[String]) -> String {
    SELFTEST_TEMPLATE
        .replace("{{stylesheet_link}}", STYLESHEET_LINK)
        .replace("{{content}}", &formula_htmls.join("\n<hr/>\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selftest_page() {
        let page = html_selftest_page(&["<b>1</b>".to_string(), "<b>2</b>".to_string()]);
        assert!(page.contains("<b>1</b>\n<hr/>\n<b>2</b>"));
        assert!(page.contains("katex.min.css"));
        assert!(!page.contains("{{"));
    }
}
