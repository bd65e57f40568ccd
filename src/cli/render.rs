// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic)

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{eyre, WrapErr};
use walkdir::WalkDir;

use crate::{
    config,
    markdown::{self, MathExtension},
    process::MarkerRegistry,
};

#[derive(clap::Args)]
pub struct RenderCommand {
    /// Markdown file, or a directory searched for `.md` files.
    input: Utf8PathBuf,

    /// Output file, or output directory when rendering a directory.
    /// Defaults to the input path with an `.html` extension.
    #[arg(short, long)]
    output: Option<Utf8PathBuf>,

    /// Path to the configuration file (e.g., "mdkatex.toml").
    #[arg(short, long, default_value_t = config::DEFAULT_CONFIG_PATH.into())]
    config: String,
}

pub fn render(command: &RenderCommand) -> eyre::Result<()> {
    let config = config::load_config(Utf8Path::new(&command.config))?;
    let ext = config.katex.extension()?;

    let mut registry = MarkerRegistry::new();
    for (input, output) in render_jobs(&command.input, command.output.as_deref())? {
        render_file(&ext, &mut registry, &input, &output)?;
    }
    Ok(())
}

/// Pairs of markdown source and HTML target paths.
fn render_jobs(
    input: &Utf8Path,
    output: Option<&Utf8Path>,
) -> eyre::Result<Vec<(Utf8PathBuf, Utf8PathBuf)>> {
    if input.is_file() {
        let target = match output {
            Some(output) => output.to_owned(),
            None => input.with_extension("html"),
        };
        return Ok(vec![(input.to_owned(), target)]);
    }
    if !input.is_dir() {
        return Err(eyre!("Does not exist: {}", input));
    }

    let mut jobs = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry?;
        let Some(path) = Utf8Path::from_path(entry.path()) else {
            continue;
        };
        if !entry.file_type().is_file() || path.extension() != Some("md") {
            continue;
        }
        let target = match output {
            Some(dir) => dir.join(path.strip_prefix(input)?).with_extension("html"),
            None => path.with_extension("html"),
        };
        jobs.push((path.to_owned(), target));
    }
    Ok(jobs)
}

fn render_file(
    ext: &MathExtension,
    registry: &mut MarkerRegistry,
    input: &Utf8Path,
    output: &Utf8Path,
) -> eyre::Result<()> {
    let source = std::fs::read_to_string(input)
        .wrap_err_with(|| eyre!("failed to read `{}`", input))?;
    let html = markdown::markdown_to_html(&source, ext, registry)
        .wrap_err_with(|| eyre!("failed to render `{}`", input))?;

    if let Some(parent) = output.parent().filter(|p| !p.as_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| eyre!("failed to create directory `{}`", parent))?;
    }
    std::fs::write(output, html).wrap_err_with(|| eyre!("failed to write `{}`", output))?;

    println!("Compiled to HTML: {}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_single_file_jobs() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        let input = root.join("notes.md");
        std::fs::write(&input, "# notes").unwrap();

        let jobs = render_jobs(&input, None).unwrap();
        assert_eq!(jobs, vec![(input.clone(), root.join("notes.html"))]);

        let jobs = render_jobs(&input, Some(&root.join("out.html"))).unwrap();
        assert_eq!(jobs[0].1, root.join("out.html"));
    }

    #[test]
    fn test_directory_jobs() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        std::fs::create_dir_all(root.join("src/sub")).unwrap();
        std::fs::write(root.join("src/b.md"), "b").unwrap();
        std::fs::write(root.join("src/sub/a.md"), "a").unwrap();
        std::fs::write(root.join("src/skip.txt"), "x").unwrap();

        let jobs = render_jobs(&root.join("src"), Some(&root.join("out"))).unwrap();
        let targets: Vec<_> = jobs.iter().map(|(_, t)| t.clone()).collect();
        assert_eq!(targets, vec![root.join("out/b.html"), root.join("out/sub/a.html")]);
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        assert!(render_jobs(&utf8(&dir).join("nope.md"), None).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_render_file() {
        use crate::{
            cache::RenderCache, options::OptionMap, renderer::Renderer,
            test_support::fake_katex,
        };

        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        let cache = RenderCache::new(root.join("cache")).unwrap();
        let renderer = Renderer::new(fake_katex(dir.path()), cache);
        let ext = MathExtension::new(renderer, OptionMap::new()).unwrap();

        let input = root.join("doc.md");
        std::fs::write(&input, "Euler: $`e^{i\\pi}+1=0`$\n").unwrap();
        let output = root.join("site/doc.html");
        render_file(&ext, &mut MarkerRegistry::new(), &input, &output).unwrap();

        let html = std::fs::read_to_string(output).unwrap();
        assert!(html.contains(r#"<p>Euler: <span class="katex">"#));
        assert!(html.contains("katex.min.css"));
    }
}
