//! Markdown result notes with a saved figure alongside.
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use plotly::Plot;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::report::plots::ConfusionGrid;

/// Anything that can be written out as a standalone HTML page.
pub trait Figure {
    fn to_html(&self) -> String;
}

impl Figure for Plot {
    fn to_html(&self) -> String {
        Plot::to_html(self)
    }
}

impl Figure for ConfusionGrid {
    fn to_html(&self) -> String {
        ConfusionGrid::to_html(self)
    }
}

fn separator_regex() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]+").expect("valid separator regex"))
}

/// ASCII-fold `text`, collapse every run of non-alphanumerics into `_`, trim
/// leading and trailing `_` and lowercase.
pub fn slugify(text: &str) -> String {
    let folded: String = text.nfkd().filter(char::is_ascii).collect();
    separator_regex()
        .replace_all(&folded, "_")
        .trim_matches('_')
        .to_lowercase()
}

/// Path of `target` as seen from the directory `base`, with `/` separators.
///
/// Both paths must be absolute (or both relative to the same directory).
pub fn relative_link(target: &Path, base: &Path) -> String {
    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = base.components().collect();
    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); base.len() - common];
    parts.extend(
        target[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

/// Paths written by [`save_result`].
#[derive(Debug, Clone, PartialEq)]
pub struct SavedResult {
    pub markdown: PathBuf,
    pub figure: PathBuf,
}

/// Write `<output_dir>/<slug>.md` and `<static_dir>/images/<slug>_plot.html`.
///
/// The markdown holds the title, a timestamp, the description and the figure
/// embedded as an image whose link is relative to `output_dir`. Existing
/// files with the same slug are overwritten.
pub fn save_result(
    title: &str,
    description: &str,
    figure: &dyn Figure,
    output_dir: &Path,
    static_dir: &Path,
) -> Result<SavedResult> {
    let slug = slugify(title);
    let images_dir = static_dir.join("images");
    fs::create_dir_all(&images_dir)?;
    fs::create_dir_all(output_dir)?;

    let figure_path = images_dir.join(format!("{}_plot.html", slug));
    fs::write(&figure_path, figure.to_html())?;

    let link = relative_link(&figure_path.canonicalize()?, &output_dir.canonicalize()?);

    let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    let markdown_path = output_dir.join(format!("{}.md", slug));
    let body = format!(
        "# {title}\n**Date**: {timestamp}\n\n## Description\n{description}\n\n## Visualisation\n![{title}]({link})\n"
    );
    fs::write(&markdown_path, body)?;

    crate::success!("Results saved to: {}", markdown_path.display());
    Ok(SavedResult {
        markdown: markdown_path,
        figure: figure_path,
    })
}
