//! Single-page HTML report assembled from sections of maud markup and
//! plotly plots.
use std::fs;
use std::path::Path;

use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

use crate::error::Result;

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

pub struct ReportSection {
    title: String,
    content: Vec<Markup>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        ReportSection {
            title: title.to_string(),
            content: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.content.push(content);
    }

    pub fn add_plot(&mut self, plot: Plot) {
        let id = format!("plot-{}-{}", slug_id(&self.title), self.content.len());
        self.content.push(PreEscaped(plot.to_inline_html(Some(&id))));
    }

    fn render(&self) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for block in &self.content {
                    div class="block" { (block) }
                }
            }
        }
    }
}

pub struct Report {
    software_name: String,
    version: String,
    logo_url: Option<String>,
    title: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(software_name: &str, version: &str, logo_url: Option<&str>, title: &str) -> Self {
        Report {
            software_name: software_name.to_string(),
            version: version.to_string(),
            logo_url: logo_url.map(str::to_string),
            title: title.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_JS) {}
                    style {
                        "body { font-family: sans-serif; margin: 2em; }
                         table { border-collapse: collapse; }
                         td, th { border: 1px solid #ccc; padding: 4px 8px; }"
                    }
                }
                body {
                    header {
                        @if let Some(logo) = &self.logo_url {
                            img src=(logo) alt=(self.software_name) height="60";
                        }
                        h1 { (self.title) }
                        p { (self.software_name) " v" (self.version) }
                    }
                    @for section in &self.sections {
                        (section.render())
                    }
                }
            }
        }
    }

    /// Write the rendered page, creating parent directories as needed.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.render().into_string())?;
        Ok(())
    }
}

fn slug_id(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_renders_sections() {
        let mut report = Report::new("textclf", "0.1.0", None, "Evaluation");
        let mut section = ReportSection::new("Ranking");
        section.add_content(html! { p { "F1 <b>" } });
        report.add_section(section);

        let page = report.render().into_string();
        assert!(page.contains("<h2>Ranking</h2>"));
        assert!(page.contains("F1 &lt;b&gt;"));
        assert!(page.contains("textclf v0.1.0"));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.html");
        Report::new("textclf", "0.1.0", None, "Evaluation").save_to_file(&path).unwrap();
        assert!(path.exists());
    }
}
