use maud::{html, PreEscaped, DOCTYPE};
use plotly::common::{ColorScale, ColorScalePalette};
use plotly::layout::{Annotation, Axis, Layout};
use plotly::{HeatMap, Plot};

use crate::error::{EvalError, Result};
use crate::metrics::ConfusionMatrix;

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

/// Plot a confusion matrix as an annotated heatmap.
///
/// Rows are true labels (first class on top), columns predicted labels.
/// `labels` names the classes in matrix order.
pub fn plot_confusion_matrix(cm: &ConfusionMatrix, labels: &[String], title: &str) -> Result<Plot> {
    if labels.len() != cm.n_classes() {
        return Err(EvalError::InvalidInput(format!(
            "{} tick labels given for {} classes",
            labels.len(),
            cm.n_classes()
        )));
    }

    // plotly draws the first y category at the bottom
    let y_labels: Vec<String> = labels.iter().rev().cloned().collect();
    let z: Vec<Vec<usize>> = cm.rows().iter().rev().cloned().collect();

    let mut annotations = Vec::new();
    for (true_label, row) in labels.iter().zip(cm.rows()) {
        for (predicted_label, count) in labels.iter().zip(row) {
            annotations.push(
                Annotation::new()
                    .x(predicted_label.clone())
                    .y(true_label.clone())
                    .text(&count.to_string())
                    .show_arrow(false),
            );
        }
    }

    let trace = HeatMap::new(labels.to_vec(), y_labels, z)
        .color_scale(ColorScale::Palette(ColorScalePalette::Blues));

    let layout = Layout::new()
        .title(title)
        .x_axis(Axis::new().title("Predicted Label"))
        .y_axis(Axis::new().title("True Label"))
        .annotations(annotations);

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    Ok(plot)
}

/// Confusion-matrix panels laid out in a fixed number of columns.
///
/// Only occupied cells are emitted, so a grid of 7 panels over 3 columns
/// has 3 rows and two empty slots are simply not drawn.
pub struct ConfusionGrid {
    columns: usize,
    panels: Vec<Plot>,
}

impl ConfusionGrid {
    pub fn new(columns: usize) -> Self {
        ConfusionGrid {
            columns: columns.max(1),
            panels: Vec::new(),
        }
    }

    pub fn push(&mut self, panel: Plot) {
        self.panels.push(panel);
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// `ceil(panels / columns)`.
    pub fn rows(&self) -> usize {
        self.panels.len().div_ceil(self.columns)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn panels(&self) -> &[Plot] {
        &self.panels
    }

    pub fn into_panels(self) -> Vec<Plot> {
        self.panels
    }

    /// Standalone HTML page with every panel in a CSS grid.
    pub fn to_html(&self) -> String {
        let columns = self.columns.min(self.panels.len()).max(1);
        let markup = html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    script src=(PLOTLY_JS) {}
                    style {
                        (format!(
                            ".confusion-grid {{ display: grid; grid-template-columns: repeat({}, 1fr); gap: 12px; }}",
                            columns
                        ))
                    }
                }
                body {
                    div class="confusion-grid" {
                        @for (i, panel) in self.panels.iter().enumerate() {
                            div class="panel" {
                                (PreEscaped(panel.to_inline_html(Some(&format!("confusion-{}", i)))))
                            }
                        }
                    }
                }
            }
        };
        markup.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_count_must_match() {
        let cm = ConfusionMatrix::new(&[0, 1], &[0, 1], 2).unwrap();
        assert!(plot_confusion_matrix(&cm, &["a".to_string()], "t").is_err());
    }

    #[test]
    fn test_grid_rows() {
        let cm = ConfusionMatrix::new(&[0, 1, 1], &[0, 1, 0], 2).unwrap();
        let labels = vec!["neg".to_string(), "pos".to_string()];
        let mut grid = ConfusionGrid::new(3);
        for i in 0..7 {
            grid.push(plot_confusion_matrix(&cm, &labels, &format!("pair {}", i)).unwrap());
        }
        assert_eq!(grid.rows(), 3);
        let html = grid.to_html();
        assert!(html.contains("confusion-6"));
        assert!(!html.contains("confusion-7"));
        assert!(html.contains("repeat(3, 1fr)"));
    }
}
