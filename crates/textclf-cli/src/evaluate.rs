//! `textclf evaluate`: run the classifier grid and write the results.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use maud::html;

use textclf_eval::config::{ConfigLoader, StepConfig};
use textclf_eval::data_handling::Dataset;
use textclf_eval::evaluation::{
    render_ranking_table, ClassifierEvaluation, EvaluationOptions, EvaluationOutcome, RankedResult,
};
use textclf_eval::features::{FeatureAugmenter, KeywordExtractor};
use textclf_eval::io::{read_dataset_with_config, DatasetReaderConfig};
use textclf_eval::report::{save_result, slugify, ConfusionGrid, Report, ReportSection};
use textclf_eval::success;

use crate::util::validate_csv_file;

/// Options shared by `evaluate` and `model evaluate`.
#[derive(Debug, Clone)]
pub struct EvaluateArgs {
    pub config: PathBuf,
    pub step: String,
    pub data: PathBuf,
    pub text_column: String,
    pub label_column: String,
    pub folds: usize,
    pub shuffle: bool,
    pub keywords: Vec<String>,
    pub labels: Option<Vec<String>>,
    pub quiet: bool,
    pub no_report: bool,
}

impl EvaluateArgs {
    pub fn options(&self, config: &StepConfig) -> EvaluationOptions {
        EvaluationOptions {
            n_splits: self.folds,
            shuffle: self.shuffle,
            random_state: config.random_state(),
            verbose: !self.quiet,
            tick_labels: self.labels.clone(),
            ..EvaluationOptions::default()
        }
    }

    pub fn augmenter(&self) -> Option<Box<dyn FeatureAugmenter>> {
        if self.keywords.is_empty() {
            None
        } else {
            Some(Box::new(KeywordExtractor::new(&self.keywords)))
        }
    }
}

pub fn load_step(args: &EvaluateArgs) -> Result<StepConfig> {
    ConfigLoader::new(&args.config)
        .load(&args.step)
        .with_context(|| format!("Failed to load step '{}' from {}", args.step, args.config.display()))
}

pub fn load_dataset(args: &EvaluateArgs) -> Result<Dataset> {
    validate_csv_file(&args.data)?;
    let reader = DatasetReaderConfig {
        text_column: args.text_column.clone(),
        label_column: args.label_column.clone(),
        ..DatasetReaderConfig::default()
    };
    let data = read_dataset_with_config(&args.data, &reader)
        .with_context(|| format!("Failed to read dataset: {}", args.data.display()))?;
    data.log_input_data_summary();
    Ok(data)
}

/// Run the default classifier grid against the step's vectorizers.
pub fn run_evaluate(args: &EvaluateArgs) -> Result<()> {
    let config = load_step(args)?;
    let data = load_dataset(args)?;

    let evaluation = ClassifierEvaluation::with_defaults(data, &config, args.augmenter(), args.options(&config))?;
    let outcome = evaluation.evaluate().context("Evaluation failed")?;

    let title = format!("{} classifier evaluation", config.name);
    finish(args, &config, &title, outcome)
}

/// Print the ranking and, unless disabled, write the markdown note and the
/// HTML report.
pub fn finish(args: &EvaluateArgs, config: &StepConfig, title: &str, outcome: EvaluationOutcome) -> Result<()> {
    let table = render_ranking_table(&outcome.ranking);
    println!("{}", table);

    if args.no_report {
        return Ok(());
    }

    let description = format!(
        "{}-fold stratified cross-validation on `{}`, ranked by macro F1.\n\n{}",
        args.folds,
        args.data.display(),
        table
    );
    if let Some(grid) = &outcome.figure {
        save_result(title, &description, grid, config.result_dir(), config.static_dir())
            .context("Failed to save result note")?;
    }

    let path = config.result_dir().join(format!("{}_report.html", slugify(title)));
    write_report(title, &args.config, &outcome.ranking, outcome.figure, &path)?;
    success!("Report saved to: {}", path.display());
    Ok(())
}

fn write_report(
    title: &str,
    config_path: &Path,
    ranking: &[RankedResult],
    figure: Option<ConfusionGrid>,
    path: &Path,
) -> Result<()> {
    let mut report = Report::new("textclf", clap::crate_version!(), None, title);

    /* Section 1: Ranking */
    {
        let mut ranking_section = ReportSection::new("Ranking");
        ranking_section.add_content(html! {
            p { "Pairs sorted by mean macro F1 across folds (config: " (config_path.display().to_string()) ")." }
            table {
                tr { th { "Classifier" } th { "Vectorizer" } th { "F1 Mean" } th { "F1 Std" } }
                @for row in ranking {
                    tr {
                        td { (row.classifier) }
                        td { (row.vectorizer) }
                        td { (format!("{:.3}", row.f1_mean)) }
                        td { (format!("{:.3}", row.f1_std)) }
                    }
                }
            }
        });
        report.add_section(ranking_section);
    }

    /* Section 2: Confusion matrices */
    if let Some(grid) = figure {
        let mut confusion_section = ReportSection::new("Confusion Matrices");
        for panel in grid.into_panels() {
            confusion_section.add_plot(panel);
        }
        report.add_section(confusion_section);
    }

    /* Section 3: Scores */
    {
        let scores_json = serde_json::to_string_pretty(ranking)?;
        let mut scores_section = ReportSection::new("Scores");
        scores_section.add_content(html! {
            div class="code-container" {
                pre {
                    code { (scores_json) }
                }
            }
        });
        report.add_section(scores_section);
    }

    report
        .save_to_file(path)
        .with_context(|| format!("Failed to write report: {}", path.display()))
}
