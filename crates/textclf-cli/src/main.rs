use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use std::path::PathBuf;

use textclf_cli::evaluate::{run_evaluate, EvaluateArgs};
use textclf_cli::model::{evaluate_model, save_model, show_model};
use textclf_cli::util::{parse_assignments, split_list};
use textclf_eval::logging::init_logger;

fn config_arg() -> Arg {
    Arg::new("config")
        .help("Path to the JSON configuration file")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn step_arg() -> Arg {
    Arg::new("step")
        .short('s')
        .long("step")
        .help("Name of the pipeline step in the configuration file")
        .default_value("Step1")
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
}

fn name_arg() -> Arg {
    Arg::new("name")
        .help("Name of the model preset")
        .required(true)
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
}

/// Arguments shared by `evaluate` and `model evaluate`.
fn evaluation_args(command: Command) -> Command {
    command
        .arg(step_arg())
        .arg(
            Arg::new("data")
                .short('d')
                .long("data")
                .help("CSV file with a text column, a label column and optional numeric columns")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("text_column")
                .long("text-column")
                .help("Name of the free-text column")
                .default_value("text")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("label_column")
                .long("label-column")
                .help("Name of the label column")
                .default_value("label")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("folds")
                .short('k')
                .long("folds")
                .help("Number of stratified cross-validation folds")
                .default_value("5")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("shuffle")
                .long("shuffle")
                .help("Shuffle fold assignment using the configured random_state")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("keywords")
                .long("keywords")
                .help("Comma separated lexicon; adds keyword_count and keyword_ratio features")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("labels")
                .long("labels")
                .help("Comma separated confusion-matrix axis labels, in class order")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("No per-pair status lines and no confusion-matrix figure")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no_report")
                .long("no-report")
                .help("Only print the ranking; write no report files")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> Result<()> {
    init_logger("TEXTCLF_LOG", "error,textclf=info,success=info");

    let matches = Command::new("textclf")
        .version(clap::crate_version!())
        .about("\u{1F4CA} textclf - Cross-validated comparison of text classifiers")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(evaluation_args(
            Command::new("evaluate")
                .about("Evaluate the default classifier grid against TF-IDF and bag-of-words")
                .arg(config_arg()),
        ))
        .subcommand(
            Command::new("model")
                .about("Read, write or evaluate named model presets")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("show")
                        .about("Print a saved preset as JSON")
                        .arg(config_arg())
                        .arg(name_arg())
                        .arg(step_arg()),
                )
                .subcommand(
                    Command::new("save")
                        .about("Insert or overwrite a preset from key=value fields")
                        .arg(config_arg())
                        .arg(name_arg())
                        .arg(step_arg())
                        .arg(
                            Arg::new("set")
                                .long("set")
                                .help(
                                    "Field as key=value. Values are read as JSON when possible. \
                                     ngram_range, min_df, max_features and vectorizer_type go \
                                     to the preset's vectorizer.",
                                )
                                .action(ArgAction::Append)
                                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                        ),
                )
                .subcommand(evaluation_args(
                    Command::new("evaluate")
                        .about("Evaluate a single saved preset")
                        .arg(config_arg())
                        .arg(name_arg()),
                )),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("evaluate", sub_m)) => handle_evaluate(sub_m),
        Some(("model", sub_m)) => handle_model(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn evaluate_args_from(matches: &ArgMatches) -> EvaluateArgs {
    EvaluateArgs {
        config: matches.get_one::<PathBuf>("config").cloned().unwrap_or_default(),
        step: matches.get_one::<String>("step").cloned().unwrap_or_default(),
        data: matches.get_one::<PathBuf>("data").cloned().unwrap_or_default(),
        text_column: matches.get_one::<String>("text_column").cloned().unwrap_or_default(),
        label_column: matches.get_one::<String>("label_column").cloned().unwrap_or_default(),
        folds: matches.get_one::<usize>("folds").copied().unwrap_or(5),
        shuffle: matches.get_flag("shuffle"),
        keywords: matches
            .get_one::<String>("keywords")
            .map(|k| split_list(k))
            .unwrap_or_default(),
        labels: matches.get_one::<String>("labels").map(|l| split_list(l)),
        quiet: matches.get_flag("quiet"),
        no_report: matches.get_flag("no_report"),
    }
}

fn handle_evaluate(matches: &ArgMatches) -> Result<()> {
    let args = evaluate_args_from(matches);
    log::info!("[textclf::evaluate] Evaluating {:?} with config {:?}", args.data, args.config);

    match run_evaluate(&args) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Evaluation failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_model(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", show_matches)) => {
            let config: &PathBuf = show_matches.get_one("config").unwrap();
            let step: &String = show_matches.get_one("step").unwrap();
            let name: &String = show_matches.get_one("name").unwrap();

            match show_model(config, step, name) {
                Ok(Some(preset)) => {
                    println!("{}", serde_json::to_string_pretty(&preset)?);
                    Ok(())
                }
                // get_model has already warned
                Ok(None) => Ok(()),
                Err(e) => {
                    log::error!("{:#}", e);
                    std::process::exit(1)
                }
            }
        }
        Some(("save", save_matches)) => {
            let config: &PathBuf = save_matches.get_one("config").unwrap();
            let step: &String = save_matches.get_one("step").unwrap();
            let name: &String = save_matches.get_one("name").unwrap();
            let assignments: Vec<&String> = save_matches.get_many("set").map(|v| v.collect()).unwrap_or_default();

            let saved = parse_assignments(assignments).and_then(|fields| save_model(config, step, name, fields));
            match saved {
                Ok(preset) => {
                    println!("{}", serde_json::to_string_pretty(&preset.to_value())?);
                    Ok(())
                }
                Err(e) => {
                    log::error!("Saving model failed: {:#}", e);
                    std::process::exit(1)
                }
            }
        }
        Some(("evaluate", eval_matches)) => {
            let name: &String = eval_matches.get_one("name").unwrap();
            let args = evaluate_args_from(eval_matches);
            log::info!("[textclf::model] Evaluating preset '{}' from {:?}", name, args.config);

            match evaluate_model(&args, name) {
                Ok(_) => Ok(()),
                Err(e) => {
                    log::error!("Evaluation failed: {:#}", e);
                    std::process::exit(1)
                }
            }
        }
        _ => unreachable!(),
    }
}
