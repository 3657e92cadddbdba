use clap::{Arg, ArgAction, Command};
use lebab::document::{self, output_path};
use lebab::{
    LebabError, MockMode, MockOracle, OpenAiOracle, Outcome, Pipeline, PipelineConfig,
    RunReport, SlideDeck, TextSource, TranslationOracle, WordDocument,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("lebab")
        .version("0.1.0")
        .about("Translate a document while keeping its structure intact")
        .arg(
            Arg::new("document")
                .help("Document to translate (JSON)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("source-locale")
                .help("Source language (e.g., en, English)")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("target-locale")
                .help("Target language (e.g., es, Spanish)")
                .required(true)
                .index(3),
        )
        .arg(
            Arg::new("kind")
                .long("kind")
                .help("Document model of the input")
                .value_parser(["word", "slides"])
                .default_value("word"),
        )
        .arg(
            Arg::new("max-chunk-size")
                .long("max-chunk-size")
                .help("Chunk budget in characters")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("concurrency")
                .long("concurrency")
                .short('j')
                .help("Chunks translated at the same time")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Output path (default: <stem>_<target>.json next to the input)"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use the mock oracle instead of the OpenAI API")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log every chunk")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let default_level = if matches.get_flag("verbose") { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Required arguments are enforced by clap
    let input = PathBuf::from(matches.get_one::<String>("document").expect("required"));
    let source_locale = matches.get_one::<String>("source-locale").expect("required");
    let target_locale = matches.get_one::<String>("target-locale").expect("required");
    let kind = matches.get_one::<String>("kind").expect("has default");
    let output = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| output_path(&input, target_locale));

    let mut config = PipelineConfig::from_env(source_locale, target_locale)?;
    if let Some(size) = matches.get_one::<usize>("max-chunk-size") {
        config = config.with_max_chunk_size(*size);
    }
    if let Some(concurrency) = matches.get_one::<usize>("concurrency") {
        config = config.with_concurrency(*concurrency);
    }

    let oracle: Arc<dyn TranslationOracle> = if matches.get_flag("mock") {
        Arc::new(MockOracle::new(MockMode::Suffix))
    } else {
        match OpenAiOracle::from_env() {
            Ok(oracle) => Arc::new(oracle),
            Err(e) => {
                eprintln!("❌ {}", e);
                eprintln!("   Set it with: export OPENAI_API_KEY=your_api_key");
                eprintln!("   Or use --mock to use the mock oracle");
                return Err(e.into());
            }
        }
    };

    let pipeline = Pipeline::new(oracle, config)?;

    let cancel = pipeline.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the chunks in flight");
            cancel.cancel();
        }
    });

    info!("Translating {} from {} to {}", input.display(), source_locale, target_locale);

    let report = match kind.as_str() {
        "slides" => run::<SlideDeck>(&pipeline, &input, &output).await?,
        _ => run::<WordDocument>(&pipeline, &input, &output).await?,
    };

    print_report(&report, &output);
    Ok(())
}

async fn run<D>(pipeline: &Pipeline, input: &Path, output: &Path) -> Result<RunReport, LebabError>
where
    D: TextSource + Serialize + DeserializeOwned,
{
    let mut doc: D = document::load_json(input)?;
    let report = pipeline.translate_document(&mut doc).await?;
    document::save_json(&doc, output)?;
    Ok(report)
}

fn print_report(report: &RunReport, output: &Path) {
    if report.outcome == Outcome::NothingToTranslate {
        println!("Nothing to translate; copied document to {}", output.display());
        return;
    }

    println!(
        "Translated {} of {} blocks in {} chunks → {}",
        report.translated,
        report.blocks,
        report.chunks,
        output.display()
    );
    for anomaly in &report.anomalies {
        println!("  ⚠️  {}", anomaly);
    }
    for failure in &report.write_failures {
        println!("  ❌ write failed at {}", failure);
    }
}
