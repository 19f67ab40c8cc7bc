// Review sentiment: lexicon-labeled corpus → Bernoulli Naive Bayes → evaluation + interactive prompt.
mod bayes;
mod config;
mod dataset;
mod driver;
mod error;
mod nlp;

use std::io::{IsTerminal, Write};

use anyhow::Result;
use clap::{Parser, Subcommand};
use termcolor::{ColorChoice, StandardStream};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Settings;
use driver::{print_report, train_pipeline, write_label, InteractiveSession};

#[derive(Parser)]
#[command(name = "review-sentiment", version, about = "Lexicon-labeled Naive Bayes sentiment classifier for product reviews")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    /// Log debug details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train, evaluate, then classify reviews typed at the prompt (default)
    Run,
    /// Train and evaluate only
    Evaluate {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Train, then classify the given texts
    Classify {
        #[arg(short, long, required = true)]
        text: Vec<String>,
    },
    /// Show lexicon hits and the resulting label without training
    Label {
        #[arg(short, long, required = true)]
        text: Vec<String>,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn stdout() -> StandardStream {
    let choice = if std::io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

fn run(settings: &Settings) -> Result<()> {
    let pipeline = train_pipeline(settings)?;
    let report = pipeline.report(settings.top_k);
    let mut out = stdout();
    print_report(&mut out, &report)?;

    let session = InteractiveSession::new(&pipeline.model, &pipeline.normalizer, settings.exit_words());
    let classified = session.run(std::io::stdin().lock(), &mut out)?;
    tracing::debug!(classified, "interactive session closed");
    writeln!(out, "\nDone!")?;
    Ok(())
}

fn evaluate(settings: &Settings, json: bool) -> Result<()> {
    let pipeline = train_pipeline(settings)?;
    let report = pipeline.report(settings.top_k);
    if json {
        let mut out = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        print_report(&mut stdout(), &report)?;
    }
    Ok(())
}

fn classify(settings: &Settings, texts: &[String]) -> Result<()> {
    let pipeline = train_pipeline(settings)?;
    let mut out = stdout();
    for text in texts {
        let features = pipeline.normalizer.normalize(&text.to_lowercase());
        let label = pipeline.model.classify(&features);
        let confidence = pipeline
            .model
            .prob_classify(&features)
            .get(&label)
            .copied()
            .unwrap_or(0.0);
        write_label(&mut out, label)?;
        writeln!(out, "\t{:.3}\t{}", confidence, text)?;
    }
    Ok(())
}

fn label(settings: &Settings, texts: &[String]) -> Result<()> {
    let lexicon = settings.load_lexicon()?;
    let mut out = stdout();
    for text in texts {
        let score = lexicon.score(text);
        write_label(&mut out, score.label())?;
        writeln!(
            out,
            "\t+{} -{}{}\t{}",
            score.positive,
            score.negative,
            if score.neutral_cue { " (neutral cue)" } else { "" },
            text
        )?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&cli.settings)?,
        Commands::Evaluate { json } => evaluate(&cli.settings, json)?,
        Commands::Classify { text } => classify(&cli.settings, &text)?,
        Commands::Label { text } => label(&cli.settings, &text)?,
    }
    Ok(())
}
