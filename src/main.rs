use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vocab_reader_lib::backend::{ExportFormat, HttpBackend};
use vocab_reader_lib::cefr::LevelFilter;
use vocab_reader_lib::config::ClientConfig;
use vocab_reader_lib::detail::WordDetail;
use vocab_reader_lib::job::SessionId;
use vocab_reader_lib::preferences::PreferenceStore;
use vocab_reader_lib::scoring::DifficultyScore;
use vocab_reader_lib::surface::{ReadingContent, Surface};
use vocab_reader_lib::views::{ListMarkup, StatsSummary};
use vocab_reader_lib::SessionContext;

/// Follow an analysis job and write its annotated reading view.
#[derive(Debug, Parser)]
#[command(name = "vocab-reader", version)]
struct Args {
    /// Session id returned by the upload endpoint
    session_id: String,

    /// JSON client config; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the server address from the config
    #[arg(long, env = "VOCAB_READER_URL")]
    base_url: Option<String>,

    /// Level filter: all, A1, A2, B1, B2, C1, C2, C2+
    #[arg(long, default_value = "all")]
    level: LevelFilter,

    /// Highlight words containing this text
    #[arg(long)]
    search: Option<String>,

    /// Where to write the reading view markup
    #[arg(long, default_value = "reading.html")]
    out: PathBuf,
}

/// Prints progress and results to the terminal and keeps the last markup.
#[derive(Default)]
struct TerminalSurface {
    reading: Option<String>,
}

impl Surface for TerminalSurface {
    fn show_progress(&mut self, progress: u8, stage: &str) {
        eprintln!("[{:>3}%] {}", progress, stage);
    }

    fn show_failure(&mut self, message: &str) {
        eprintln!("error: {}", message);
    }

    fn show_results(&mut self, summary: &StatsSummary, score: &DifficultyScore) {
        println!(
            "{} words ({} unique), {} phrasal verbs",
            summary.total_words, summary.unique_words, summary.phrases
        );
        for row in &summary.distribution {
            println!("  {:<4}{:>6} ({:.1}%)", row.level.as_str(), row.count, row.percentage);
        }
        println!(
            "Difficulty {:.1}/100: {} ({}), for {}",
            score.value,
            score.band.label(),
            score.band.level_range(),
            score.band.audience()
        );
    }

    fn show_lists(&mut self, lists: &ListMarkup) {
        println!("{} words, {} phrases match the filter", lists.word_count, lists.phrase_count);
    }

    fn show_reading(&mut self, content: ReadingContent<'_>) {
        match content {
            ReadingContent::Skeleton => eprintln!("Rendering reading view..."),
            ReadingContent::Markup(markup) => self.reading = Some(markup.to_string()),
        }
    }

    fn show_detail(&mut self, detail: &WordDetail) {
        println!("{} [{}]", detail.title, detail.level);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = args.base_url {
        config.base_url = url;
    }

    let backend = HttpBackend::new(&config.base_url, config.connect_timeout());
    let mut session = SessionContext::new(config, backend, TerminalSurface::default(), PreferenceStore::default());

    session.run_job(SessionId(args.session_id)).await?;
    session.select_level(args.level).await?;
    if let Some(term) = args.search {
        session.search_input(&term);
        session.settle_search().await?;
    }

    for format in ExportFormat::ALL {
        println!("{:<9}{}", format.as_str(), session.export_url(format)?);
    }

    if let Some(markup) = session.surface_mut().reading.take() {
        std::fs::write(&args.out, markup)?;
        eprintln!("Reading view written to {}", args.out.display());
    }
    Ok(())
}
