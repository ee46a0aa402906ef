use chrono::Utc;
use clap::{Parser, Subcommand};
use docscan_core::{
    CancelAck, ExtractorRegistry, FormatKind, FormatSet, ProgressState, SearchOptions,
    SearchOrchestrator, SearchOutcome, SearchReport, SearchRequest,
};
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "docscan", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search a folder tree for documents whose name or text contains a keyword.
    Search {
        /// Folder to scan recursively.
        #[arg(long, env = "DOCSCAN_DIR")]
        dir: PathBuf,

        /// Keyword to look for, compared case-insensitively.
        #[arg(long, env = "DOCSCAN_KEYWORD")]
        keyword: String,

        /// Formats to include (pdf, word, excel, powerpoint). Defaults to all.
        #[arg(long, value_delimiter = ',')]
        formats: Vec<FormatKind>,

        /// Append modification time and full path to each result.
        #[arg(long, default_value_t = false)]
        show_info: bool,

        /// Print the report as JSON instead of result lines.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Follow symbolic links while walking the folder.
        #[arg(long, default_value_t = false)]
        follow_symlinks: bool,

        /// Maximum directory depth to descend into.
        #[arg(long)]
        max_depth: Option<usize>,

        /// Also accept extensions in other cases, such as `.PDF`.
        #[arg(long, default_value_t = false)]
        case_insensitive_extensions: bool,

        /// Do not draw the progress indicator on stderr.
        #[arg(long, default_value_t = false)]
        no_progress: bool,
    },
    /// List the supported document formats.
    Formats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "docscan boot"
    );

    match cli.command {
        Command::Formats => {
            for kind in FormatKind::ALL {
                println!("{:<12} .{}", kind.label(), kind.extension());
            }
        }
        Command::Search {
            dir,
            keyword,
            formats,
            show_info,
            json,
            follow_symlinks,
            max_depth,
            case_insensitive_extensions,
            no_progress,
        } => {
            let formats = if formats.is_empty() {
                FormatSet::all()
            } else {
                formats.into_iter().collect()
            };
            let options = SearchOptions {
                follow_symlinks,
                max_depth,
                case_insensitive_extensions,
            };
            let request = SearchRequest::new(dir, keyword)
                .with_formats(formats)
                .with_metadata(show_info);

            let orchestrator = SearchOrchestrator::new(ExtractorRegistry::default(), options);
            let report = run_search(&orchestrator, request, !no_progress).await?;

            for diagnostic in &report.diagnostics {
                warn!(path = %diagnostic.path.display(), reason = %diagnostic.reason, "skipped file");
            }
            if report.outcome == SearchOutcome::Cancelled {
                info!(
                    processed = report.processed,
                    total = report.total,
                    "search cancelled, showing partial results"
                );
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.render());
            }
        }
    }

    Ok(())
}

/// Runs the search on a worker, drawing progress and turning Ctrl-C into a cancel request.
async fn run_search(
    orchestrator: &SearchOrchestrator,
    request: SearchRequest,
    show_progress: bool,
) -> anyhow::Result<SearchReport> {
    let (progress_tx, progress_rx) = watch::channel(ProgressState::default());
    let renderer = show_progress.then(|| tokio::spawn(render_progress(progress_rx)));

    let handle = orchestrator.start(request, progress_tx)?;
    info!(run_id = %handle.run_id(), "search dispatched");

    let mut wait = std::pin::pin!(handle.wait());
    let report = tokio::select! {
        report = &mut wait => report?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            match orchestrator.cancel() {
                CancelAck::Requested => warn!("cancelling after the current file"),
                CancelAck::NotRunning => info!("no search in progress"),
            }
            wait.await?
        }
    };

    if let Some(renderer) = renderer {
        renderer.await?;
    }

    Ok(report)
}

async fn render_progress(mut progress: watch::Receiver<ProgressState>) {
    let mut stderr = std::io::stderr();
    while progress.changed().await.is_ok() {
        let state = *progress.borrow_and_update();
        let _ = write!(
            stderr,
            "\rprogress {:>5.1}% ({}/{})",
            state.percent(),
            state.processed,
            state.total
        );
        let _ = stderr.flush();
    }
    let _ = writeln!(stderr);
}
