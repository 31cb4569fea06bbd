use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;

use scraper_engine::{JobId, JobSummary, PipelineSettings, ProgressEvent, ScrapeService};

/// Command line front end for the scraping pipeline: discovers the links
/// on a seed page, converts each one to markdown, and drops the results
/// into a zip bundle.
#[derive(Debug, Parser)]
#[command(name = "scraper")]
#[command(about = "Scrape a page's links into a markdown bundle", long_about = None)]
struct Cli {
    /// Seed page URL (http or https).
    seed: String,

    /// Directory the zip bundle is written to.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Upstream conversions allowed per rate window.
    #[arg(long)]
    rate_limit: Option<u32>,

    /// Links fetched concurrently per batch.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Base URL of the content conversion service.
    #[arg(long)]
    reader_url: Option<String>,

    /// Also write a debug-level log to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase terminal log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn settings(&self) -> PipelineSettings {
        let mut settings = PipelineSettings::default();
        if let Some(rate_limit) = self.rate_limit {
            settings.rate_limit = rate_limit;
        }
        if let Some(batch_size) = self.batch_size {
            settings.batch_size = batch_size;
        }
        if let Some(reader_url) = &self.reader_url {
            settings.reader_base_url = reader_url.clone();
        }
        settings
    }

    fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    scraper_logging::initialize_for_app(cli.log_level(), cli.log_file.as_deref())
        .context("failed to initialize logging")?;

    let service = ScrapeService::new(cli.settings());
    let sweeper = service.spawn_sweeper();

    let job = service.start(&cli.seed)?;
    let summary = stream_progress(&service, job).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if summary.successful > 0 {
        let bytes = service.download(job)?;
        let target = cli.output.join(format!("scraped-content-{job}.zip"));
        std::fs::write(&target, bytes.as_slice())
            .with_context(|| format!("failed to write {}", target.display()))?;
        log::info!("bundle written to {}", target.display());
    }
    sweeper.abort();

    if let Some(error) = summary.error {
        anyhow::bail!("scrape failed: {error}");
    }
    Ok(())
}

/// Logs a job's live event stream until it finishes, then returns the final
/// summary. Completion is raced against the stream: a job that finished
/// before the subscription existed still returns instead of blocking on
/// events that were emitted to no one.
async fn stream_progress(service: &ScrapeService, job: JobId) -> anyhow::Result<JobSummary> {
    let mut events = service.subscribe(job)?;
    loop {
        tokio::select! {
            summary = service.wait(job) => return Ok(summary?),
            event = events.recv() => match event {
                Ok(ProgressEvent::Update(snapshot)) => {
                    if !snapshot.current_url.is_empty() {
                        log::info!(
                            "[{}/{}] {}",
                            snapshot.processed,
                            snapshot.total,
                            snapshot.current_url
                        );
                    }
                }
                Ok(ProgressEvent::Complete(_)) | Err(RecvError::Closed) => {
                    return Ok(service.wait(job).await?);
                }
                // Missing a few updates is fine; the summary is
                // authoritative.
                Err(RecvError::Lagged(_)) => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::stream_progress;
    use std::time::Duration;

    use scraper_engine::{PipelineSettings, ScrapeService};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn already_finished_job_does_not_block_the_stream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/seed"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let service = ScrapeService::new(PipelineSettings::default());
        let job = service.start(&format!("{}/seed", server.uri())).unwrap();
        // Let the job finish before anyone subscribes; its completion event
        // goes out with no receivers attached.
        service.wait(job).await.unwrap();

        let summary =
            tokio::time::timeout(Duration::from_secs(2), stream_progress(&service, job))
                .await
                .expect("finished job must resolve promptly")
                .unwrap();
        assert!(summary.error.is_some());
    }
}
