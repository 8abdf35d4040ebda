use clap::Args;
use scrutin_bot::config::AppConfig;
use scrutin_bot::error::AppError;
use scrutin_bot::workflows::publishing::{PollOutcome, PublishRequest, StatusPublisher};
use scrutin_bot::workflows::scrutin::{ChartRenderer, RenderedCharts, VoteSummary};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// Vote record JSON files, processed in order
    #[arg(required = true, num_args = 1..)]
    pub(crate) files: Vec<PathBuf>,
    /// Stop at the first record that fails instead of moving on
    #[arg(long)]
    pub(crate) fail_fast: bool,
}

pub(crate) fn run_render(config: &AppConfig, args: BatchArgs) -> Result<(), AppError> {
    let renderer = ChartRenderer::new(&config.media.root)?;

    for_each_record(args, |path| {
        let (summary, charts) = render_record(&renderer, path)?;
        print_summary(&summary, &charts);
        Ok(())
    })
}

pub(crate) fn run_publish(config: &AppConfig, args: BatchArgs) -> Result<(), AppError> {
    let renderer = ChartRenderer::new(&config.media.root)?;
    let publisher = StatusPublisher::from_config(&config.publishing)?;

    for_each_record(args, |path| {
        let (summary, charts) = render_record(&renderer, path)?;
        let receipt = publisher.publish(PublishRequest::for_vote(&summary, &charts))?;

        println!("Vote {} published as post {}", summary.id(), receipt.post_id);
        match &receipt.poll {
            PollOutcome::Replied(reply_id) => println!("  Poll reply: {reply_id}"),
            PollOutcome::Failed(err) => println!("  Poll reply failed: {err}"),
        }
        Ok(())
    })
}

fn render_record(
    renderer: &ChartRenderer,
    path: &Path,
) -> Result<(VoteSummary, RenderedCharts), AppError> {
    let summary = VoteSummary::from_path(path)?;
    let charts = renderer.render(&summary)?;
    info!(
        vote = summary.id(),
        source = %path.display(),
        "charts rendered"
    );
    Ok((summary, charts))
}

fn print_summary(summary: &VoteSummary, charts: &RenderedCharts) {
    println!("Vote {}", summary.id());
    for line in summary.status_text().lines() {
        println!("  {line}");
    }
    if let Some(requester) = summary.requester_line() {
        println!("  {requester}");
    }
    for chart in charts.paths() {
        println!("  Chart: {}", chart.display());
    }
}

/// Runs `step` on every file. Failures are logged and counted so one bad
/// record does not hide the others, unless `fail_fast` is set.
fn for_each_record<F>(args: BatchArgs, mut step: F) -> Result<(), AppError>
where
    F: FnMut(&Path) -> Result<(), AppError>,
{
    let BatchArgs { files, fail_fast } = args;
    let total = files.len();
    let mut failed = 0;

    for path in &files {
        if let Err(err) = step(path) {
            error!(source = %path.display(), error = %err, "vote record failed");
            if fail_fast {
                return Err(err);
            }
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(AppError::Batch { failed, total });
    }
    Ok(())
}
