use anyhow::Result;
use clap::Parser;
use tracing::info;

use stalemate::{GitHub, Repo, RuleSet, run};

// Human-readable build info (for clap version display)
const BUILD_INFO_HUMAN: &str = env!("BUILD_INFO_HUMAN");

#[derive(Parser)]
#[command(name = "stalemate")]
#[command(
    about = "Closes issues and PRs whose pending:* labels went unanswered past their grace period, and unlabels the ones that saw activity"
)]
#[command(long_version = BUILD_INFO_HUMAN)]
struct Cli {
    /// GitHub repository in format 'owner/repo'
    #[arg(short = 'r', long = "repo", value_name = "OWNER/REPO")]
    repo: String,

    /// Decide and log what would happen without mutating anything
    #[arg(long = "dry-run")]
    dry_run: bool,
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let repo = Repo::parse(&cli.repo)?;
    let forge = GitHub::from_env().await?;

    let rule_sets = [RuleSet::for_issues(), RuleSet::for_pulls()];
    let summary = run(&forge, &repo, &rule_sets, cli.dry_run).await?;

    info!(
        closed = summary.closed,
        reactivated = summary.reactivated,
        kept_open = summary.kept_open,
        skipped = summary.skipped,
        failed = summary.failed,
        "run complete"
    );

    if summary.failed > 0 {
        anyhow::bail!("{} item(s) failed to process", summary.failed);
    }

    Ok(())
}
