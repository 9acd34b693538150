use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use relfetch::{Api, ArtifactPattern, FetchError, FetchOutcome};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Download the latest versioned runtime artifact from GitHub releases.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Repository to poll, as <owner>/<name>
    repo: String,

    /// Directory the artifact is installed into
    #[arg(short, long, default_value = "run/plugins")]
    dir: PathBuf,

    /// Artifact name prefix, as in <prefix>-<version>.<extension>
    #[arg(long, default_value = "runtime")]
    prefix: String,

    /// Artifact file extension
    #[arg(long, default_value = "jar")]
    extension: String,

    /// Fetch this release tag instead of the latest release
    #[arg(long)]
    tag: Option<String>,

    /// Bearer token for the GitHub API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API root, for GitHub Enterprise hosts
    #[arg(long, default_value = relfetch::release::GITHUB_API_BASE)]
    api_base: String,

    /// HTTP/HTTPS proxy URL
    #[arg(long)]
    proxy: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Connect timeout in seconds
    #[arg(long, default_value_t = 10)]
    connect_timeout: u64,

    /// Retries for a transient release lookup failure (HTTP 429/5xx, network errors)
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Skip opening .jar/.zip downloads as archives
    #[arg(long)]
    no_verify: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<FetchOutcome, FetchError> {
    let pattern = ArtifactPattern::new(&args.prefix, &args.extension)?;

    let mut api = Api::new()
        .set_target_dir(args.dir)
        .set_token(args.token)
        .set_api_base(&args.api_base)
        .set_timeout(Duration::from_secs(args.timeout))
        .set_connect_timeout(Duration::from_secs(args.connect_timeout))
        .set_retry_count(args.retries)
        .set_verify_archive(!args.no_verify);
    if let Some(proxy) = &args.proxy {
        api = api.set_proxy(proxy);
    }
    if args.no_progress {
        api = api.no_progress();
    }

    let repo = api.repo(&args.repo)?;
    let version = match &args.tag {
        Some(tag) => repo.tag(tag),
        None => repo.latest(),
    };
    version.fetch(&pattern)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(outcome) => {
            println!("{}", outcome.path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
