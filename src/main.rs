use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use changelog_release::cli::orchestration::{check_args, run_create, run_validate, ReleaseArgs};
use changelog_release::config::{self, Config};
use changelog_release::provider::ProviderKind;
use changelog_release::{ui, ReleaseError};

#[derive(clap::Parser)]
#[command(
    name = "release",
    about = "Create and validate release tags from a changelog"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    /// Log more; repeat for more detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Create the tag (and release note) for the latest changelog version
    Create(TagArgs),

    /// Check that the latest changelog version can be tagged, without writing
    Validate(TagArgs),

    /// Print the version of this tool
    Version,
}

#[derive(clap::Args)]
struct TagArgs {
    #[arg(long, value_enum, help = "Backend to publish to; defaults to git when --origin is set")]
    provider: Option<ProviderKind>,

    #[arg(long, help = "Username (GitLab does not need one)")]
    username: Option<String>,

    #[arg(long, env = "RELEASE_PASSWORD", hide_env_values = true, help = "Password or API token")]
    password: Option<String>,

    #[arg(long, help = "Tagger email (git provider)")]
    email: Option<String>,

    #[arg(long, help = "Repository as owner/name (hosted providers)")]
    repo: Option<String>,

    #[arg(long, help = "Changelog markdown file [default: CHANGELOG.md]")]
    changelog: Option<String>,

    #[arg(long, help = "Full 40 character commit hash to tag")]
    hash: Option<String>,

    #[arg(long, help = "API base URL replacing the provider's public one; server root for bitbucket-server")]
    host: Option<String>,

    #[arg(long, help = "Remote URL or path (git provider)")]
    origin: Option<String>,

    #[arg(long, help = "Private key for SSH remotes; --password unlocks it")]
    ssh_key: Option<PathBuf>,
}

impl TagArgs {
    /// Flags win over the config file
    fn into_release_args(self, config: Config) -> ReleaseArgs {
        let origin = self.origin.or(config.git.origin).unwrap_or_default();
        let provider = self
            .provider
            .or(config.provider)
            .or_else(|| (!origin.is_empty()).then_some(ProviderKind::Git));

        ReleaseArgs {
            provider,
            username: self.username.or(config.username).unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            email: self.email.or(config.git.email).unwrap_or_default(),
            repo: self.repo.or(config.repo).unwrap_or_default(),
            changelog: self.changelog.unwrap_or(config.changelog),
            hash: self.hash.unwrap_or_default(),
            host: self.host.or(config.host),
            origin,
            ssh_key: self.ssh_key.or(config.git.ssh_key),
        }
    }
}

fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        let code = e.downcast_ref::<ReleaseError>().map_or(1, ReleaseError::exit_code);
        std::process::exit(code);
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Create(tag_args) => {
            let release = resolve_args("create", tag_args, args.config.as_deref())?;
            let result = run_create(&release)?;

            ui::display_outcome(&result.tag, result.outcome);
            ui::display_tag(&result.tag);
            Ok(())
        }
        Command::Validate(tag_args) => {
            let release = resolve_args("validate", tag_args, args.config.as_deref())?;
            let result = run_validate(&release)?;

            ui::display_validation(&result.tag, &result.state);
            ui::display_tag(&result.tag);
            Ok(())
        }
    }
}

fn resolve_args(command: &str, tag_args: TagArgs, config_path: Option<&str>) -> Result<ReleaseArgs> {
    let config = config::load_config(config_path)?;
    let release = tag_args.into_release_args(config);

    let problems = check_args(&release);
    if !problems.is_empty() {
        ui::display_usage_problems(command, &problems);
        std::process::exit(2);
    }

    Ok(release)
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
