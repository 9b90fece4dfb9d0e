use crate::commands::{run_allocate, run_compare, run_dedup, AllocateArgs, CompareArgs, DedupArgs};
use crate::server;
use agency_locator::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "agency-locator",
    about = "Resolve service agency locations and divide HQ contract dollars across them",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run the allocation pipeline over CSV inputs and write the output tables
    Allocate(AllocateArgs),
    /// Compare two address strings and print the decision
    Compare(CompareArgs),
    /// Print the canonical address mapping for a service agency table
    Dedup(DedupArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Allocate(args) => run_allocate(args),
        Command::Compare(args) => run_compare(args),
        Command::Dedup(args) => run_dedup(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agency_locator::workflows::addresses::ConsolidationStrategy;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["agency-locator"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn allocate_accepts_pipeline_overrides() {
        let cli = Cli::try_parse_from([
            "agency-locator",
            "allocate",
            "--links",
            "links.csv",
            "--hq",
            "hq.csv",
            "--services",
            "services.csv",
            "--out",
            "allocation.csv",
            "--threshold",
            "0.5",
            "--consolidation",
            "pairwise",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Allocate(args)) => {
                assert_eq!(args.threshold, Some(0.5));
                assert_eq!(args.consolidation, Some(ConsolidationStrategy::Pairwise));
                assert!(args.satellites.is_none());
            }
            other => panic!("expected allocate, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_strategies() {
        let result = Cli::try_parse_from([
            "agency-locator",
            "allocate",
            "--links",
            "l.csv",
            "--hq",
            "h.csv",
            "--services",
            "s.csv",
            "--out",
            "o.csv",
            "--consolidation",
            "closure",
        ]);
        assert!(result.is_err());
    }
}
