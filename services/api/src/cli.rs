use crate::estimate::{run_estimate, EstimateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use relocation_calc::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Relocation Calculator",
    about = "Housing, car and accessibility calculations for candidate home addresses",
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
    /// Print the monthly cost of every address of an interview file
    Estimate(EstimateArgs),
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
        Command::Estimate(args) => run_estimate(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["relocation-calc-api"]).expect("parses");
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["relocation-calc-api", "serve", "--port", "8080"])
            .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => assert_eq!(args.port, Some(8080)),
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn estimate_requires_an_interview_file() {
        assert!(Cli::try_parse_from(["relocation-calc-api", "estimate"]).is_err());
        let cli = Cli::try_parse_from([
            "relocation-calc-api",
            "estimate",
            "--interview",
            "interview.json",
        ])
        .expect("parses");
        assert!(matches!(cli.command, Some(Command::Estimate(_))));
    }
}
