use crate::report::{
    run_analyze, run_modifiers, run_suggest, run_transform_command, AnalyzeArgs, ModifiersArgs,
    SuggestArgs, TransformArgs,
};
use crate::{mcp, server};
use clap::{Args, Parser, Subcommand};
use unslop::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "unslop",
    about = "Score image-generation prompts for an AI-generated look and rewrite them toward photographic realism",
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
    /// Score a prompt and list the AI markers it contains
    Analyze(AnalyzeArgs),
    /// Rewrite a prompt with photographic modifiers
    Transform(TransformArgs),
    /// Propose modifiers for a prompt without rewriting it
    Suggest(SuggestArgs),
    /// List the modifier vocabulary
    Modifiers(ModifiersArgs),
    /// Run the MCP server over stdio
    Mcp,
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
        Command::Analyze(args) => run_analyze(args),
        Command::Transform(args) => run_transform_command(args),
        Command::Suggest(args) => run_suggest(args),
        Command::Modifiers(args) => run_modifiers(args),
        Command::Mcp => mcp::run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_flags_parse() {
        let cli = Cli::try_parse_from([
            "unslop",
            "transform",
            "a woman in a cafe",
            "--style",
            "phone",
            "--preserve",
            "--seed",
            "7",
            "--json",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Transform(args)) => {
                assert_eq!(args.prompt, "a woman in a cafe");
                assert_eq!(args.style.as_deref(), Some("phone"));
                assert!(args.preserve);
                assert_eq!(args.seed, Some(7));
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["unslop"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn modifiers_accepts_category_filter() {
        let cli = Cli::try_parse_from(["unslop", "modifiers", "--category", "lighting"])
            .expect("arguments parse");
        match cli.command {
            Some(Command::Modifiers(args)) => {
                assert_eq!(args.category.as_deref(), Some("lighting"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
