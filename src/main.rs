// Entrypoint for the CLI application.
// - Keeps `main` small: parse options, build the command table and a client,
//   then hand over to the selected command.
// - Returns `anyhow::Result` so a failing command prints its error chain.

use clap::Parser;
use seafile_client::cli::{self, session::ConnectionArgs, session::TokenStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seafile", version, about = "Command line client for Seafile servers")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Log requests to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Command to run (ls, cp)
    command: Option<String>,

    /// Arguments for the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let commands = cli::builtin_commands();
    let name = match args.command.as_deref() {
        Some(name) if commands.get(name).is_some() => name,
        other => {
            if let Some(name) = other {
                eprintln!("unknown command {:?}\n", name);
            }
            eprint!("{}", commands.usage());
            std::process::exit(2);
        }
    };

    let client = cli::session::connect(&args.connection, &TokenStore::default_location())?;
    commands.dispatch(&client, name, &args.args)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "seafile_client=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
