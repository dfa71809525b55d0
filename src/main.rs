use clap::Parser;
use tracing_subscriber::EnvFilter;

use passync::cli::commands::sync::Action;
use passync::cli::{self, Cli, Commands, context};

fn main() {
    let args = Cli::parse();
    init_logging(args.verbose);

    context::init(args.data_dir.as_deref());
    let data_dir = context::data_dir();

    let result = match &args.command {
        Commands::Init {
            mode,
            username,
            no_key,
        } => cli::commands::init::execute(data_dir, mode, username, *no_key),
        Commands::Keys { action } => cli::commands::keys::execute(data_dir, action),
        Commands::Insert { name } => cli::commands::entries::insert(data_dir, name),
        Commands::Show { name } => cli::commands::entries::show(data_dir, name),
        Commands::Clone { url } => cli::commands::sync::clone(data_dir, url, args.json),
        Commands::Pull => cli::commands::sync::execute(data_dir, Action::Pull, args.json),
        Commands::Push => cli::commands::sync::execute(data_dir, Action::Push, args.json),
        Commands::Sync => cli::commands::sync::execute(data_dir, Action::Sync, args.json),
        Commands::Reset => cli::commands::sync::execute(data_dir, Action::Reset, args.json),
        Commands::Unstick => cli::commands::sync::execute(data_dir, Action::Unstick, args.json),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            cli::output::error(&format!("Error: {e}"));
            std::process::exit(1);
        }
    }
}

/// Log to stderr. `RUST_LOG` wins; otherwise warnings only, or debug
/// with `--verbose`. Events never carry secret values.
fn init_logging(verbose: bool) {
    let default = if verbose { "passync=debug" } else { "passync=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
