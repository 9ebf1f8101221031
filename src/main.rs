use clap::Parser;
use hearth::cli::commands::{Cli, Commands};
use hearth::cli::handlers;

fn main() {
    let cli = Cli::parse();
    let dir = cli.dir.as_deref();

    let result = match cli.command {
        None => {
            let path = handlers::dashboard_path(dir);
            hearth::tui::run(&path, cli.demo)
        }
        Some(Commands::Init) => handlers::cmd_init(dir),
        Some(Commands::Check) => handlers::cmd_check(dir),
        Some(Commands::Log(args)) => handlers::cmd_log(dir, args.count),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
