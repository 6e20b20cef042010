mod commands;
mod terminal;

use commands::{CommandLine, Commands, history, scan, topology};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    terminal::logging::init(commands.verbose);

    match commands.command {
        Commands::Scan(args) => scan::scan(args).await,
        Commands::History { history: path, action } => history::history(path, action).await,
        Commands::Topology { id, history: path } => topology::topology(id, path).await,
    }
}
