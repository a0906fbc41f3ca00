mod commands;
mod terminal;

use commands::{CommandLine, discover};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    let _log_guard =
        logging::init_logging(commands.verbose, commands.quiet, commands.log_file.as_deref())?;

    print::header("getting ready for discovery", commands.quiet);
    discover::discover(&commands).await
}
