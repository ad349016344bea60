use clap::Parser;

use curator_cli::config::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    curator_observability::init(cli.log_format);

    let stdin = std::io::stdin();
    curator_cli::commands::run(cli.command, stdin.lock(), std::io::stdout().lock())
}
