use anyhow::Result;
use sosme::cli::cli;

fn main() -> Result<()> {
    cli()
}
