//! `gresecd check` - validate a node file.

use anyhow::Result;

use super::read_nodes;
use crate::cli::args::CheckArgs;

pub fn execute(args: &CheckArgs) -> Result<()> {
    let nodes = read_nodes(&args.file, args.format)?;
    for node in &nodes {
        println!("{node}");
    }
    eprintln!("{}: {} valid node(s)", args.file.display(), nodes.len());
    Ok(())
}
