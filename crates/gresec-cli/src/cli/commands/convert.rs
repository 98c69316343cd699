//! `gresecd convert` - translate node files between encodings.

use anyhow::Result;
use tracing::info;

use super::{read_nodes, write_nodes};
use crate::cli::args::ConvertArgs;

pub fn execute(args: &ConvertArgs) -> Result<()> {
    let nodes = read_nodes(&args.input, args.from)?;
    write_nodes(&args.output, args.to, &nodes)?;
    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        count = nodes.len(),
        "converted node file"
    );
    Ok(())
}
