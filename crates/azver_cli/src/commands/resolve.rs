//! Resolve command - Show which API version would be used.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::loader;

#[derive(Args)]
pub struct ResolveArgs {
    /// Resource type, e.g. "Microsoft.Network/dnsResolvers"
    resource_type: String,

    /// Explicit version pin; omit to resolve the latest active version
    #[arg(short, long)]
    api_version: Option<String>,

    /// Directory containing schema bundle files
    #[arg(short, long)]
    schemas: PathBuf,
}

pub fn execute(args: ResolveArgs) -> Result<()> {
    let manager = loader::load_registry(&args.schemas)?;

    let resolved = manager.resolve_version(&args.resource_type, args.api_version.as_deref())?;
    let config = manager.get_version_config(&args.resource_type, &resolved)?;

    println!("✅ {} -> {} [{}]", args.resource_type, resolved, config.support_level);
    Ok(())
}
