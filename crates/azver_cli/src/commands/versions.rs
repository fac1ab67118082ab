//! Versions command - List registered API versions.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::loader;

#[derive(Args)]
pub struct VersionsArgs {
    /// Resource type, e.g. "Microsoft.Network/dnsResolvers"
    resource_type: String,

    /// Directory containing schema bundle files
    #[arg(short, long)]
    schemas: PathBuf,
}

pub fn execute(args: VersionsArgs) -> Result<()> {
    let manager = loader::load_registry(&args.schemas)?;

    let versions = manager.list_versions(&args.resource_type)?;
    let latest = manager.latest_version(&args.resource_type);

    println!("📋 {} ({} versions)", args.resource_type, versions.len());
    for version in versions {
        let config = manager.get_version_config(&args.resource_type, &version)?;
        let marker = if latest.as_deref() == Some(version.as_str()) {
            " (latest)"
        } else {
            ""
        };
        println!("   {} [{}]{}", version, config.support_level, marker);
    }

    Ok(())
}
