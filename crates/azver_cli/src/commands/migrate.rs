//! Migrate command - Analyze a migration between two API versions.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use azver_schema::PropertyChangeKind;

use crate::loader;

#[derive(Args)]
pub struct MigrateArgs {
    /// Resource type, e.g. "Microsoft.Network/dnsResolvers"
    resource_type: String,

    /// Source version
    #[arg(long)]
    from: String,

    /// Target version
    #[arg(long)]
    to: String,

    /// Directory containing schema bundle files
    #[arg(short, long)]
    schemas: PathBuf,
}

pub fn execute(args: MigrateArgs) -> Result<()> {
    let manager = loader::load_registry(&args.schemas)?;

    let analysis = manager.analyze_migration(&args.resource_type, &args.from, &args.to)?;

    if analysis.compatible {
        println!("✅ {} -> {} is compatible", analysis.from_version, analysis.to_version);
    } else {
        println!(
            "❌ {} -> {} has breaking changes",
            analysis.from_version, analysis.to_version
        );
    }

    for name in &analysis.added_properties {
        println!("   + {}", name);
    }
    for name in &analysis.removed_properties {
        println!("   - {}", name);
    }
    for change in &analysis.changed_properties {
        let description = match &change.kind {
            PropertyChangeKind::TypeChanged { from, to } => {
                format!("type changed {} -> {}", from, to)
            }
            PropertyChangeKind::BecameRequired => "became required".to_string(),
            PropertyChangeKind::BecameOptional => "became optional".to_string(),
        };
        let marker = if change.breaking { "💥" } else { "~" };
        println!("   {} {}: {}", marker, change.name, description);
    }
    for warning in &analysis.warnings {
        println!("   ⚠️  {}", warning);
    }

    Ok(())
}
