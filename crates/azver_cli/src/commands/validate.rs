//! Validate command - Check a property bag against a schema version.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use azver_schema::validate;

use crate::loader;

#[derive(Args)]
pub struct ValidateArgs {
    /// Resource type, e.g. "Microsoft.Network/dnsResolvers"
    resource_type: String,

    /// JSON file with the property bag to validate
    #[arg(short, long)]
    props: PathBuf,

    /// Explicit version pin; omit to validate against the latest active
    /// version
    #[arg(short, long)]
    api_version: Option<String>,

    /// Directory containing schema bundle files
    #[arg(short, long)]
    schemas: PathBuf,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    let manager = loader::load_registry(&args.schemas)?;

    let version = manager.resolve_version(&args.resource_type, args.api_version.as_deref())?;
    let schema = manager.get_schema(&args.resource_type, &version)?;
    info!(resource_type = %args.resource_type, %version, "validating");

    let content = std::fs::read_to_string(&args.props)
        .with_context(|| format!("reading {}", args.props.display()))?;
    let input: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", args.props.display()))?;

    let result = validate(&schema, &input)?;

    for warning in &result.warnings {
        println!("⚠️  {}", warning);
    }

    if result.valid {
        println!("✅ {} is valid against {}@{}", args.props.display(), args.resource_type, version);
        Ok(())
    } else {
        println!("❌ Validation failed against {}@{}:", args.resource_type, version);
        for line in result.format_errors() {
            println!("   - {}", line);
        }
        anyhow::bail!("validation failed with {} error(s)", result.errors.len());
    }
}
