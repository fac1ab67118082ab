//! CLI command definitions.

use clap::{Parser, Subcommand};

pub mod migrate;
pub mod resolve;
pub mod validate;
pub mod versions;

#[derive(Parser)]
#[command(
    name = "azver",
    about = "Inspect versioned Azure API schema bundles",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered API versions for a resource type
    Versions(versions::VersionsArgs),
    /// Resolve the API version that would be used
    Resolve(resolve::ResolveArgs),
    /// Validate a property bag against a schema version
    Validate(validate::ValidateArgs),
    /// Analyze a migration between two API versions
    Migrate(migrate::MigrateArgs),
}
