//! Version information display.
//!
//! Prints version metadata in human or JSON format.

use serde_json::json;

use crate::cli::args::{OutputFormat, VersionArgs};
use crate::error::GridClashError;

/// Print version information.
///
/// # Errors
///
/// Returns a JSON error if the JSON form cannot be encoded.
pub fn run(args: &VersionArgs) -> Result<(), GridClashError> {
    println!("{}", render(args.format)?);
    Ok(())
}

fn render(format: OutputFormat) -> Result<String, GridClashError> {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    Ok(match format {
        OutputFormat::Human => format!("{name} {version}"),
        OutputFormat::Json => serde_json::to_string(&json!({
            "name": name,
            "version": version,
        }))?,
    })
}
