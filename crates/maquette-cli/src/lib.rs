//! CLI logic for the Maquette workspace tool.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::info;

use maquette::{MaquetteError, WorkspaceBuilder};

/// Run the Maquette CLI application
///
/// This function parses the input workspace file and writes the plain-text
/// dump to the output file.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `MaquetteError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
pub fn run(args: &Args) -> Result<(), MaquetteError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing workspace"
    );

    // Load configuration
    let mut app_config = config::load_config(args.config.as_ref())?;
    if args.restricted {
        app_config.parser_mut().set_restricted(true);
    }

    // Process the workspace using the WorkspaceBuilder API
    let builder = WorkspaceBuilder::new(app_config);
    let workspace = builder.parse_file(&args.input)?;
    let dump = builder.dump_text(&workspace);

    // Write output file
    fs::write(&args.output, dump)?;

    info!(output_file = args.output; "Workspace exported successfully");

    Ok(())
}
