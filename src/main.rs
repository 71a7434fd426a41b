//! cfn-forge's main application entry point.
//! Builds a template from a stack file or a blueprint and writes one rendered
//! file per requested format.

use cfn_forge::{
    cli::{get_args, Args},
    config::load_stack,
    error::{default_error_handler, Result},
    logger::init_logger,
    renderer::{plan_outputs, write_rendered},
};
use log::{debug, warn};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Loads the stack file, or builds the selected blueprint
/// 2. Warns about references to undeclared names
/// 3. Renders every requested format; all paths are checked before writing
fn run(args: Args) -> Result<()> {
    let template = match &args.stack {
        Some(path) => load_stack(path)?,
        None => {
            debug!("No stack file given, using blueprint {:?}", args.blueprint);
            args.blueprint.build()?
        }
    };

    for dangling in template.dangling_references() {
        warn!("'{}' references undeclared {} '{}'", dangling.from, dangling.kind, dangling.target);
    }

    let targets = plan_outputs(&args.output_dir, &args.name, &args.formats, args.force)?;

    for (format, path) in targets {
        write_rendered(&template, format, &path)?;
        println!("Rendered {format}: '{}'", path.display());
    }
    Ok(())
}
