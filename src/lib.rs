//! cfn-forge assembles CloudFormation templates from typed resource records
//! and renders them to YAML and JSON.
//!
//! ```ignore
//! let mut template = Template::new();
//! template.add_resource(Resource::new("VPC", ResourceType::Vpc).property("CidrBlock", "10.0.0.0/16"))?;
//! let json = render(&template, Format::Json)?;
//! ```

/// Built-in stacks
pub mod blueprint;

/// Command-line interface module for the cfn-forge binary
pub mod cli;

/// Stack file loading
/// Supports JSON and YAML templates (stack.json, stack.yml, stack.yaml)
pub mod config;

/// Common constants: format version, template quotas, file names
pub mod constants;

/// Error types and handling
pub mod error;

/// Intrinsic functions (`Fn::*`) and pseudo parameters
pub mod intrinsic;

pub mod logger;

pub mod output;

pub mod parameter;

/// JSON and YAML renderers
pub mod renderer;

pub mod resource;

/// Resource type tags and per-type property schemas
pub mod schema;

/// The template builder
pub mod template;

pub mod value;

pub use error::{Error, Result};
pub use intrinsic::{Intrinsic, Pseudo, Sub};
pub use output::{Export, Output};
pub use parameter::Parameter;
pub use renderer::{render, render_to, Format};
pub use resource::{DeletionPolicy, Resource, Tags};
pub use schema::ResourceType;
pub use template::Template;
pub use value::{ReferenceKind, Value};
