//! Common constants used throughout cfn-forge.

/// The only template format version the platform understands.
pub const FORMAT_VERSION: &str = "2010-09-09";

/// Platform quotas for a single template.
pub const MAX_RESOURCES: usize = 500;
pub const MAX_PARAMETERS: usize = 200;
pub const MAX_OUTPUTS: usize = 200;
pub const MAX_MAPPINGS: usize = 200;

/// Stack file names tried when a directory is given instead of a file.
pub const STACK_FILES: [&str; 3] = ["stack.json", "stack.yml", "stack.yaml"];

/// Indentation used by the JSON renderer.
pub const JSON_INDENT: &[u8] = b"    ";
