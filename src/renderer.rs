//! Template renderers for cfn-forge.
//! Serializes a template into JSON, long-form YAML or short-form YAML.
use crate::constants::JSON_INDENT;
use crate::error::{Error, Result};
use crate::template::Template;
use log::debug;
use serde::Serialize;
use serde_json::Value as Json;
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::Value as Yaml;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Wire formats a template can be rendered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Format {
    Json,
    /// Intrinsic functions written as `Ref:` / `Fn::*:` mapping keys.
    Yaml,
    /// Intrinsic functions written as `!Ref` / `!Sub` tags.
    #[value(name = "yaml-short")]
    YamlShort,
}

impl Format {
    /// Renderer implementing this format.
    pub fn renderer(&self) -> Box<dyn TemplateRenderer> {
        match self {
            Format::Json => Box::new(JsonRenderer),
            Format::Yaml => Box::new(YamlRenderer::new(false)),
            Format::YamlShort => Box::new(YamlRenderer::new(true)),
        }
    }

    /// File extension used for rendered output.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml | Format::YamlShort => "yaml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::Yaml => write!(f, "yaml"),
            Format::YamlShort => write!(f, "yaml-short"),
        }
    }
}

/// Trait for template serialization engines.
pub trait TemplateRenderer {
    /// Serializes a lowered template document.
    ///
    /// # Arguments
    /// * `document` - Output of [`Template::to_document`]
    ///
    /// # Returns
    /// * `Result<String>` - Rendered text
    fn render(&self, document: &Json) -> Result<String>;
}

/// Pretty-printed JSON with 4-space indentation.
pub struct JsonRenderer;

impl TemplateRenderer for JsonRenderer {
    fn render(&self, document: &Json) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document.serialize(&mut ser)?;
        buf.push(b'\n');
        String::from_utf8(buf).map_err(|e| Error::IoError(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

/// YAML, optionally with short-form intrinsic tags.
pub struct YamlRenderer {
    short_form: bool,
}

impl YamlRenderer {
    pub fn new(short_form: bool) -> Self {
        Self { short_form }
    }
}

impl Default for YamlRenderer {
    fn default() -> Self {
        YamlRenderer::new(false)
    }
}

impl TemplateRenderer for YamlRenderer {
    fn render(&self, document: &Json) -> Result<String> {
        let value = serde_yaml::to_value(document)?;
        let value = if self.short_form { shorten(value) } else { value };
        Ok(serde_yaml::to_string(&value)?)
    }
}

/// Tag name for a single-key intrinsic mapping, if `key` names one.
fn short_tag(key: &str) -> Option<String> {
    if key == "Ref" {
        return Some(key.to_string());
    }
    key.strip_prefix("Fn::").map(str::to_string)
}

/// `[Resource, Attribute]` becomes `Resource.Attribute`.
fn dotted_get_att(parts: Vec<Yaml>) -> Yaml {
    if let [Yaml::String(resource), Yaml::String(attribute)] = parts.as_slice() {
        return Yaml::String(format!("{resource}.{attribute}"));
    }
    Yaml::Sequence(parts)
}

/// Rewrites `{Fn::Name: args}` mappings into `!Name args` tags.
///
/// A function whose argument is itself tagged stays in long form, since a
/// YAML node carries a single tag.
fn shorten(value: Yaml) -> Yaml {
    match value {
        Yaml::Sequence(items) => Yaml::Sequence(items.into_iter().map(shorten).collect()),
        Yaml::Mapping(map) => {
            let tag = match map.len() {
                1 => map.keys().next().and_then(Yaml::as_str).and_then(short_tag),
                _ => None,
            };
            let mut entries = map.into_iter().map(|(k, v)| (k, shorten(v)));
            match tag {
                Some(tag) => {
                    let (key, inner) = match entries.next() {
                        Some(entry) => entry,
                        None => return Yaml::Mapping(Default::default()),
                    };
                    if matches!(inner, Yaml::Tagged(_)) {
                        return Yaml::Mapping([(key, inner)].into_iter().collect());
                    }
                    let inner = match (tag.as_str(), inner) {
                        ("GetAtt", Yaml::Sequence(parts)) => dotted_get_att(parts),
                        (_, inner) => inner,
                    };
                    Yaml::Tagged(Box::new(TaggedValue { tag: Tag::new(tag), value: inner }))
                }
                None => Yaml::Mapping(entries.collect()),
            }
        }
        other => other,
    }
}

/// Renders a template to bytes.
///
/// Rendering is a pure function of the template: the same template always
/// yields byte-identical output.
///
/// # Errors
/// * `Error::UnsupportedValue` if a value cannot be represented
/// * `Error::JsonError` / `Error::YamlError` on serializer failures
pub fn render(template: &Template, format: Format) -> Result<Vec<u8>> {
    debug!("Rendering template as {format}");
    let document = template.to_document()?;
    Ok(format.renderer().render(&document)?.into_bytes())
}

/// Renders a template into a caller-supplied sink.
pub fn render_to<W: Write>(template: &Template, format: Format, sink: &mut W) -> Result<()> {
    let bytes = render(template, format)?;
    sink.write_all(&bytes)?;
    sink.flush()?;
    Ok(())
}

/// Resolves the file every requested format is written to.
///
/// Repeated formats are kept once, in first-seen order. Every target is
/// checked before any is returned, so a refusal leaves the disk untouched.
///
/// # Arguments
/// * `output_dir` - Directory the files are written to
/// * `name` - Base file name; the format's extension is appended
/// * `formats` - Requested formats
/// * `force` - Whether existing files may be overwritten
///
/// # Errors
/// * `Error::ConfigError` if `yaml` and `yaml-short` are both requested
/// * `Error::ConfigError` if a target exists and `force` is false
pub fn plan_outputs(
    output_dir: &Path,
    name: &str,
    formats: &[Format],
    force: bool,
) -> Result<Vec<(Format, PathBuf)>> {
    let mut unique: Vec<Format> = Vec::new();
    for format in formats {
        if !unique.contains(format) {
            unique.push(*format);
        }
    }
    if unique.contains(&Format::Yaml) && unique.contains(&Format::YamlShort) {
        return Err(Error::ConfigError(
            "yaml and yaml-short both write the .yaml file, pick one".to_string(),
        ));
    }

    let mut targets = Vec::with_capacity(unique.len());
    for format in unique {
        let path = output_dir.join(format!("{name}.{}", format.extension()));
        if path.exists() && !force {
            return Err(Error::ConfigError(format!(
                "'{}' already exists, use --force to overwrite it",
                path.display()
            )));
        }
        targets.push((format, path));
    }
    Ok(targets)
}

/// Renders a template and writes it to `path`, creating parent directories.
///
/// The file is opened only after rendering succeeded, so a failed render
/// never truncates a previous output.
pub fn write_rendered(template: &Template, format: Format, path: &Path) -> Result<()> {
    let bytes = render(template, format)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_uses_four_space_indent() {
        let out = JsonRenderer.render(&json!({"A": {"B": "c"}})).unwrap();
        assert_eq!(out, "{\n    \"A\": {\n        \"B\": \"c\"\n    }\n}\n");
    }

    #[test]
    fn test_short_form_tags_intrinsics() {
        let doc = json!({
            "VpcId": {"Ref": "VPC"},
            "Dns": {"Fn::GetAtt": ["Lb", "DNSName"]},
            "UserData": {"Fn::Base64": {"Fn::Sub": "echo ${AWS::Region}"}}
        });
        let out = YamlRenderer::new(true).render(&doc).unwrap();
        assert!(out.contains("VpcId: !Ref VPC"), "{out}");
        assert!(out.contains("Dns: !GetAtt Lb.DNSName"), "{out}");
        assert!(out.contains("Fn::Base64: !Sub"), "{out}");
    }

    #[test]
    fn test_long_form_yaml_keeps_mapping_keys() {
        let out = YamlRenderer::default().render(&json!({"VpcId": {"Ref": "VPC"}})).unwrap();
        assert_eq!(out, "VpcId:\n  Ref: VPC\n");
    }
}
