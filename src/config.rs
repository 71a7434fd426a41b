//! Stack file loading for cfn-forge.
//! Reads an existing long-form template (JSON or YAML) and rebuilds it through
//! the builder API, so every naming, uniqueness and schema rule applies.

use crate::constants::{FORMAT_VERSION, STACK_FILES};
use crate::error::{Error, Result};
use crate::output::{Export, Output};
use crate::parameter::Parameter;
use crate::resource::Resource;
use crate::template::{Mapping, Template};
use crate::value::Value;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::de::{DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value as Json;
use serde_yaml::Value as Yaml;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceSpec {
    #[serde(rename = "Type")]
    pub resource_type: String,
    #[serde(default)]
    pub properties: IndexMap<String, Json>,
    pub depends_on: Option<DependsOn>,
    pub deletion_policy: Option<String>,
    /// Resource attributes cfn-forge does not model (Condition, Metadata, ...).
    #[serde(flatten)]
    pub other: IndexMap<String, Json>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterSpec {
    #[serde(rename = "Type")]
    pub param_type: String,
    pub default: Option<Json>,
    pub description: Option<String>,
    #[serde(default)]
    pub allowed_values: Vec<Json>,
    pub allowed_pattern: Option<String>,
    pub constraint_description: Option<String>,
    pub min_length: Option<Json>,
    pub max_length: Option<Json>,
    pub min_value: Option<Json>,
    pub max_value: Option<Json>,
    pub no_echo: Option<Json>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportSpec {
    pub name: Json,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutputSpec {
    pub value: Json,
    pub description: Option<String>,
    pub export: Option<ExportSpec>,
    #[serde(flatten)]
    pub other: IndexMap<String, Json>,
}

/// A template as read from disk, before it goes through the builder.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackFile {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "ordered_entries")]
    pub parameters: Vec<(String, ParameterSpec)>,
    #[serde(default, deserialize_with = "ordered_entries")]
    pub mappings: Vec<(String, IndexMap<String, IndexMap<String, Json>>)>,
    #[serde(default, deserialize_with = "ordered_entries")]
    pub resources: Vec<(String, ResourceSpec)>,
    #[serde(default, deserialize_with = "ordered_entries")]
    pub outputs: Vec<(String, OutputSpec)>,
    /// Sections cfn-forge does not model (Conditions, Rules, ...).
    #[serde(flatten)]
    pub other: IndexMap<String, Json>,
}

/// Reads a section as `(logical name, entry)` pairs in file order.
///
/// Repeated names are all kept, so the builder rejects the second one
/// instead of a map silently keeping the last.
fn ordered_entries<'de, D, T>(deserializer: D) -> std::result::Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct EntriesVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of logical names")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry::<String, T>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor(PhantomData))
}

/// Finds the first `.inf` or `.nan` in a YAML document.
///
/// `serde_json` reads non-finite floats as `null`, so they are looked for
/// in the raw YAML. The walk yields the dotted path of the first hit.
struct NonFiniteScan {
    path: String,
}

impl NonFiniteScan {
    fn root() -> Self {
        Self { path: String::new() }
    }

    fn child(&self, segment: &str) -> Self {
        let path = if self.path.is_empty() {
            segment.to_string()
        } else {
            format!("{}.{segment}", self.path)
        };
        Self { path }
    }
}

impl<'de> DeserializeSeed<'de> for NonFiniteScan {
    type Value = Option<String>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for NonFiniteScan {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E>(self, _: bool) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_i64<E>(self, _: i64) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_u64<E>(self, _: u64) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_i128<E>(self, _: i128) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_u128<E>(self, _: u128) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_f64<E>(self, v: f64) -> std::result::Result<Self::Value, E> {
        Ok((!v.is_finite()).then_some(self.path))
    }

    fn visit_str<E>(self, _: &str) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        let mut found = None;
        let mut index = 0;
        while let Some(hit) = seq.next_element_seed(NonFiniteScan { path: format!("{}[{index}]", self.path) })? {
            found = found.or(hit);
            index += 1;
        }
        Ok(found)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut found = None;
        while let Some(key) = map.next_key::<Yaml>()? {
            let segment = match &key {
                Yaml::String(s) => s.clone(),
                Yaml::Number(n) => n.to_string(),
                Yaml::Bool(b) => b.to_string(),
                _ => "?".to_string(),
            };
            let hit = map.next_value_seed(self.child(&segment))?;
            found = found.or(hit);
        }
        Ok(found)
    }
}

/// Resolves the stack file to read.
///
/// A directory is searched for `stack.json`, `stack.yml` or `stack.yaml`.
///
/// # Errors
/// * `Error::ConfigError` if no stack file exists
pub fn find_stack_file<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if path.is_dir() {
        for file in STACK_FILES {
            let candidate = path.join(file);
            if candidate.exists() {
                debug!("Loading stack from {}", candidate.display());
                return Ok(candidate);
            }
        }
    }
    Err(Error::ConfigError(format!(
        "No stack file found at '{}' (tried: {})",
        path.display(),
        STACK_FILES.join(", ")
    )))
}

/// Parses stack file content, trying JSON first and YAML second.
///
/// # Errors
/// * `Error::ConfigError` if the content is neither
/// * `Error::UnsupportedValue` for a YAML `.inf` or `.nan`
pub fn parse_stack(content: &str) -> Result<StackFile> {
    if let Ok(stack) = serde_json::from_str(content) {
        return Ok(stack);
    }
    let stack = serde_yaml::from_str(content)
        .map_err(|e| Error::ConfigError(format!("Invalid stack format: {e}")))?;
    if let Ok(Some(path)) = NonFiniteScan::root().deserialize(serde_yaml::Deserializer::from_str(content)) {
        return Err(Error::UnsupportedValue { path, reason: "non-finite number".to_string() });
    }
    Ok(stack)
}

/// Reads and builds the template stored at `path`.
pub fn load_stack<P: AsRef<Path>>(path: P) -> Result<Template> {
    let stack_path = find_stack_file(path)?;
    let content = std::fs::read_to_string(&stack_path)?;
    parse_stack(&content)?.into_template()
}

fn as_u32(json: &Json, path: &str) -> Result<u32> {
    let parsed = match json {
        Json::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Json::String(s) => s.parse::<u32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| Error::ConfigError(format!("{path} must be a non-negative integer")))
}

fn as_f64(json: &Json, path: &str) -> Result<f64> {
    let parsed = match json {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| Error::ConfigError(format!("{path} must be a number")))
}

fn as_bool(json: &Json, path: &str) -> Result<bool> {
    match json {
        Json::Bool(b) => Ok(*b),
        Json::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Json::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(Error::ConfigError(format!("{path} must be a boolean"))),
    }
}

impl ParameterSpec {
    fn into_parameter(self, name: &str) -> Result<Parameter> {
        let path = format!("Parameters.{name}");
        let mut parameter = Parameter::new(name, self.param_type);
        if let Some(default) = &self.default {
            parameter = parameter.default_value(Value::from_json(default, &format!("{path}.Default"))?);
        }
        if let Some(description) = self.description {
            parameter = parameter.description(description);
        }
        if !self.allowed_values.is_empty() {
            let values = self
                .allowed_values
                .iter()
                .enumerate()
                .map(|(i, v)| Value::from_json(v, &format!("{path}.AllowedValues[{i}]")))
                .collect::<Result<Vec<_>>>()?;
            parameter = parameter.allowed_values(values);
        }
        if let Some(pattern) = self.allowed_pattern {
            parameter = parameter.allowed_pattern(pattern);
        }
        if let Some(description) = self.constraint_description {
            parameter = parameter.constraint_description(description);
        }
        let min_length = self.min_length.as_ref().map(|v| as_u32(v, &format!("{path}.MinLength"))).transpose()?;
        let max_length = self.max_length.as_ref().map(|v| as_u32(v, &format!("{path}.MaxLength"))).transpose()?;
        if min_length.is_some() || max_length.is_some() {
            parameter = parameter.length(min_length, max_length);
        }
        let min_value = self.min_value.as_ref().map(|v| as_f64(v, &format!("{path}.MinValue"))).transpose()?;
        let max_value = self.max_value.as_ref().map(|v| as_f64(v, &format!("{path}.MaxValue"))).transpose()?;
        if min_value.is_some() || max_value.is_some() {
            parameter = parameter.range(min_value, max_value);
        }
        if let Some(no_echo) = &self.no_echo {
            parameter = parameter.no_echo(as_bool(no_echo, &format!("{path}.NoEcho"))?);
        }
        Ok(parameter)
    }
}

impl ResourceSpec {
    fn into_resource(self, name: &str) -> Result<Resource> {
        let mut resource = Resource::new(name, self.resource_type.as_str());
        for (key, json) in &self.properties {
            let value = Value::from_json(json, &format!("Resources.{name}.Properties.{key}"))?;
            resource.set(key.as_str(), value);
        }
        let dependencies = match self.depends_on {
            Some(DependsOn::One(target)) => vec![target],
            Some(DependsOn::Many(targets)) => targets,
            None => Vec::new(),
        };
        for target in dependencies {
            resource = resource.depends_on(target);
        }
        if let Some(policy) = self.deletion_policy {
            resource = resource.deletion_policy(policy.parse()?);
        }
        for attribute in self.other.keys() {
            warn!("Ignoring unsupported attribute '{attribute}' of resource '{name}'");
        }
        Ok(resource)
    }
}

impl OutputSpec {
    fn into_output(self, name: &str) -> Result<Output> {
        let path = format!("Outputs.{name}");
        let mut output = Output::new(name).value(Value::from_json(&self.value, &format!("{path}.Value"))?);
        if let Some(description) = self.description {
            output = output.description(description);
        }
        if let Some(export) = self.export {
            let export_name = Value::from_json(&export.name, &format!("{path}.Export.Name"))?;
            output = output.export(Export::new(export_name));
        }
        for attribute in self.other.keys() {
            warn!("Ignoring unsupported attribute '{attribute}' of output '{name}'");
        }
        Ok(output)
    }
}

impl StackFile {
    /// Builds a [`Template`] from the parsed file, section by section.
    ///
    /// # Errors
    /// * `Error::ConfigError` for an unknown format version or malformed fields
    /// * Any builder error (`DuplicateName`, `InvalidName`, `UnknownProperty`, ...)
    pub fn into_template(self) -> Result<Template> {
        if let Some(version) = &self.format_version {
            if version != FORMAT_VERSION {
                return Err(Error::ConfigError(format!(
                    "Unsupported template format version '{version}'"
                )));
            }
        }
        for section in self.other.keys() {
            warn!("Ignoring unsupported template section '{section}'");
        }

        let mut template = Template::new();
        if let Some(description) = self.description {
            template.set_description(description);
        }
        for (name, spec) in self.parameters {
            template.add_parameter(spec.into_parameter(&name)?)?;
        }
        for (name, table) in self.mappings {
            let mut mapping = Mapping::new();
            for (top_key, entries) in table {
                let mut converted = IndexMap::new();
                for (key, json) in entries {
                    let value = Value::from_json(&json, &format!("Mappings.{name}.{top_key}.{key}"))?;
                    converted.insert(key, value);
                }
                mapping.insert(top_key, converted);
            }
            template.add_mapping(name, mapping)?;
        }
        for (name, spec) in self.resources {
            template.add_resource(spec.into_resource(&name)?)?;
        }
        for (name, spec) in self.outputs {
            template.add_output(spec.into_output(&name)?)?;
        }
        Ok(template)
    }
}
