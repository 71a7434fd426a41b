//! The template: ordered, name-keyed collections of parameters, mappings,
//! resources and outputs.

use crate::constants::{FORMAT_VERSION, MAX_MAPPINGS, MAX_OUTPUTS, MAX_PARAMETERS, MAX_RESOURCES};
use crate::error::{Error, Result};
use crate::intrinsic::Pseudo;
use crate::output::Output;
use crate::parameter::Parameter;
use crate::resource::Resource;
use crate::value::{record_to_json, ReferenceKind, Value};
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde_json::{Map, Value as Json};
use std::sync::OnceLock;

/// Second-level `FindInMap` table: top key -> second key -> value.
pub type Mapping = IndexMap<String, IndexMap<String, Value>>;

/// A reference whose target is not declared in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    /// Logical name of the entity holding the reference.
    pub from: String,
    /// Logical name the reference points at.
    pub target: String,
    /// Kind of entity the target has to name.
    pub kind: ReferenceKind,
}

/// An infrastructure stack under construction.
///
/// Every `add_*` call is atomic: when it fails, the template is left exactly
/// as it was.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    description: Option<String>,
    parameters: IndexMap<String, Parameter>,
    mappings: IndexMap<String, Mapping>,
    resources: IndexMap<String, Resource>,
    outputs: IndexMap<String, Output>,
}

fn logical_name_regex() -> &'static Regex {
    static LOGICAL_NAME: OnceLock<Regex> = OnceLock::new();
    LOGICAL_NAME.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+$").expect("logical name pattern is valid"))
}

/// Validates a logical name and its uniqueness within one category.
fn check_insert<T>(
    category: &'static str,
    name: &str,
    existing: &IndexMap<String, T>,
    limit: usize,
) -> Result<()> {
    if !logical_name_regex().is_match(name) {
        return Err(Error::InvalidName { category, name: name.to_string() });
    }
    if existing.contains_key(name) {
        return Err(Error::DuplicateName { category, name: name.to_string() });
    }
    if existing.len() >= limit {
        return Err(Error::LimitExceeded { category, limit });
    }
    Ok(())
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_description<S: Into<String>>(&mut self, description: S) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Registers a resource under its logical name.
    ///
    /// # Errors
    /// * `Error::InvalidName` if the name is empty or not alphanumeric
    /// * `Error::DuplicateName` if a resource with that name exists
    /// * `Error::LimitExceeded` past the resource quota
    /// * `Error::UnknownProperty` if a property is foreign to a known type
    ///
    /// Returns a reference to the stored resource.
    pub fn add_resource(&mut self, resource: Resource) -> Result<&Resource> {
        check_insert("resource", resource.logical_name(), &self.resources, MAX_RESOURCES)?;
        resource.check_properties()?;
        debug!("Adding resource {} ({})", resource.logical_name(), resource.resource_type());
        let name = resource.logical_name().to_string();
        let entry = self.resources.entry(name).or_insert(resource);
        Ok(entry)
    }

    /// Registers a parameter under its logical name.
    ///
    /// # Errors
    /// * `Error::InvalidName`, `Error::DuplicateName`, `Error::LimitExceeded`
    /// * `Error::InvalidParameter` if the declaration is inconsistent
    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<&Parameter> {
        check_insert("parameter", parameter.logical_name(), &self.parameters, MAX_PARAMETERS)?;
        parameter.validate()?;
        debug!("Adding parameter {} ({})", parameter.logical_name(), parameter.param_type());
        let name = parameter.logical_name().to_string();
        Ok(self.parameters.entry(name).or_insert(parameter))
    }

    /// Registers an output under its logical name.
    ///
    /// # Errors
    /// * `Error::InvalidName`, `Error::DuplicateName`, `Error::LimitExceeded`
    pub fn add_output(&mut self, output: Output) -> Result<&Output> {
        check_insert("output", output.logical_name(), &self.outputs, MAX_OUTPUTS)?;
        debug!("Adding output {}", output.logical_name());
        let name = output.logical_name().to_string();
        Ok(self.outputs.entry(name).or_insert(output))
    }

    /// Registers a `FindInMap` table.
    ///
    /// # Errors
    /// * `Error::InvalidName`, `Error::DuplicateName`, `Error::LimitExceeded`
    pub fn add_mapping<S: Into<String>>(&mut self, name: S, mapping: Mapping) -> Result<&Mapping> {
        let name = name.into();
        check_insert("mapping", &name, &self.mappings, MAX_MAPPINGS)?;
        debug!("Adding mapping {name}");
        Ok(self.mappings.entry(name).or_insert(mapping))
    }

    pub fn resources(&self) -> &IndexMap<String, Resource> {
        &self.resources
    }

    pub fn parameters(&self) -> &IndexMap<String, Parameter> {
        &self.parameters
    }

    pub fn outputs(&self) -> &IndexMap<String, Output> {
        &self.outputs
    }

    pub fn mappings(&self) -> &IndexMap<String, Mapping> {
        &self.mappings
    }

    /// Mutable access to a registered resource; its logical name stays fixed.
    pub fn resource_mut(&mut self, name: &str) -> Option<&mut Resource> {
        self.resources.get_mut(name)
    }

    /// References whose target is not declared with the kind they need.
    ///
    /// A `Ref` may name a resource, a parameter or a pseudo parameter.
    /// `GetAtt`, `DependsOn` and `${Name.Attribute}` must name a resource,
    /// and `FindInMap` must name a mapping.
    ///
    /// Rendering never calls this: dangling references are carried into the
    /// output untouched and left for the platform to reject.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let is_declared = |kind: ReferenceKind, target: &str| match kind {
            ReferenceKind::Any => {
                self.resources.contains_key(target)
                    || self.parameters.contains_key(target)
                    || Pseudo::from_name(target).is_some()
            }
            ReferenceKind::Resource => self.resources.contains_key(target),
            ReferenceKind::Mapping => self.mappings.contains_key(target),
        };

        let mut dangling = Vec::new();
        let mut check = |from: &str, targets: Vec<(ReferenceKind, String)>| {
            for (kind, target) in targets {
                if !is_declared(kind, &target) {
                    dangling.push(DanglingReference { from: from.to_string(), target, kind });
                }
            }
        };

        for (name, resource) in &self.resources {
            let mut targets = Vec::new();
            resource.collect_references(&mut targets);
            check(name, targets);
        }
        for (name, output) in &self.outputs {
            let mut targets = Vec::new();
            output.collect_references(&mut targets);
            check(name, targets);
        }
        dangling
    }

    /// Lowers the template into the document both renderers serialize.
    ///
    /// # Errors
    /// * `Error::UnsupportedValue` for the first value that cannot be represented
    pub fn to_document(&self) -> Result<Json> {
        let mut doc = Map::new();
        doc.insert("AWSTemplateFormatVersion".to_string(), Json::String(FORMAT_VERSION.to_string()));
        if let Some(description) = &self.description {
            doc.insert("Description".to_string(), Json::String(description.clone()));
        }

        let mut parameters = Map::new();
        for (name, parameter) in &self.parameters {
            parameters.insert(name.clone(), parameter.to_json()?);
        }
        doc.insert("Parameters".to_string(), Json::Object(parameters));

        if !self.mappings.is_empty() {
            let mut mappings = Map::new();
            for (name, mapping) in &self.mappings {
                let mut table = Map::new();
                for (top_key, entries) in mapping {
                    let path = format!("Mappings.{name}.{top_key}");
                    table.insert(top_key.clone(), Json::Object(record_to_json(entries, &path)?));
                }
                mappings.insert(name.clone(), Json::Object(table));
            }
            doc.insert("Mappings".to_string(), Json::Object(mappings));
        }

        let mut resources = Map::new();
        for (name, resource) in &self.resources {
            resources.insert(name.clone(), resource.to_json()?);
        }
        doc.insert("Resources".to_string(), Json::Object(resources));

        let mut outputs = Map::new();
        for (name, output) in &self.outputs {
            outputs.insert(name.clone(), output.to_json()?);
        }
        doc.insert("Outputs".to_string(), Json::Object(outputs));

        Ok(Json::Object(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intrinsic::Intrinsic;
    use crate::schema::ResourceType;

    #[test]
    fn test_logical_name_rules() {
        let mut template = Template::new();
        for bad in ["", "my-vpc", "my vpc", "Vpc_1"] {
            let err = template.add_resource(Resource::new(bad, ResourceType::Vpc)).unwrap_err();
            assert!(matches!(err, Error::InvalidName { category: "resource", .. }));
        }
        assert!(template.resources().is_empty());
    }

    #[test]
    fn test_categories_are_separate_namespaces() {
        let mut template = Template::new();
        template.add_resource(Resource::new("Web", ResourceType::Instance)).unwrap();
        template.add_output(Output::new("Web").value(Value::reference("Web"))).unwrap();
        assert_eq!(template.resources().len(), 1);
        assert_eq!(template.outputs().len(), 1);
    }

    #[test]
    fn test_resource_limit() {
        let mut template = Template::new();
        for i in 0..MAX_RESOURCES {
            template.add_resource(Resource::new(format!("Bucket{i}"), "AWS::S3::Bucket")).unwrap();
        }
        let err = template.add_resource(Resource::new("OneTooMany", "AWS::S3::Bucket")).unwrap_err();
        assert!(matches!(err, Error::LimitExceeded { limit: MAX_RESOURCES, .. }));
    }

    #[test]
    fn test_pseudo_parameters_and_parameters_are_not_dangling() {
        let mut template = Template::new();
        template
            .add_parameter(Parameter::new("KeyName", crate::parameter::KEY_PAIR_NAME))
            .unwrap();
        template
            .add_resource(
                Resource::new("Web", ResourceType::Instance)
                    .property("KeyName", Value::reference("KeyName"))
                    .property("AvailabilityZone", Value::from(Pseudo::Region))
                    .property("SubnetId", Value::reference("Missing")),
            )
            .unwrap();

        assert_eq!(
            template.dangling_references(),
            vec![DanglingReference {
                from: "Web".to_string(),
                target: "Missing".to_string(),
                kind: ReferenceKind::Any,
            }]
        );
    }

    #[test]
    fn test_get_att_and_depends_on_must_name_resources() {
        let mut template = Template::new();
        template.add_parameter(Parameter::new("Env", crate::parameter::STRING)).unwrap();
        template
            .add_resource(
                Resource::new("Web", ResourceType::Instance)
                    .property("UserData", Intrinsic::get_att("Env", "Value"))
                    .property("ImageId", Value::reference("Env"))
                    .depends_on("Env"),
            )
            .unwrap();

        let targets: Vec<(ReferenceKind, String)> = template
            .dangling_references()
            .into_iter()
            .map(|d| (d.kind, d.target))
            .collect();
        assert_eq!(
            targets,
            vec![
                (ReferenceKind::Resource, "Env".to_string()),
                (ReferenceKind::Resource, "Env".to_string()),
            ]
        );
    }

    #[test]
    fn test_find_in_map_must_name_a_mapping() {
        let mut template = Template::new();
        let mut region_map = Mapping::new();
        region_map.insert("eu-west-3".to_string(), IndexMap::from([("Ami".to_string(), Value::from("ami-1"))]));
        template.add_mapping("RegionMap", region_map).unwrap();
        template
            .add_resource(
                Resource::new("Web", ResourceType::Instance)
                    .property("ImageId", Intrinsic::find_in_map("RegionMap", Pseudo::Region, "Ami"))
                    .property("KeyName", Intrinsic::find_in_map("KeyMap", Pseudo::Region, "Key")),
            )
            .unwrap();

        let dangling = template.dangling_references();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].target, "KeyMap");
        assert_eq!(dangling[0].kind, ReferenceKind::Mapping);
    }
}
