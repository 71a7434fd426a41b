//! Resource records: a logical name, a type tag and ordered properties.

use crate::error::{Error, Result};
use crate::schema::ResourceType;
use crate::value::{record_to_json, ReferenceKind, Value};
use indexmap::IndexMap;
use serde_json::{Map, Value as Json};
use std::fmt;

/// What the platform does with a resource when it leaves the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionPolicy {
    Delete,
    Retain,
    Snapshot,
}

impl fmt::Display for DeletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletionPolicy::Delete => write!(f, "Delete"),
            DeletionPolicy::Retain => write!(f, "Retain"),
            DeletionPolicy::Snapshot => write!(f, "Snapshot"),
        }
    }
}

impl std::str::FromStr for DeletionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Delete" => Ok(DeletionPolicy::Delete),
            "Retain" => Ok(DeletionPolicy::Retain),
            "Snapshot" => Ok(DeletionPolicy::Snapshot),
            other => Err(Error::ConfigError(format!("unknown deletion policy '{other}'"))),
        }
    }
}

/// A resource under construction.
///
/// Resources stay mutable builders until they are added to a template:
/// properties can be passed while chaining or assigned afterwards with
/// [`Resource::set`].
///
/// ```ignore
/// let vpc = Resource::new("VPC", ResourceType::Vpc)
///     .property("CidrBlock", "10.0.0.0/16")
///     .property("Tags", Tags::new().tag("Name", "main"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    logical_name: String,
    resource_type: ResourceType,
    properties: IndexMap<String, Value>,
    depends_on: Vec<String>,
    deletion_policy: Option<DeletionPolicy>,
}

impl Resource {
    pub fn new<N: Into<String>, T: Into<ResourceType>>(logical_name: N, resource_type: T) -> Self {
        Self {
            logical_name: logical_name.into(),
            resource_type: resource_type.into(),
            properties: IndexMap::new(),
            depends_on: Vec::new(),
            deletion_policy: None,
        }
    }

    /// Sets a property while chaining.
    pub fn property<K: Into<String>, V: Into<Value>>(mut self, name: K, value: V) -> Self {
        self.set(name, value);
        self
    }

    /// Assigns a property after construction; replaces any previous value
    /// while keeping its original position.
    pub fn set<K: Into<String>, V: Into<Value>>(&mut self, name: K, value: V) -> &mut Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Adds an explicit ordering constraint on another resource.
    pub fn depends_on<S: Into<String>>(mut self, logical_name: S) -> Self {
        self.depends_on.push(logical_name.into());
        self
    }

    pub fn deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    /// A reference to this resource, for use as another property's value.
    pub fn reference(&self) -> Value {
        Value::reference(self.logical_name.as_str())
    }

    /// Checks every property name against the type's schema.
    ///
    /// # Errors
    /// * `Error::UnknownProperty` on the first property the type does not admit
    pub fn check_properties(&self) -> Result<()> {
        match self.properties.keys().find(|name| !self.resource_type.admits(name)) {
            Some(property) => Err(Error::UnknownProperty {
                name: self.logical_name.clone(),
                resource_type: self.resource_type.to_string(),
                property: property.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Lowers the resource into its `Resources` entry.
    pub fn to_json(&self) -> Result<Json> {
        let path = format!("Resources.{}", self.logical_name);
        let mut obj = Map::new();
        obj.insert("Type".to_string(), Json::String(self.resource_type.to_string()));
        obj.insert(
            "Properties".to_string(),
            Json::Object(record_to_json(&self.properties, &format!("{path}.Properties"))?),
        );
        match self.depends_on.as_slice() {
            [] => {}
            [single] => {
                obj.insert("DependsOn".to_string(), Json::String(single.clone()));
            }
            many => {
                obj.insert(
                    "DependsOn".to_string(),
                    Json::Array(many.iter().cloned().map(Json::String).collect()),
                );
            }
        }
        if let Some(policy) = self.deletion_policy {
            obj.insert("DeletionPolicy".to_string(), Json::String(policy.to_string()));
        }
        Ok(Json::Object(obj))
    }

    pub(crate) fn collect_references(&self, out: &mut Vec<(ReferenceKind, String)>) {
        self.properties.values().for_each(|v| v.collect_references(out));
        out.extend(self.depends_on.iter().map(|target| (ReferenceKind::Resource, target.clone())));
    }
}

/// Builder for the `[{Key, Value}, ...]` tag list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tags {
    tags: Vec<(String, Value)>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }
}

impl From<Tags> for Value {
    fn from(tags: Tags) -> Self {
        Value::List(
            tags.tags
                .into_iter()
                .map(|(key, value)| Value::record([("Key", Value::String(key)), ("Value", value)]))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_construction_assignment_keeps_position() {
        let mut subnet = Resource::new("TestSubnet", ResourceType::Subnet)
            .property("AvailabilityZone", "eu-west-3c")
            .property("CidrBlock", "10.0.0.0/24");
        subnet.set("AvailabilityZone", "eu-west-3a").set("VpcId", Value::reference("VPC"));

        let keys: Vec<&str> = subnet.properties().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["AvailabilityZone", "CidrBlock", "VpcId"]);
        assert_eq!(subnet.get("AvailabilityZone"), Some(&Value::from("eu-west-3a")));
    }

    #[test]
    fn test_depends_on_renders_string_then_list() {
        let one = Resource::new("Route", ResourceType::Route).depends_on("Attach");
        assert_eq!(one.to_json().unwrap()["DependsOn"], json!("Attach"));

        let two = one.depends_on("Gateway");
        assert_eq!(two.to_json().unwrap()["DependsOn"], json!(["Attach", "Gateway"]));
    }

    #[test]
    fn test_tags_render_as_key_value_records() {
        let vpc = Resource::new("VPC", ResourceType::Vpc)
            .property("Tags", Tags::new().tag("Name", "main").tag("Zone & Block", "eu-west-3c"));
        assert_eq!(
            vpc.to_json().unwrap()["Properties"]["Tags"],
            json!([
                {"Key": "Name", "Value": "main"},
                {"Key": "Zone & Block", "Value": "eu-west-3c"}
            ])
        );
    }

    #[test]
    fn test_check_properties_names_the_offender() {
        let vpc = Resource::new("VPC", ResourceType::Vpc).property("SubnetId", "x");
        match vpc.check_properties() {
            Err(Error::UnknownProperty { property, resource_type, .. }) => {
                assert_eq!(property, "SubnetId");
                assert_eq!(resource_type, "AWS::EC2::VPC");
            }
            other => panic!("Expected UnknownProperty, got {other:?}"),
        }
    }

    #[test]
    fn test_deletion_policy_parses() {
        assert_eq!("Retain".parse::<DeletionPolicy>().unwrap(), DeletionPolicy::Retain);
        assert!("Keep".parse::<DeletionPolicy>().is_err());
    }
}
