//! Intrinsic functions and pseudo parameters.
//! Each function lowers to the platform's single-key `Fn::*` object form.

use crate::error::{Error, Result};
use crate::value::{record_to_json, ReferenceKind, Value};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value as Json};
use std::sync::OnceLock;

/// Parameters predefined by the platform, referenced as `AWS::<Name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    AccountId,
    NotificationArns,
    NoValue,
    Partition,
    Region,
    StackId,
    StackName,
    UrlSuffix,
}

impl Pseudo {
    const ALL: [Pseudo; 8] = [
        Pseudo::AccountId,
        Pseudo::NotificationArns,
        Pseudo::NoValue,
        Pseudo::Partition,
        Pseudo::Region,
        Pseudo::StackId,
        Pseudo::StackName,
        Pseudo::UrlSuffix,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Pseudo::AccountId => "AWS::AccountId",
            Pseudo::NotificationArns => "AWS::NotificationARNs",
            Pseudo::NoValue => "AWS::NoValue",
            Pseudo::Partition => "AWS::Partition",
            Pseudo::Region => "AWS::Region",
            Pseudo::StackId => "AWS::StackId",
            Pseudo::StackName => "AWS::StackName",
            Pseudo::UrlSuffix => "AWS::URLSuffix",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// An intrinsic function expression, resolved by the platform at deploy time.
#[derive(Debug, Clone, PartialEq)]
pub enum Intrinsic {
    GetAtt { resource: String, attribute: String },
    Sub(Sub),
    Join { delimiter: String, values: Vec<Value> },
    Select { index: u32, list: Box<Value> },
    Split { delimiter: String, source: Box<Value> },
    /// Wraps bootstrap scripts and other opaque payloads.
    Base64(Box<Value>),
    /// Availability zones of a region; an empty string means the stack's region.
    GetAZs(Box<Value>),
    ImportValue(Box<Value>),
    FindInMap {
        map: String,
        top_key: Box<Value>,
        second_key: Box<Value>,
    },
}

impl Intrinsic {
    pub fn get_att<R: Into<String>, A: Into<String>>(resource: R, attribute: A) -> Self {
        Intrinsic::GetAtt { resource: resource.into(), attribute: attribute.into() }
    }

    pub fn join<D: Into<String>>(delimiter: D, values: Vec<Value>) -> Self {
        Intrinsic::Join { delimiter: delimiter.into(), values }
    }

    pub fn select<V: Into<Value>>(index: u32, list: V) -> Self {
        Intrinsic::Select { index, list: Box::new(list.into()) }
    }

    pub fn split<D: Into<String>, V: Into<Value>>(delimiter: D, source: V) -> Self {
        Intrinsic::Split { delimiter: delimiter.into(), source: Box::new(source.into()) }
    }

    pub fn base64<V: Into<Value>>(payload: V) -> Self {
        Intrinsic::Base64(Box::new(payload.into()))
    }

    /// Availability zones of the stack's own region.
    pub fn get_azs() -> Self {
        Intrinsic::GetAZs(Box::new(Value::String(String::new())))
    }

    pub fn import_value<V: Into<Value>>(export_name: V) -> Self {
        Intrinsic::ImportValue(Box::new(export_name.into()))
    }

    pub fn find_in_map<M, T, S>(map: M, top_key: T, second_key: S) -> Self
    where
        M: Into<String>,
        T: Into<Value>,
        S: Into<Value>,
    {
        Intrinsic::FindInMap {
            map: map.into(),
            top_key: Box::new(top_key.into()),
            second_key: Box::new(second_key.into()),
        }
    }

    /// Full function name as it appears in long-form output.
    pub fn function_name(&self) -> &'static str {
        match self {
            Intrinsic::GetAtt { .. } => "Fn::GetAtt",
            Intrinsic::Sub(_) => "Fn::Sub",
            Intrinsic::Join { .. } => "Fn::Join",
            Intrinsic::Select { .. } => "Fn::Select",
            Intrinsic::Split { .. } => "Fn::Split",
            Intrinsic::Base64(_) => "Fn::Base64",
            Intrinsic::GetAZs(_) => "Fn::GetAZs",
            Intrinsic::ImportValue(_) => "Fn::ImportValue",
            Intrinsic::FindInMap { .. } => "Fn::FindInMap",
        }
    }

    /// Lowers the function into its `{"Fn::Name": arguments}` object.
    pub fn to_json(&self, path: &str) -> Result<Json> {
        let path = format!("{path}.{}", self.function_name());
        let arguments = match self {
            Intrinsic::GetAtt { resource, attribute } => {
                Json::Array(vec![Json::String(resource.clone()), Json::String(attribute.clone())])
            }
            Intrinsic::Sub(sub) => sub.to_json(&path)?,
            Intrinsic::Join { delimiter, values } => Json::Array(vec![
                Json::String(delimiter.clone()),
                Value::List(values.clone()).to_json(&path)?,
            ]),
            Intrinsic::Select { index, list } => Json::Array(vec![
                Value::from(*index).to_json(&path)?,
                list.to_json(&path)?,
            ]),
            Intrinsic::Split { delimiter, source } => {
                Json::Array(vec![Json::String(delimiter.clone()), source.to_json(&path)?])
            }
            Intrinsic::Base64(payload) => match payload.as_ref() {
                Value::Bytes(bytes) => match std::str::from_utf8(bytes) {
                    Ok(text) => Json::String(text.to_string()),
                    Err(e) => {
                        return Err(Error::UnsupportedValue {
                            path,
                            reason: format!("payload is not valid UTF-8 ({e})"),
                        })
                    }
                },
                other => other.to_json(&path)?,
            },
            Intrinsic::GetAZs(region) => region.to_json(&path)?,
            Intrinsic::ImportValue(name) => name.to_json(&path)?,
            Intrinsic::FindInMap { map, top_key, second_key } => Json::Array(vec![
                Json::String(map.clone()),
                top_key.to_json(&path)?,
                second_key.to_json(&path)?,
            ]),
        };

        let mut obj = Map::new();
        obj.insert(self.function_name().to_string(), arguments);
        Ok(Json::Object(obj))
    }

    /// Parses the arguments of an `Fn::*` object read from a stack file.
    pub fn from_json(name: &str, arguments: &Json, path: &str) -> Result<Self> {
        let path = format!("{path}.{name}");
        let malformed = |expected: &str| Error::UnsupportedValue {
            path: path.clone(),
            reason: format!("{name} expects {expected}"),
        };

        match name {
            "Fn::GetAtt" => match arguments {
                Json::String(dotted) => dotted
                    .split_once('.')
                    .map(|(resource, attribute)| Intrinsic::get_att(resource, attribute))
                    .ok_or_else(|| malformed("'Resource.Attribute'")),
                Json::Array(items) => match items.as_slice() {
                    [Json::String(resource), Json::String(attribute)] => {
                        Ok(Intrinsic::get_att(resource.as_str(), attribute.as_str()))
                    }
                    _ => Err(malformed("[resource, attribute]")),
                },
                _ => Err(malformed("[resource, attribute]")),
            },
            "Fn::Sub" => match arguments {
                Json::String(template) => Ok(Intrinsic::Sub(Sub::new(template.as_str()))),
                Json::Array(items) => match items.as_slice() {
                    [Json::String(template), Json::Object(vars)] => {
                        let mut sub = Sub::new(template.as_str());
                        for (key, value) in vars {
                            sub = sub.variable(key.as_str(), Value::from_json(value, &format!("{path}.{key}"))?);
                        }
                        Ok(Intrinsic::Sub(sub))
                    }
                    _ => Err(malformed("a string or [string, variables]")),
                },
                _ => Err(malformed("a string or [string, variables]")),
            },
            "Fn::Join" => match arguments.as_array().map(Vec::as_slice) {
                Some([Json::String(delimiter), Json::Array(values)]) => Ok(Intrinsic::join(
                    delimiter.as_str(),
                    values
                        .iter()
                        .enumerate()
                        .map(|(i, v)| Value::from_json(v, &format!("{path}[{i}]")))
                        .collect::<Result<Vec<_>>>()?,
                )),
                _ => Err(malformed("[delimiter, [values]]")),
            },
            "Fn::Select" => match arguments.as_array().map(Vec::as_slice) {
                Some([index, list]) => {
                    let index = match index {
                        Json::Number(n) => n.as_u64(),
                        Json::String(s) => s.parse::<u64>().ok(),
                        _ => None,
                    }
                    .and_then(|i| u32::try_from(i).ok())
                    .ok_or_else(|| malformed("a non-negative index"))?;
                    Ok(Intrinsic::select(index, Value::from_json(list, &path)?))
                }
                _ => Err(malformed("[index, list]")),
            },
            "Fn::Split" => match arguments.as_array().map(Vec::as_slice) {
                Some([Json::String(delimiter), source]) => {
                    Ok(Intrinsic::split(delimiter.as_str(), Value::from_json(source, &path)?))
                }
                _ => Err(malformed("[delimiter, source]")),
            },
            "Fn::Base64" => Ok(Intrinsic::base64(Value::from_json(arguments, &path)?)),
            "Fn::GetAZs" => Ok(Intrinsic::GetAZs(Box::new(Value::from_json(arguments, &path)?))),
            "Fn::ImportValue" => Ok(Intrinsic::import_value(Value::from_json(arguments, &path)?)),
            "Fn::FindInMap" => match arguments.as_array().map(Vec::as_slice) {
                Some([Json::String(map), top_key, second_key]) => Ok(Intrinsic::find_in_map(
                    map.as_str(),
                    Value::from_json(top_key, &path)?,
                    Value::from_json(second_key, &path)?,
                )),
                _ => Err(malformed("[map, top key, second key]")),
            },
            _ => Err(Error::UnsupportedValue {
                path: path.clone(),
                reason: format!("unsupported intrinsic function {name}"),
            }),
        }
    }

    /// Collects the logical names this function points at.
    pub fn collect_references(&self, out: &mut Vec<(ReferenceKind, String)>) {
        match self {
            Intrinsic::GetAtt { resource, .. } => out.push((ReferenceKind::Resource, resource.clone())),
            Intrinsic::Sub(sub) => sub.collect_references(out),
            Intrinsic::Join { values, .. } => values.iter().for_each(|v| v.collect_references(out)),
            Intrinsic::Select { list, .. } => list.collect_references(out),
            Intrinsic::Split { source, .. } => source.collect_references(out),
            Intrinsic::Base64(v) | Intrinsic::GetAZs(v) | Intrinsic::ImportValue(v) => {
                v.collect_references(out)
            }
            Intrinsic::FindInMap { map, top_key, second_key } => {
                out.push((ReferenceKind::Mapping, map.clone()));
                top_key.collect_references(out);
                second_key.collect_references(out);
            }
        }
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([^!}][^}]*)\}").expect("placeholder pattern is valid"))
}

/// String interpolation (`Fn::Sub`).
///
/// Placeholders `${Name}`, `${Name.Attribute}` and `${AWS::StackName}` are
/// substituted by the platform; `${!Literal}` is emitted verbatim.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sub {
    template: String,
    variables: IndexMap<String, Value>,
}

impl Sub {
    /// Creates an interpolation from a raw template string.
    pub fn new<S: Into<String>>(template: S) -> Self {
        Self { template: template.into(), variables: IndexMap::new() }
    }

    pub fn builder() -> SubBuilder {
        SubBuilder::default()
    }

    /// Adds a local variable, rendered as the `[template, {variables}]` form.
    pub fn variable<K: Into<String>, V: Into<Value>>(mut self, name: K, value: V) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names in order of appearance, escaped ones excluded.
    pub fn placeholders(&self) -> Vec<&str> {
        placeholder_regex()
            .captures_iter(&self.template)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }

    fn to_json(&self, path: &str) -> Result<Json> {
        if self.variables.is_empty() {
            return Ok(Json::String(self.template.clone()));
        }
        Ok(Json::Array(vec![
            Json::String(self.template.clone()),
            Json::Object(record_to_json(&self.variables, path)?),
        ]))
    }

    fn collect_references(&self, out: &mut Vec<(ReferenceKind, String)>) {
        for placeholder in self.placeholders() {
            if self.variables.contains_key(placeholder) {
                continue;
            }
            match placeholder.split_once('.') {
                Some((name, _)) => out.push((ReferenceKind::Resource, name.to_string())),
                None => out.push((ReferenceKind::Any, placeholder.to_string())),
            }
        }
        self.variables.values().for_each(|v| v.collect_references(out));
    }
}

/// Assembles an interpolation string segment by segment.
#[derive(Debug, Default)]
pub struct SubBuilder {
    template: String,
}

impl SubBuilder {
    /// Appends literal text; `${` is escaped so the platform keeps it verbatim.
    pub fn literal(mut self, text: &str) -> Self {
        self.template.push_str(&text.replace("${", "${!"));
        self
    }

    pub fn pseudo(mut self, pseudo: Pseudo) -> Self {
        self.template.push_str(&format!("${{{}}}", pseudo.name()));
        self
    }

    pub fn reference(mut self, name: &str) -> Self {
        self.template.push_str(&format!("${{{name}}}"));
        self
    }

    pub fn attribute(mut self, name: &str, attribute: &str) -> Self {
        self.template.push_str(&format!("${{{name}.{attribute}}}"));
        self
    }

    pub fn build(self) -> Sub {
        Sub::new(self.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sub_builder_interpolates_textually() {
        let sub = Sub::builder().pseudo(Pseudo::StackName).literal("-TestSubnet").build();
        assert_eq!(sub.template(), "${AWS::StackName}-TestSubnet");
    }

    #[test]
    fn test_sub_builder_escapes_literal_placeholders() {
        let sub = Sub::builder().literal("echo ${HOME} ").reference("Web").build();
        assert_eq!(sub.template(), "echo ${!HOME} ${Web}");
        assert_eq!(sub.placeholders(), vec!["Web"]);
    }

    #[test]
    fn test_sub_references_skip_local_variables() {
        let sub = Sub::new("${Lb.DNSName}/${Path}/${AWS::Region}").variable("Path", "health");
        let mut refs = Vec::new();
        sub.collect_references(&mut refs);
        assert_eq!(
            refs,
            vec![
                (ReferenceKind::Resource, "Lb".to_string()),
                (ReferenceKind::Any, "AWS::Region".to_string()),
            ]
        );
    }

    #[test]
    fn test_get_att_accepts_dotted_and_list_forms() {
        let dotted = Intrinsic::from_json("Fn::GetAtt", &json!("Lb.DNSName"), "v").unwrap();
        let listed = Intrinsic::from_json("Fn::GetAtt", &json!(["Lb", "DNSName"]), "v").unwrap();
        assert_eq!(dotted, listed);
        assert_eq!(dotted.to_json("v").unwrap(), json!({"Fn::GetAtt": ["Lb", "DNSName"]}));
    }

    #[test]
    fn test_base64_accepts_utf8_bytes_only() {
        let ok = Intrinsic::base64(Value::Bytes(b"#!/bin/bash\n".to_vec()));
        assert_eq!(ok.to_json("v").unwrap(), json!({"Fn::Base64": "#!/bin/bash\n"}));

        let bad = Intrinsic::base64(Value::Bytes(vec![0xff, 0xfe]));
        assert!(matches!(bad.to_json("v"), Err(Error::UnsupportedValue { .. })));
    }

    #[test]
    fn test_unknown_function_is_unsupported() {
        assert!(Intrinsic::from_json("Fn::If", &json!(["C", "a", "b"]), "v").is_err());
    }

    #[test]
    fn test_pseudo_names_round_trip() {
        for pseudo in Pseudo::ALL {
            assert_eq!(Pseudo::from_name(pseudo.name()), Some(pseudo));
        }
        assert_eq!(Pseudo::from_name("AWS::Nope"), None);
    }
}
