//! Template outputs and cross-stack exports.

use crate::error::Result;
use crate::value::{ReferenceKind, Value};
use serde_json::{Map, Value as Json};

/// Export of an output under a name other stacks can import.
///
/// The name is any value: a hardcoded literal, or an `Fn::Sub` interpolation
/// over the stack name.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    name: Value,
}

impl Export {
    pub fn new<V: Into<Value>>(name: V) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &Value {
        &self.name
    }
}

/// A declared output.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    logical_name: String,
    value: Option<Value>,
    description: Option<String>,
    export: Option<Export>,
}

impl Output {
    pub fn new<N: Into<String>>(logical_name: N) -> Self {
        Self {
            logical_name: logical_name.into(),
            value: None,
            description: None,
            export: None,
        }
    }

    pub fn value<V: Into<Value>>(mut self, value: V) -> Self {
        self.set_value(value);
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn export(mut self, export: Export) -> Self {
        self.set_export(export);
        self
    }

    /// Assigns the value after construction.
    pub fn set_value<V: Into<Value>>(&mut self, value: V) -> &mut Self {
        self.value = Some(value.into());
        self
    }

    /// Assigns the export after construction.
    pub fn set_export(&mut self, export: Export) -> &mut Self {
        self.export = Some(export);
        self
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    pub fn get_value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn get_export(&self) -> Option<&Export> {
        self.export.as_ref()
    }

    /// Lowers the output into its `Outputs` entry.
    ///
    /// An output without a value renders an empty string; the platform
    /// rejects it, the renderer does not.
    pub fn to_json(&self) -> Result<Json> {
        let path = format!("Outputs.{}", self.logical_name);
        let mut obj = Map::new();
        if let Some(description) = &self.description {
            obj.insert("Description".to_string(), Json::String(description.clone()));
        }
        let value = match &self.value {
            Some(value) => value.to_json(&format!("{path}.Value"))?,
            None => Json::String(String::new()),
        };
        obj.insert("Value".to_string(), value);
        if let Some(export) = &self.export {
            let mut export_obj = Map::new();
            export_obj.insert("Name".to_string(), export.name.to_json(&format!("{path}.Export.Name"))?);
            obj.insert("Export".to_string(), Json::Object(export_obj));
        }
        Ok(Json::Object(obj))
    }

    pub(crate) fn collect_references(&self, out: &mut Vec<(ReferenceKind, String)>) {
        if let Some(value) = &self.value {
            value.collect_references(out);
        }
        if let Some(export) = &self.export {
            export.name.collect_references(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intrinsic::{Pseudo, Sub};
    use serde_json::json;

    #[test]
    fn test_export_accepts_interpolated_and_literal_names() {
        let mut output = Output::new("outputSubnet");
        output.set_value(Value::reference("TestSubnet"));
        output.set_export(Export::new(
            Sub::builder().pseudo(Pseudo::StackName).literal("-TestSubnet").build(),
        ));
        assert_eq!(
            output.to_json().unwrap(),
            json!({
                "Value": {"Ref": "TestSubnet"},
                "Export": {"Name": {"Fn::Sub": "${AWS::StackName}-TestSubnet"}}
            })
        );

        let literal = Output::new("VpcId")
            .value(Value::reference("VPC"))
            .export(Export::new("network-VpcId"));
        assert_eq!(literal.to_json().unwrap()["Export"], json!({"Name": "network-VpcId"}));
    }
}
