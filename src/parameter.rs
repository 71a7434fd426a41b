//! Template parameters: values supplied when the stack is created.

use crate::error::{Error, Result};
use crate::value::Value;
use serde_json::{Map, Value as Json};

pub const STRING: &str = "String";
pub const NUMBER: &str = "Number";
pub const NUMBER_LIST: &str = "List<Number>";
pub const COMMA_DELIMITED_LIST: &str = "CommaDelimitedList";
pub const KEY_PAIR_NAME: &str = "AWS::EC2::KeyPair::KeyName";

/// A declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    logical_name: String,
    param_type: String,
    default: Option<Value>,
    description: Option<String>,
    allowed_values: Vec<Value>,
    allowed_pattern: Option<String>,
    constraint_description: Option<String>,
    min_length: Option<u32>,
    max_length: Option<u32>,
    min_value: Option<f64>,
    max_value: Option<f64>,
    no_echo: bool,
}

impl Parameter {
    /// Declares a parameter of the given platform type (`String`, `Number`,
    /// `AWS::EC2::KeyPair::KeyName`, ...).
    pub fn new<N: Into<String>, T: Into<String>>(logical_name: N, param_type: T) -> Self {
        Self {
            logical_name: logical_name.into(),
            param_type: param_type.into(),
            default: None,
            description: None,
            allowed_values: Vec::new(),
            allowed_pattern: None,
            constraint_description: None,
            min_length: None,
            max_length: None,
            min_value: None,
            max_value: None,
            no_echo: false,
        }
    }

    pub fn default_value<V: Into<Value>>(mut self, value: V) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn allowed_values<V: Into<Value>, I: IntoIterator<Item = V>>(mut self, values: I) -> Self {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn allowed_pattern<S: Into<String>>(mut self, pattern: S) -> Self {
        self.allowed_pattern = Some(pattern.into());
        self
    }

    pub fn constraint_description<S: Into<String>>(mut self, description: S) -> Self {
        self.constraint_description = Some(description.into());
        self
    }

    pub fn length(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    pub fn no_echo(mut self, no_echo: bool) -> Self {
        self.no_echo = no_echo;
        self
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    pub fn param_type(&self) -> &str {
        &self.param_type
    }

    /// Checks the declaration against its type.
    ///
    /// # Errors
    /// * `Error::InvalidParameter` when a `Number` default is not numeric,
    ///   when a `String` default is not a string, or when length bounds are
    ///   set on a non-string parameter
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidParameter {
            name: self.logical_name.clone(),
            reason: reason.to_string(),
        };

        if let Some(default) = &self.default {
            match (self.param_type.as_str(), default) {
                (NUMBER, Value::Integer(_) | Value::Float(_)) => {}
                (NUMBER, Value::String(s)) if s.parse::<f64>().is_ok() => {}
                (NUMBER, _) => return Err(invalid("default of a Number parameter must be numeric")),
                (STRING, Value::String(_)) => {}
                (STRING, _) => return Err(invalid("default of a String parameter must be a string")),
                _ => {}
            }
        }

        let is_string_like = self.param_type != NUMBER && self.param_type != NUMBER_LIST;
        if !is_string_like && (self.min_length.is_some() || self.max_length.is_some()) {
            return Err(invalid("length bounds only apply to string parameters"));
        }
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(invalid("MinLength is greater than MaxLength"));
            }
        }
        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            if min > max {
                return Err(invalid("MinValue is greater than MaxValue"));
            }
        }
        Ok(())
    }

    /// Lowers the parameter into its `Parameters` entry.
    pub fn to_json(&self) -> Result<Json> {
        let path = format!("Parameters.{}", self.logical_name);
        let mut obj = Map::new();
        obj.insert("Type".to_string(), Json::String(self.param_type.clone()));
        if let Some(default) = &self.default {
            obj.insert("Default".to_string(), default.to_json(&format!("{path}.Default"))?);
        }
        if let Some(description) = &self.description {
            obj.insert("Description".to_string(), Json::String(description.clone()));
        }
        if !self.allowed_values.is_empty() {
            obj.insert(
                "AllowedValues".to_string(),
                Value::List(self.allowed_values.clone()).to_json(&format!("{path}.AllowedValues"))?,
            );
        }
        if let Some(pattern) = &self.allowed_pattern {
            obj.insert("AllowedPattern".to_string(), Json::String(pattern.clone()));
        }
        if let Some(min) = self.min_length {
            obj.insert("MinLength".to_string(), Json::from(min));
        }
        if let Some(max) = self.max_length {
            obj.insert("MaxLength".to_string(), Json::from(max));
        }
        if let Some(min) = self.min_value {
            obj.insert("MinValue".to_string(), Value::Float(min).to_json(&format!("{path}.MinValue"))?);
        }
        if let Some(max) = self.max_value {
            obj.insert("MaxValue".to_string(), Value::Float(max).to_json(&format!("{path}.MaxValue"))?);
        }
        if self.no_echo {
            obj.insert("NoEcho".to_string(), Json::Bool(true));
        }
        if let Some(description) = &self.constraint_description {
            obj.insert("ConstraintDescription".to_string(), Json::String(description.clone()));
        }
        Ok(Json::Object(obj))
    }
}
