use cfn_forge::{render, Format, Output, Resource, Template, Value};
use proptest::prelude::*;

fn logical_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9]{0,12}"
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z0-9./ -]{0,16}".prop_map(Value::String),
        any::<i32>().prop_map(Value::from),
        any::<bool>().prop_map(Value::Bool),
        logical_name().prop_map(Value::Ref),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::vec((logical_name(), inner), 0..4)
                .prop_map(|fields| Value::Record(fields.into_iter().collect())),
        ]
    })
}

fn arb_template() -> impl Strategy<Value = Template> {
    (
        prop::collection::vec((logical_name(), prop::collection::vec((logical_name(), arb_value()), 0..4)), 0..6),
        prop::collection::vec((logical_name(), arb_value()), 0..3),
    )
        .prop_map(|(resources, outputs)| {
            let mut template = Template::new();
            for (name, properties) in resources {
                let mut resource = Resource::new(name, "Custom::Generated");
                for (key, value) in properties {
                    resource.set(key, value);
                }
                // Generated names may collide; a failed add leaves the template as it was.
                let _ = template.add_resource(resource);
            }
            for (name, value) in outputs {
                let _ = template.add_output(Output::new(name).value(value));
            }
            template
        })
}

proptest! {
    #[test]
    fn rendering_twice_is_byte_identical(template in arb_template()) {
        for format in [Format::Json, Format::Yaml, Format::YamlShort] {
            prop_assert_eq!(render(&template, format).unwrap(), render(&template, format).unwrap());
        }
    }

    #[test]
    fn yaml_and_json_are_equivalent(template in arb_template()) {
        let json: serde_json::Value = serde_json::from_slice(&render(&template, Format::Json).unwrap()).unwrap();
        let yaml: serde_json::Value = serde_yaml::from_slice(&render(&template, Format::Yaml).unwrap()).unwrap();
        prop_assert_eq!(json, yaml);
    }

    #[test]
    fn rendered_resources_match_the_template(template in arb_template()) {
        let doc: serde_json::Value = serde_json::from_slice(&render(&template, Format::Json).unwrap()).unwrap();
        let rendered = doc["Resources"].as_object().unwrap();
        let names: Vec<&String> = rendered.keys().collect();
        let expected: Vec<&String> = template.resources().keys().collect();
        prop_assert_eq!(names, expected);
        for (name, resource) in template.resources() {
            prop_assert_eq!(&rendered[name.as_str()], &resource.to_json().unwrap());
        }
    }

    #[test]
    fn failed_duplicate_add_keeps_state(template in arb_template(), value in arb_value()) {
        if let Some(name) = template.resources().keys().next().cloned() {
            let mut mutated = template.clone();
            let result = mutated.add_resource(Resource::new(name, "Custom::Generated").property("Extra", value));
            prop_assert!(result.is_err());
            prop_assert_eq!(mutated, template);
        }
    }
}
