use cfn_forge::blueprint::{public_network, subnet_exercise};
use cfn_forge::error::Error;
use cfn_forge::renderer::{plan_outputs, write_rendered};
use cfn_forge::{render, render_to, Format, Intrinsic, Resource, ResourceType, Template, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

fn yaml_as_json(bytes: &[u8]) -> serde_json::Value {
    serde_yaml::from_slice(bytes).unwrap()
}

#[test_log::test]
fn test_yaml_and_json_decode_to_the_same_data() {
    for template in [subnet_exercise().unwrap(), public_network().unwrap()] {
        let json_doc: serde_json::Value =
            serde_json::from_slice(&render(&template, Format::Json).unwrap()).unwrap();
        let yaml_doc = yaml_as_json(&render(&template, Format::Yaml).unwrap());
        assert_eq!(json_doc, yaml_doc);
    }
}

#[test_log::test]
fn test_rendering_is_deterministic() {
    let template = public_network().unwrap();
    for format in [Format::Json, Format::Yaml, Format::YamlShort] {
        assert_eq!(render(&template, format).unwrap(), render(&template, format).unwrap());
    }
}

#[test]
fn test_insertion_order_is_kept_in_text() {
    let mut template = Template::new();
    for name in ["Zulu", "Alpha", "Mike"] {
        template.add_resource(Resource::new(name, "Custom::Marker")).unwrap();
    }
    let text = String::from_utf8(render(&template, Format::Json).unwrap()).unwrap();
    let zulu = text.find("\"Zulu\"").unwrap();
    let alpha = text.find("\"Alpha\"").unwrap();
    let mike = text.find("\"Mike\"").unwrap();
    assert!(zulu < alpha && alpha < mike);
}

#[test]
fn test_unsupported_value_aborts_render() {
    let mut template = Template::new();
    template
        .add_resource(
            Resource::new("Web", ResourceType::Instance).property("UserData", Value::Bytes(b"#!/bin/sh".to_vec())),
        )
        .unwrap();

    for format in [Format::Json, Format::Yaml] {
        match render(&template, format) {
            Err(Error::UnsupportedValue { path, .. }) => {
                assert_eq!(path, "Resources.Web.Properties.UserData")
            }
            other => panic!("Expected UnsupportedValue, got {other:?}"),
        }
    }
}

#[test]
fn test_non_finite_number_aborts_render() {
    let mut template = Template::new();
    template
        .add_resource(Resource::new("Thing", "Custom::Thing").property("Weight", f64::NAN))
        .unwrap();
    assert!(matches!(
        render(&template, Format::Json),
        Err(Error::UnsupportedValue { .. })
    ));
}

#[test]
fn test_base64_wraps_bootstrap_script() {
    let mut template = Template::new();
    template
        .add_resource(
            Resource::new("Web", ResourceType::Instance)
                .property("UserData", Intrinsic::base64(Value::Bytes(b"#!/bin/sh\necho hi\n".to_vec()))),
        )
        .unwrap();
    let doc: serde_json::Value =
        serde_json::from_slice(&render(&template, Format::Json).unwrap()).unwrap();
    assert_eq!(
        doc["Resources"]["Web"]["Properties"]["UserData"],
        json!({"Fn::Base64": "#!/bin/sh\necho hi\n"})
    );
}

#[test]
fn test_short_yaml_uses_tags() {
    let template = subnet_exercise().unwrap();
    let text = String::from_utf8(render(&template, Format::YamlShort).unwrap()).unwrap();
    assert!(text.contains("VpcId: !Ref VPC"), "{text}");
    assert!(text.contains("Value: !Ref TestSubnet"), "{text}");
    assert!(text.contains("Name: !Sub"), "{text}");
    assert!(!text.contains("Fn::Sub"), "{text}");
}

#[test]
fn test_render_to_writes_into_sink() {
    let template = subnet_exercise().unwrap();
    let mut sink = Vec::new();
    render_to(&template, Format::Json, &mut sink).unwrap();
    assert_eq!(sink, render(&template, Format::Json).unwrap());
    assert!(sink.ends_with(b"}\n"));
}

#[test]
fn test_render_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let template = subnet_exercise().unwrap();
    for format in [Format::Yaml, Format::Json] {
        let path = dir.path().join(format!("subnet-exercise.{}", format.extension()));
        let mut file = std::fs::File::create(&path).unwrap();
        render_to(&template, format, &mut file).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), render(&template, format).unwrap());
    }
}

#[test]
fn test_plan_outputs_dedups_and_names_targets() {
    let dir = tempfile::tempdir().unwrap();
    let targets = plan_outputs(
        dir.path(),
        "network",
        &[Format::Json, Format::YamlShort, Format::Json],
        false,
    )
    .unwrap();
    assert_eq!(
        targets,
        vec![
            (Format::Json, dir.path().join("network.json")),
            (Format::YamlShort, dir.path().join("network.yaml")),
        ]
    );
}

#[test]
fn test_plan_outputs_rejects_both_yaml_forms() {
    let dir = tempfile::tempdir().unwrap();
    let err = plan_outputs(dir.path(), "template", &[Format::Yaml, Format::YamlShort], true).unwrap_err();
    assert!(matches!(err, Error::ConfigError(_)));
}

#[test]
fn test_plan_outputs_refuses_to_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("template.json");
    std::fs::write(&existing, "previous").unwrap();

    let err = plan_outputs(dir.path(), "template", &[Format::Yaml, Format::Json], false).unwrap_err();
    assert!(matches!(err, Error::ConfigError(_)));
    assert!(!dir.path().join("template.yaml").exists());
    assert_eq!(std::fs::read_to_string(&existing).unwrap(), "previous");

    let targets = plan_outputs(dir.path(), "template", &[Format::Json], true).unwrap();
    assert_eq!(targets, vec![(Format::Json, existing)]);
}

#[test_log::test]
fn test_write_rendered_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let template = subnet_exercise().unwrap();
    let path = dir.path().join("out").join("template.json");
    write_rendered(&template, Format::Json, &path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), render(&template, Format::Json).unwrap());
}

#[test]
fn test_failed_render_keeps_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("template.json");
    std::fs::write(&path, "previous").unwrap();

    let mut template = Template::new();
    template
        .add_resource(Resource::new("Blob", "Custom::Blob").property("Data", Value::Bytes(vec![1, 2])))
        .unwrap();
    assert!(write_rendered(&template, Format::Json, &path).is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");
}
