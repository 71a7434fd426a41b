use cfn_forge::blueprint::{public_network, subnet_exercise, Blueprint};
use cfn_forge::{render, Format};
use pretty_assertions::assert_eq;
use serde_json::json;

fn render_json(template: &cfn_forge::Template) -> serde_json::Value {
    serde_json::from_slice(&render(template, Format::Json).unwrap()).unwrap()
}

#[test]
fn test_subnet_exercise_document() {
    let doc = render_json(&subnet_exercise().unwrap());

    assert_eq!(
        doc,
        json!({
            "AWSTemplateFormatVersion": "2010-09-09",
            "Parameters": {},
            "Resources": {
                "VPC": {
                    "Type": "AWS::EC2::VPC",
                    "Properties": {
                        "CidrBlock": "10.0.0.0/24",
                        "Tags": [{"Key": "Name", "Value": "Exercise VPC"}]
                    }
                },
                "TestSubnet": {
                    "Type": "AWS::EC2::Subnet",
                    "Properties": {
                        "AvailabilityZone": "eu-west-3c",
                        "CidrBlock": "10.0.0.0/24",
                        "VpcId": {"Ref": "VPC"},
                        "Tags": [
                            {"Key": "Name", "Value": "Exercise subnet"},
                            {"Key": "Zone & Block", "Value": "eu-west-3c (Paris) & 10.0.0.0/24"}
                        ]
                    }
                }
            },
            "Outputs": {
                "outputSubnet": {
                    "Value": {"Ref": "TestSubnet"},
                    "Export": {"Name": {"Fn::Sub": "${AWS::StackName}-TestSubnet"}}
                }
            }
        })
    );
}

#[test]
fn test_public_network_has_no_dangling_references() {
    let template = public_network().unwrap();
    assert!(template.dangling_references().is_empty());
}

#[test]
fn test_public_network_wiring() {
    let doc = render_json(&public_network().unwrap());
    let resources = &doc["Resources"];

    assert_eq!(resources["PublicRoute"]["DependsOn"], json!("GatewayAttachment"));
    assert_eq!(
        resources["PublicSubnetB"]["Properties"]["AvailabilityZone"],
        json!({"Fn::Select": ["1", {"Fn::GetAZs": ""}]})
    );
    assert_eq!(
        resources["InboundHttpAclEntry"]["Properties"]["PortRange"],
        json!({"From": "80", "To": "80"})
    );
    assert_eq!(resources["OutboundAclEntry"]["Properties"]["Protocol"], json!("-1"));
    assert_eq!(
        resources["WebServerA"]["Properties"]["ImageId"],
        json!({"Fn::FindInMap": ["RegionMap", {"Ref": "AWS::Region"}, "AMI"]})
    );
    assert!(resources["WebServerA"]["Properties"]["UserData"]["Fn::Base64"]["Fn::Sub"]
        .as_str()
        .unwrap()
        .contains("${AWS::StackName} WebServerA"));
    assert!(resources["WebServerB"]["Properties"]["UserData"]["Fn::Base64"]
        .as_str()
        .unwrap()
        .contains("WebServerB"));
    assert_eq!(
        resources["HttpListener"]["Properties"]["DefaultActions"],
        json!([{"Type": "forward", "TargetGroupArn": {"Ref": "WebTargetGroup"}}])
    );
    assert_eq!(
        doc["Outputs"]["LoadBalancerUrl"]["Value"],
        json!({"Fn::Sub": "http://${ApplicationLoadBalancer.DNSName}"})
    );
    assert_eq!(doc["Mappings"]["RegionMap"]["eu-west-3"]["AMI"], json!("ami-0302f42a44bf53a45"));
    assert_eq!(doc["Parameters"]["InstanceType"]["Default"], json!("t2.micro"));
}

#[test]
fn test_blueprint_selector() {
    assert_eq!(Blueprint::Subnet.build().unwrap(), subnet_exercise().unwrap());
    assert_eq!(Blueprint::Network.build().unwrap(), public_network().unwrap());
}
