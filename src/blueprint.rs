//! Built-in stacks.
//!
//! `subnet_exercise` is the smallest useful stack: one VPC, one subnet and an
//! exported output. `public_network` grows it into a two-zone public web tier
//! behind an application load balancer.

use crate::error::Result;
use crate::intrinsic::{Intrinsic, Pseudo, Sub};
use crate::output::{Export, Output};
use crate::parameter::{Parameter, KEY_PAIR_NAME, STRING};
use crate::resource::{Resource, Tags};
use crate::schema::ResourceType;
use crate::template::{Mapping, Template};
use crate::value::Value;
use indexmap::IndexMap;

/// Blueprints selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Blueprint {
    /// VPC, subnet and an exported subnet output
    Subnet,
    /// Public web tier: gateway, routing, ACLs, security groups, instances, load balancer
    Network,
}

impl Blueprint {
    pub fn build(&self) -> Result<Template> {
        match self {
            Blueprint::Subnet => subnet_exercise(),
            Blueprint::Network => public_network(),
        }
    }
}

/// Export name of the form `<stack name>-<suffix>`.
fn stack_export(suffix: &str) -> Export {
    Export::new(Sub::builder().pseudo(Pseudo::StackName).literal("-").literal(suffix).build())
}

pub fn subnet_exercise() -> Result<Template> {
    let mut template = Template::new();

    let vpc = template
        .add_resource(
            Resource::new("VPC", ResourceType::Vpc)
                .property("CidrBlock", "10.0.0.0/24")
                .property("Tags", Tags::new().tag("Name", "Exercise VPC")),
        )?
        .reference();

    let mut subnet = Resource::new("TestSubnet", ResourceType::Subnet);
    subnet
        .set("AvailabilityZone", "eu-west-3c")
        .set("CidrBlock", "10.0.0.0/24")
        .set("VpcId", vpc)
        .set(
            "Tags",
            Tags::new()
                .tag("Name", "Exercise subnet")
                .tag("Zone & Block", "eu-west-3c (Paris) & 10.0.0.0/24"),
        );
    let subnet_name = template.add_resource(subnet)?.logical_name().to_string();

    let mut output = Output::new("outputSubnet");
    output
        .set_value(Value::reference(subnet_name.as_str()))
        .set_export(stack_export(&subnet_name));
    template.add_output(output)?;

    Ok(template)
}

const WEB_SERVER_SCRIPT_HEAD: &str = "#!/bin/bash -xe\n\
yum update -y\n\
yum install -y httpd\n\
systemctl enable --now httpd\n\
echo \"<h1>";

const WEB_SERVER_SCRIPT_TAIL: &str = "</h1>\" > /var/www/html/index.html\n";

fn region_map() -> Mapping {
    [
        ("eu-west-1", "ami-0d71ea30463e0ff8d"),
        ("eu-west-3", "ami-0302f42a44bf53a45"),
        ("us-east-1", "ami-0c02fb55956c7d316"),
    ]
    .into_iter()
    .map(|(region, ami)| {
        let mut entry = IndexMap::new();
        entry.insert("AMI".to_string(), Value::from(ami));
        (region.to_string(), entry)
    })
    .collect()
}

fn acl_entry(name: &str, rule: u32, protocol: i32, ports: Option<(u16, u16)>, egress: bool, cidr: Value) -> Resource {
    let mut entry = Resource::new(name, ResourceType::NetworkAclEntry)
        .property("NetworkAclId", Value::reference("PublicNetworkAcl"))
        .property("RuleNumber", rule)
        .property("Protocol", protocol)
        .property("RuleAction", "allow")
        .property("Egress", egress)
        .property("CidrBlock", cidr);
    if let Some((from, to)) = ports {
        entry.set("PortRange", Value::record([("From", from), ("To", to)]));
    }
    entry
}

fn ingress_rule(port: u16, source_key: &str, source: Value) -> Value {
    Value::record([
        ("IpProtocol", Value::from("tcp")),
        ("FromPort", Value::from(port)),
        ("ToPort", Value::from(port)),
        (source_key, source),
    ])
}

fn web_server(name: &str, subnet: &str, user_data: Value) -> Resource {
    Resource::new(name, ResourceType::Instance)
        .property(
            "ImageId",
            Intrinsic::find_in_map("RegionMap", Pseudo::Region, "AMI"),
        )
        .property("InstanceType", Value::reference("InstanceType"))
        .property("KeyName", Value::reference("KeyName"))
        .property("SubnetId", Value::reference(subnet))
        .property("SecurityGroupIds", Value::list([Value::reference("WebServerSecurityGroup")]))
        .property("UserData", Intrinsic::base64(user_data))
        .property("Tags", Tags::new().tag("Name", name))
}

pub fn public_network() -> Result<Template> {
    let mut template = Template::new();
    template.set_description("Public web tier: two web servers behind an application load balancer");

    template.add_parameter(
        Parameter::new("KeyName", KEY_PAIR_NAME)
            .description("Name of an existing EC2 key pair for SSH access")
            .constraint_description("must be the name of an existing EC2 key pair"),
    )?;
    template.add_parameter(
        Parameter::new("InstanceType", STRING)
            .default_value("t2.micro")
            .allowed_values(["t2.micro", "t3.micro", "t3.small"])
            .description("Web server instance type"),
    )?;
    template.add_parameter(
        Parameter::new("SshLocation", STRING)
            .default_value("0.0.0.0/0")
            .description("Address range allowed to SSH into the web servers")
            .allowed_pattern(r"(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})/(\d{1,2})")
            .length(Some(9), Some(18))
            .constraint_description("must be a valid CIDR range of the form x.x.x.x/x"),
    )?;
    template.add_mapping("RegionMap", region_map())?;

    template.add_resource(
        Resource::new("VPC", ResourceType::Vpc)
            .property("CidrBlock", "10.0.0.0/16")
            .property("EnableDnsSupport", true)
            .property("EnableDnsHostnames", true)
            .property("Tags", Tags::new().tag("Name", Sub::builder().pseudo(Pseudo::StackName).literal("-vpc").build())),
    )?;
    template.add_resource(
        Resource::new("InternetGateway", ResourceType::InternetGateway)
            .property("Tags", Tags::new().tag("Name", "public-igw")),
    )?;
    template.add_resource(
        Resource::new("GatewayAttachment", ResourceType::VpcGatewayAttachment)
            .property("VpcId", Value::reference("VPC"))
            .property("InternetGatewayId", Value::reference("InternetGateway")),
    )?;

    for (index, (name, cidr)) in [("PublicSubnetA", "10.0.1.0/24"), ("PublicSubnetB", "10.0.2.0/24")]
        .into_iter()
        .enumerate()
    {
        let zone = index as u32;
        template.add_resource(
            Resource::new(name, ResourceType::Subnet)
                .property("VpcId", Value::reference("VPC"))
                .property("CidrBlock", cidr)
                .property("AvailabilityZone", Intrinsic::select(zone, Intrinsic::get_azs()))
                .property("MapPublicIpOnLaunch", true)
                .property("Tags", Tags::new().tag("Name", name)),
        )?;
    }

    template.add_resource(
        Resource::new("PublicRouteTable", ResourceType::RouteTable)
            .property("VpcId", Value::reference("VPC")),
    )?;
    template.add_resource(
        Resource::new("PublicRoute", ResourceType::Route)
            .property("RouteTableId", Value::reference("PublicRouteTable"))
            .property("DestinationCidrBlock", "0.0.0.0/0")
            .property("GatewayId", Value::reference("InternetGateway"))
            .depends_on("GatewayAttachment"),
    )?;

    template.add_resource(
        Resource::new("PublicNetworkAcl", ResourceType::NetworkAcl)
            .property("VpcId", Value::reference("VPC")),
    )?;
    let anywhere = || Value::from("0.0.0.0/0");
    template.add_resource(acl_entry("InboundHttpAclEntry", 100, 6, Some((80, 80)), false, anywhere()))?;
    template.add_resource(acl_entry(
        "InboundSshAclEntry",
        110,
        6,
        Some((22, 22)),
        false,
        Value::reference("SshLocation"),
    ))?;
    template.add_resource(acl_entry("InboundEphemeralAclEntry", 120, 6, Some((1024, 65535)), false, anywhere()))?;
    template.add_resource(acl_entry("OutboundAclEntry", 100, -1, None, true, anywhere()))?;

    for (suffix, subnet) in [("A", "PublicSubnetA"), ("B", "PublicSubnetB")] {
        template.add_resource(
            Resource::new(format!("RouteTableAssociation{suffix}"), ResourceType::SubnetRouteTableAssociation)
                .property("SubnetId", Value::reference(subnet))
                .property("RouteTableId", Value::reference("PublicRouteTable")),
        )?;
        template.add_resource(
            Resource::new(format!("NetworkAclAssociation{suffix}"), ResourceType::SubnetNetworkAclAssociation)
                .property("SubnetId", Value::reference(subnet))
                .property("NetworkAclId", Value::reference("PublicNetworkAcl")),
        )?;
    }

    template.add_resource(
        Resource::new("LoadBalancerSecurityGroup", ResourceType::SecurityGroup)
            .property("GroupDescription", "HTTP from anywhere")
            .property("VpcId", Value::reference("VPC"))
            .property("SecurityGroupIngress", Value::list([ingress_rule(80, "CidrIp", anywhere())])),
    )?;
    template.add_resource(
        Resource::new("WebServerSecurityGroup", ResourceType::SecurityGroup)
            .property("GroupDescription", "HTTP from the load balancer, SSH from the admin range")
            .property("VpcId", Value::reference("VPC"))
            .property(
                "SecurityGroupIngress",
                Value::list([
                    ingress_rule(80, "SourceSecurityGroupId", Value::reference("LoadBalancerSecurityGroup")),
                    ingress_rule(22, "CidrIp", Value::reference("SshLocation")),
                ]),
            ),
    )?;

    let interpolated = Sub::builder()
        .literal(WEB_SERVER_SCRIPT_HEAD)
        .pseudo(Pseudo::StackName)
        .literal(" WebServerA")
        .literal(WEB_SERVER_SCRIPT_TAIL)
        .build();
    template.add_resource(web_server("WebServerA", "PublicSubnetA", interpolated.into()))?;

    let static_script = format!("{WEB_SERVER_SCRIPT_HEAD}WebServerB{WEB_SERVER_SCRIPT_TAIL}");
    template.add_resource(web_server(
        "WebServerB",
        "PublicSubnetB",
        Value::Bytes(static_script.into_bytes()),
    ))?;

    template.add_resource(
        Resource::new("ApplicationLoadBalancer", ResourceType::LoadBalancer)
            .property("Type", "application")
            .property("Scheme", "internet-facing")
            .property(
                "Subnets",
                Value::list([Value::reference("PublicSubnetA"), Value::reference("PublicSubnetB")]),
            )
            .property("SecurityGroups", Value::list([Value::reference("LoadBalancerSecurityGroup")]))
            .depends_on("GatewayAttachment"),
    )?;
    let targets = ["WebServerA", "WebServerB"]
        .into_iter()
        .map(|name| Value::record([("Id", Value::reference(name)), ("Port", Value::from(80))]))
        .collect::<Vec<_>>();
    template.add_resource(
        Resource::new("WebTargetGroup", ResourceType::TargetGroup)
            .property("Port", 80)
            .property("Protocol", "HTTP")
            .property("VpcId", Value::reference("VPC"))
            .property("HealthCheckPath", "/")
            .property("HealthCheckIntervalSeconds", 30)
            .property("HealthyThresholdCount", 2)
            .property("UnhealthyThresholdCount", 5)
            .property("Targets", targets),
    )?;
    template.add_resource(
        Resource::new("HttpListener", ResourceType::Listener)
            .property("LoadBalancerArn", Value::reference("ApplicationLoadBalancer"))
            .property("Port", 80)
            .property("Protocol", "HTTP")
            .property(
                "DefaultActions",
                Value::list([Value::record([
                    ("Type", Value::from("forward")),
                    ("TargetGroupArn", Value::reference("WebTargetGroup")),
                ])]),
            ),
    )?;

    template.add_output(
        Output::new("VpcId")
            .description("VPC of the web tier")
            .value(Value::reference("VPC"))
            .export(stack_export("VpcId")),
    )?;
    template.add_output(
        Output::new("PublicSubnets")
            .description("Comma separated public subnet ids")
            .value(Intrinsic::join(
                ",",
                vec![Value::reference("PublicSubnetA"), Value::reference("PublicSubnetB")],
            ))
            .export(Export::new("web-tier-PublicSubnets")),
    )?;
    template.add_output(
        Output::new("LoadBalancerUrl")
            .description("Public URL of the load balancer")
            .value(Sub::builder().literal("http://").attribute("ApplicationLoadBalancer", "DNSName").build()),
    )?;

    Ok(template)
}
