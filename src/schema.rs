//! Resource type tags and the property schema of the types cfn-forge knows.
//!
//! Known types only admit the property names listed here. Any other type tag
//! is carried as [`ResourceType::Custom`] and accepts arbitrary properties.

use std::fmt;

/// Type tag of a resource, e.g. `AWS::EC2::VPC`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceType {
    Vpc,
    Subnet,
    InternetGateway,
    VpcGatewayAttachment,
    RouteTable,
    Route,
    SubnetRouteTableAssociation,
    NetworkAcl,
    NetworkAclEntry,
    SubnetNetworkAclAssociation,
    SecurityGroup,
    Instance,
    Eip,
    LoadBalancer,
    TargetGroup,
    Listener,
    /// Any other type tag; its properties are not checked.
    Custom(String),
}

impl ResourceType {
    const KNOWN: [ResourceType; 16] = [
        ResourceType::Vpc,
        ResourceType::Subnet,
        ResourceType::InternetGateway,
        ResourceType::VpcGatewayAttachment,
        ResourceType::RouteTable,
        ResourceType::Route,
        ResourceType::SubnetRouteTableAssociation,
        ResourceType::NetworkAcl,
        ResourceType::NetworkAclEntry,
        ResourceType::SubnetNetworkAclAssociation,
        ResourceType::SecurityGroup,
        ResourceType::Instance,
        ResourceType::Eip,
        ResourceType::LoadBalancer,
        ResourceType::TargetGroup,
        ResourceType::Listener,
    ];

    /// Resolves a type tag, falling back to [`ResourceType::Custom`].
    pub fn from_type_name(name: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|known| known.type_name() == name)
            .unwrap_or_else(|| ResourceType::Custom(name.to_string()))
    }

    pub fn type_name(&self) -> &str {
        match self {
            ResourceType::Vpc => "AWS::EC2::VPC",
            ResourceType::Subnet => "AWS::EC2::Subnet",
            ResourceType::InternetGateway => "AWS::EC2::InternetGateway",
            ResourceType::VpcGatewayAttachment => "AWS::EC2::VPCGatewayAttachment",
            ResourceType::RouteTable => "AWS::EC2::RouteTable",
            ResourceType::Route => "AWS::EC2::Route",
            ResourceType::SubnetRouteTableAssociation => "AWS::EC2::SubnetRouteTableAssociation",
            ResourceType::NetworkAcl => "AWS::EC2::NetworkAcl",
            ResourceType::NetworkAclEntry => "AWS::EC2::NetworkAclEntry",
            ResourceType::SubnetNetworkAclAssociation => "AWS::EC2::SubnetNetworkAclAssociation",
            ResourceType::SecurityGroup => "AWS::EC2::SecurityGroup",
            ResourceType::Instance => "AWS::EC2::Instance",
            ResourceType::Eip => "AWS::EC2::EIP",
            ResourceType::LoadBalancer => "AWS::ElasticLoadBalancingV2::LoadBalancer",
            ResourceType::TargetGroup => "AWS::ElasticLoadBalancingV2::TargetGroup",
            ResourceType::Listener => "AWS::ElasticLoadBalancingV2::Listener",
            ResourceType::Custom(name) => name,
        }
    }

    /// Property names admitted by this type, `None` for custom types.
    pub fn properties(&self) -> Option<&'static [&'static str]> {
        let props: &'static [&'static str] = match self {
            ResourceType::Vpc => &[
                "CidrBlock",
                "EnableDnsHostnames",
                "EnableDnsSupport",
                "InstanceTenancy",
                "Ipv4IpamPoolId",
                "Ipv4NetmaskLength",
                "Tags",
            ],
            ResourceType::Subnet => &[
                "AssignIpv6AddressOnCreation",
                "AvailabilityZone",
                "AvailabilityZoneId",
                "CidrBlock",
                "Ipv6CidrBlock",
                "MapPublicIpOnLaunch",
                "OutpostArn",
                "VpcId",
                "Tags",
            ],
            ResourceType::InternetGateway => &["Tags"],
            ResourceType::VpcGatewayAttachment => &["InternetGatewayId", "VpcId", "VpnGatewayId"],
            ResourceType::RouteTable => &["VpcId", "Tags"],
            ResourceType::Route => &[
                "CarrierGatewayId",
                "DestinationCidrBlock",
                "DestinationIpv6CidrBlock",
                "EgressOnlyInternetGatewayId",
                "GatewayId",
                "InstanceId",
                "NatGatewayId",
                "NetworkInterfaceId",
                "RouteTableId",
                "TransitGatewayId",
                "VpcEndpointId",
                "VpcPeeringConnectionId",
            ],
            ResourceType::SubnetRouteTableAssociation => &["RouteTableId", "SubnetId"],
            ResourceType::NetworkAcl => &["VpcId", "Tags"],
            ResourceType::NetworkAclEntry => &[
                "CidrBlock",
                "Egress",
                "Icmp",
                "Ipv6CidrBlock",
                "NetworkAclId",
                "PortRange",
                "Protocol",
                "RuleAction",
                "RuleNumber",
            ],
            ResourceType::SubnetNetworkAclAssociation => &["NetworkAclId", "SubnetId"],
            ResourceType::SecurityGroup => &[
                "GroupDescription",
                "GroupName",
                "SecurityGroupEgress",
                "SecurityGroupIngress",
                "VpcId",
                "Tags",
            ],
            ResourceType::Instance => &[
                "AvailabilityZone",
                "BlockDeviceMappings",
                "DisableApiTermination",
                "EbsOptimized",
                "IamInstanceProfile",
                "ImageId",
                "InstanceInitiatedShutdownBehavior",
                "InstanceType",
                "KeyName",
                "Monitoring",
                "NetworkInterfaces",
                "PrivateIpAddress",
                "SecurityGroupIds",
                "SecurityGroups",
                "SourceDestCheck",
                "SubnetId",
                "Tags",
                "UserData",
            ],
            ResourceType::Eip => &["Domain", "InstanceId", "PublicIpv4Pool", "Tags"],
            ResourceType::LoadBalancer => &[
                "IpAddressType",
                "LoadBalancerAttributes",
                "Name",
                "Scheme",
                "SecurityGroups",
                "SubnetMappings",
                "Subnets",
                "Tags",
                "Type",
            ],
            ResourceType::TargetGroup => &[
                "HealthCheckEnabled",
                "HealthCheckIntervalSeconds",
                "HealthCheckPath",
                "HealthCheckPort",
                "HealthCheckProtocol",
                "HealthCheckTimeoutSeconds",
                "HealthyThresholdCount",
                "IpAddressType",
                "Matcher",
                "Name",
                "Port",
                "Protocol",
                "ProtocolVersion",
                "TargetGroupAttributes",
                "TargetType",
                "Targets",
                "UnhealthyThresholdCount",
                "VpcId",
                "Tags",
            ],
            ResourceType::Listener => &[
                "AlpnPolicy",
                "Certificates",
                "DefaultActions",
                "LoadBalancerArn",
                "Port",
                "Protocol",
                "SslPolicy",
            ],
            ResourceType::Custom(_) => return None,
        };
        Some(props)
    }

    /// Whether `property` may be set on a resource of this type.
    pub fn admits(&self, property: &str) -> bool {
        self.properties().map_or(true, |props| props.contains(&property))
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl From<&str> for ResourceType {
    fn from(name: &str) -> Self {
        ResourceType::from_type_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_resolve_to_known_variants() {
        for known in ResourceType::KNOWN {
            assert_eq!(ResourceType::from_type_name(known.type_name()), known);
        }
    }

    #[test]
    fn test_unknown_type_is_custom_and_admits_everything() {
        let custom = ResourceType::from("Custom::Thing");
        assert_eq!(custom, ResourceType::Custom("Custom::Thing".to_string()));
        assert!(custom.admits("Anything"));
        assert_eq!(custom.to_string(), "Custom::Thing");
    }

    #[test]
    fn test_known_type_rejects_foreign_property() {
        assert!(ResourceType::Vpc.admits("CidrBlock"));
        assert!(!ResourceType::Vpc.admits("VpcId"));
    }
}
