//! Common IDs - ARM IDs shared across services

use crate::define_resource_id;
use crate::resourceids::Segment;

define_resource_id! {
    /// A Subscription ID
    pub struct SubscriptionId("Subscription") {
        subscription_id: "subscriptionId",
    }
    segments = [
        Segment::Static("subscriptions"),
        Segment::user("subscriptionId", "Subscription"),
    ];
}

define_resource_id! {
    /// A Resource Group ID
    pub struct ResourceGroupId("Resource Group") {
        subscription_id: "subscriptionId",
        resource_group_name: "resourceGroupName",
    }
    segments = [
        Segment::Static("subscriptions"),
        Segment::user("subscriptionId", "Subscription"),
        Segment::Static("resourceGroups"),
        Segment::user("resourceGroupName", "Resource Group Name"),
    ];
}

define_resource_id! {
    /// A Virtual Network Subnet ID
    pub struct SubnetId("Subnet") {
        subscription_id: "subscriptionId",
        resource_group_name: "resourceGroupName",
        virtual_network_name: "virtualNetworkName",
        subnet_name: "subnetName",
    }
    segments = [
        Segment::Static("subscriptions"),
        Segment::user("subscriptionId", "Subscription"),
        Segment::Static("resourceGroups"),
        Segment::user("resourceGroupName", "Resource Group Name"),
        Segment::Static("providers"),
        Segment::Provider("Microsoft.Network"),
        Segment::Static("virtualNetworks"),
        Segment::user("virtualNetworkName", "Virtual Network Name"),
        Segment::Static("subnets"),
        Segment::user("subnetName", "Subnet Name"),
    ];
}

define_resource_id! {
    /// A Private DNS Zone ID
    pub struct PrivateDnsZoneId("Private DNS Zone") {
        subscription_id: "subscriptionId",
        resource_group_name: "resourceGroupName",
        private_dns_zone_name: "privateDnsZoneName",
    }
    segments = [
        Segment::Static("subscriptions"),
        Segment::user("subscriptionId", "Subscription"),
        Segment::Static("resourceGroups"),
        Segment::user("resourceGroupName", "Resource Group Name"),
        Segment::Static("providers"),
        Segment::Provider("Microsoft.Network"),
        Segment::Static("privateDnsZones"),
        Segment::user("privateDnsZoneName", "Private DNS Zone Name"),
    ];
}

define_resource_id! {
    /// A User Assigned Identity ID
    pub struct UserAssignedIdentityId("User Assigned Identity") {
        subscription_id: "subscriptionId",
        resource_group_name: "resourceGroupName",
        user_assigned_identity_name: "userAssignedIdentityName",
    }
    segments = [
        Segment::Static("subscriptions"),
        Segment::user("subscriptionId", "Subscription"),
        Segment::Static("resourceGroups"),
        Segment::user("resourceGroupName", "Resource Group Name"),
        Segment::Static("providers"),
        Segment::Provider("Microsoft.ManagedIdentity"),
        Segment::Static("userAssignedIdentities"),
        Segment::user("userAssignedIdentityName", "User Assigned Identity Name"),
    ];
}

impl ResourceGroupId {
    pub fn subscription(&self) -> SubscriptionId {
        SubscriptionId::new(&self.subscription_id)
    }
}
