//! MySQL Flexible Server IDs

use cirrus_core::define_resource_id;
use cirrus_core::resourceids::Segment;

define_resource_id! {
    /// A Flexible Server ID
    pub struct FlexibleServerId("Flexible Server") {
        subscription_id: "subscriptionId",
        resource_group_name: "resourceGroupName",
        flexible_server_name: "flexibleServerName",
    }
    segments = [
        Segment::Static("subscriptions"),
        Segment::user("subscriptionId", "Subscription"),
        Segment::Static("resourceGroups"),
        Segment::user("resourceGroupName", "Resource Group Name"),
        Segment::Static("providers"),
        Segment::Provider("Microsoft.DBforMySQL"),
        Segment::Static("flexibleServers"),
        Segment::user("flexibleServerName", "Flexible Server Name"),
    ];
}

define_resource_id! {
    /// A Flexible Server Configuration ID
    pub struct FlexibleServerConfigurationId("Flexible Server Configuration") {
        subscription_id: "subscriptionId",
        resource_group_name: "resourceGroupName",
        flexible_server_name: "flexibleServerName",
        configuration_name: "configurationName",
    }
    segments = [
        Segment::Static("subscriptions"),
        Segment::user("subscriptionId", "Subscription"),
        Segment::Static("resourceGroups"),
        Segment::user("resourceGroupName", "Resource Group Name"),
        Segment::Static("providers"),
        Segment::Provider("Microsoft.DBforMySQL"),
        Segment::Static("flexibleServers"),
        Segment::user("flexibleServerName", "Flexible Server Name"),
        Segment::Static("configurations"),
        Segment::user("configurationName", "Configuration Name"),
    ];
}

impl FlexibleServerConfigurationId {
    pub fn server(&self) -> FlexibleServerId {
        FlexibleServerId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.flexible_server_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_core::resourceids::{ParseFailure, ResourceIdentifier};

    const SERVER: &str = "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/example-rg/providers/Microsoft.DBforMySQL/flexibleServers/example-server";

    #[test]
    fn test_flexible_server_id() {
        let id = FlexibleServerId::new(
            "12345678-1234-9876-4563-123456789012",
            "example-rg",
            "example-server",
        );
        assert_eq!(id.id(), SERVER);
        assert_eq!(FlexibleServerId::parse(SERVER).unwrap(), id);
        assert_eq!(
            id.description(),
            "Flexible Server (Subscription: \"12345678-1234-9876-4563-123456789012\", Resource Group Name: \"example-rg\", Flexible Server Name: \"example-server\")"
        );
    }

    #[test]
    fn test_flexible_server_id_is_case_sensitive() {
        let input = SERVER.replace("flexibleServers", "flexibleservers");
        let err = FlexibleServerId::parse(&input).unwrap_err();
        assert!(matches!(err.reason, ParseFailure::CaseMismatch { .. }));
    }

    #[test]
    fn test_configuration_id() {
        let input = format!("{}/configurations/max_connections", SERVER);
        let id = FlexibleServerConfigurationId::parse(&input).unwrap();
        assert_eq!(id.configuration_name, "max_connections");
        assert_eq!(id.server().id(), SERVER);
        assert!(FlexibleServerId::parse(&input).is_err());
    }
}
