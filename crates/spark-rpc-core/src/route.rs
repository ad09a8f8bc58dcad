use serde::{Deserialize, Serialize};

use crate::address::{Address, AddressDescriptor};
use crate::descriptor::ServiceDescriptor;
use crate::error::Result;

/// “该服务 Id 可在这些地址上访问”。
///
/// 地址保持声明顺序；相等性为逐字段比较（描述与地址序列都参与）。
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceRoute {
    pub descriptor: ServiceDescriptor,
    pub addresses: Vec<Address>,
}

impl ServiceRoute {
    pub fn new(descriptor: ServiceDescriptor, addresses: impl IntoIterator<Item = Address>) -> Self {
        Self {
            descriptor,
            addresses: addresses.into_iter().collect(),
        }
    }

    /// 路由键，即服务描述的 `id`。
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    /// 转换为后端存储的原始描述符。
    pub fn to_descriptor(&self) -> Result<ServiceRouteDescriptor> {
        let address_descriptors = self
            .addresses
            .iter()
            .map(Address::to_descriptor)
            .collect::<Result<Vec<_>>>()?;
        Ok(ServiceRouteDescriptor {
            service_descriptor: self.descriptor.clone(),
            address_descriptors,
        })
    }
}

/// 后端存储读出的原始路由描述，需经路由工厂物化为 [`ServiceRoute`]。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceRouteDescriptor {
    pub service_descriptor: ServiceDescriptor,
    #[serde(default)]
    pub address_descriptors: Vec<AddressDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_covers_addresses() {
        let a = ServiceRoute::new(ServiceDescriptor::new("svc"), [Address::ip("10.0.0.1", 1)]);
        let b = ServiceRoute::new(ServiceDescriptor::new("svc"), [Address::ip("10.0.0.1", 1)]);
        let c = ServiceRoute::new(ServiceDescriptor::new("svc"), [Address::ip("10.0.0.2", 1)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn descriptor_preserves_address_order() {
        let route = ServiceRoute::new(
            ServiceDescriptor::new("svc").with_metadata("weight", 3),
            [Address::ip("10.0.0.2", 2), Address::ip("10.0.0.1", 1)],
        );
        let descriptor = route.to_descriptor().unwrap();
        assert_eq!(descriptor.service_descriptor.id, "svc");
        assert_eq!(descriptor.address_descriptors.len(), 2);
        assert!(descriptor.address_descriptors[0].value.contains("10.0.0.2"));
    }
}
