use async_trait::async_trait;
use spark_rpc_core::{
    Address, AddressDescriptor, IpAddressModel, Result, RouteFactory, RpcError, ServiceRoute,
    ServiceRouteDescriptor,
};

/// 将 JSON 形态的地址描述物化为路由的默认工厂。
///
/// # 契约说明（What）
/// - 地址描述的 `type_name` 目前只接受 `ip`，`value` 为 [`IpAddressModel`] 的 JSON 文本；
/// - 任一描述非法即整体返回 [`RpcError::RouteMaterialization`]，不产出部分结果。
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonRouteFactory;

impl JsonRouteFactory {
    fn address(service_id: &str, descriptor: &AddressDescriptor) -> Result<Address> {
        match descriptor.type_name.as_str() {
            Address::IP_TYPE_NAME => serde_json::from_str::<IpAddressModel>(&descriptor.value)
                .map(Address::Ip)
                .map_err(|err| RpcError::RouteMaterialization {
                    detail: format!("service `{service_id}` has a malformed address: {err}"),
                }),
            other => Err(RpcError::RouteMaterialization {
                detail: format!("service `{service_id}` uses unknown address type `{other}`"),
            }),
        }
    }
}

#[async_trait]
impl RouteFactory for JsonRouteFactory {
    async fn materialize(&self, descriptors: Vec<ServiceRouteDescriptor>) -> Result<Vec<ServiceRoute>> {
        descriptors
            .into_iter()
            .map(|descriptor| {
                let service_id = descriptor.service_descriptor.id.as_str();
                if service_id.is_empty() {
                    return Err(RpcError::RouteMaterialization {
                        detail: "service descriptor without id".to_owned(),
                    });
                }
                let addresses = descriptor
                    .address_descriptors
                    .iter()
                    .map(|address| Self::address(service_id, address))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ServiceRoute::new(descriptor.service_descriptor, addresses))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use spark_rpc_core::ServiceDescriptor;

    fn descriptor(id: &str, addresses: Vec<AddressDescriptor>) -> ServiceRouteDescriptor {
        ServiceRouteDescriptor {
            service_descriptor: ServiceDescriptor::new(id),
            address_descriptors: addresses,
        }
    }

    #[test]
    fn materializes_ip_addresses() {
        let raw = descriptor(
            "svc",
            vec![AddressDescriptor {
                type_name: "ip".into(),
                value: r#"{"ip":"10.0.0.1","port":9981}"#.into(),
            }],
        );
        let routes = block_on(JsonRouteFactory.materialize(vec![raw])).unwrap();
        assert_eq!(routes[0].addresses, vec![Address::ip("10.0.0.1", 9981)]);
    }

    #[test]
    fn route_round_trips_through_descriptor() {
        let route = ServiceRoute::new(ServiceDescriptor::new("svc"), [Address::ip("10.0.0.1", 1)]);
        let raw = route.to_descriptor().unwrap();
        let routes = block_on(JsonRouteFactory.materialize(vec![raw])).unwrap();
        assert_eq!(routes, vec![route]);
    }

    #[test]
    fn unknown_type_rejects_whole_batch() {
        let good = descriptor("good", Vec::new());
        let bad = descriptor(
            "bad",
            vec![AddressDescriptor {
                type_name: "unix".into(),
                value: "/tmp/sock".into(),
            }],
        );
        let err = block_on(JsonRouteFactory.materialize(vec![good, bad])).unwrap_err();
        assert!(matches!(err, RpcError::RouteMaterialization { .. }));
        assert!(err.to_string().contains("unix"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let bad = descriptor(
            "svc",
            vec![AddressDescriptor {
                type_name: "ip".into(),
                value: "{not json".into(),
            }],
        );
        assert!(block_on(JsonRouteFactory.materialize(vec![bad])).is_err());
    }
}
