use spark_rpc_core::{
    Address, Result, RpcError, ServiceDescriptor, ServiceRoute, service_id_with_channel,
};
use spark_rpc_router::RouteTable;
use tracing::info;

/// 把一组静态远程服务合并进路由表。
///
/// # 教案式解读
/// - **意图（Why）**：没有注册中心时，客户端直接声明“这些服务部署在这些端点上”；
///   同一服务接口的多套独立部署以不同通道区分；
/// - **执行逻辑（How）**：由 [`remote_service_routes`] 生成路由，再经
///   [`RouteTable::merge_routes`] 一次合并，其他路由保持不变；
/// - **契约（What）**：`endpoints` 不能为空，服务 Id 不能为空，否则以 `InvalidArgument`
///   失败且路由表不变。
pub async fn register_remote_services<I, S>(
    table: &RouteTable,
    channel: Option<&str>,
    services: I,
    endpoints: &[Address],
) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let routes = remote_service_routes(channel, services, endpoints)?;
    info!(
        channel = channel.unwrap_or_default(),
        services = routes.len(),
        endpoints = endpoints.len(),
        "registering remote services"
    );
    table.merge_routes(routes).await
}

/// 为每个线上服务 Id 生成一条路由：Id 为通道限定的解析键，地址为全部 `endpoints`。
///
/// 只做校验与构造，不触碰路由表；多组声明需要整体生效时先逐组构造再一次合并。
pub fn remote_service_routes<I, S>(
    channel: Option<&str>,
    services: I,
    endpoints: &[Address],
) -> Result<Vec<ServiceRoute>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if endpoints.is_empty() {
        return Err(RpcError::InvalidArgument { field: "endpoints" });
    }
    services
        .into_iter()
        .map(|service| {
            let service = service.as_ref();
            if service.is_empty() {
                return Err(RpcError::InvalidArgument {
                    field: "service_id",
                });
            }
            Ok(ServiceRoute::new(
                ServiceDescriptor::new(service_id_with_channel(service, channel)),
                endpoints.iter().cloned(),
            ))
        })
        .collect()
}
