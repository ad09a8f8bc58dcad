use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use spark_rpc_core::{Address, Result, RpcError};
use spark_rpc_router::RouteTable;
use tracing::info;

use crate::registration::remote_service_routes;

/// 客户端配置。
///
/// ```toml
/// channel = "blue"
///
/// [[remote_services]]
/// services = ["Orders.Get_id"]
/// endpoints = ["10.0.0.1:9000", "10.0.0.2:9000"]
///
/// [[remote_services]]
/// channel = "green"
/// services = ["Orders.Get_id"]
/// endpoints = ["10.0.1.1:9000"]
/// ```
///
/// `remote_services` 条目未写 `channel` 时继承顶层 `channel`。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub channel: Option<String>,
    pub remote_services: Vec<RemoteServiceConfig>,
}

/// 一组部署在相同端点上的远程服务。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteServiceConfig {
    #[serde(default)]
    pub channel: Option<String>,
    pub services: Vec<String>,
    pub endpoints: Vec<String>,
}

impl ClientConfig {
    /// 从 TOML 文本解析。
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| RpcError::Configuration {
            detail: err.to_string(),
        })
    }

    /// 把全部 `remote_services` 一次合并进路由表。
    ///
    /// 先为每组解析端点并构造路由，任一组非法（端点无法解析、端点为空、服务 Id 为空）时
    /// 整体失败，路由表不变。
    pub async fn install(&self, table: &RouteTable) -> Result<()> {
        let mut routes = Vec::new();
        for group in &self.remote_services {
            let endpoints = group
                .endpoints
                .iter()
                .map(|text| parse_endpoint(text))
                .collect::<Result<Vec<_>>>()?;
            let channel = group.channel.as_deref().or(self.channel.as_deref());
            routes.extend(remote_service_routes(channel, &group.services, &endpoints)?);
        }
        info!(
            groups = self.remote_services.len(),
            routes = routes.len(),
            "installing configured remote services"
        );
        table.merge_routes(routes).await
    }
}

fn parse_endpoint(text: &str) -> Result<Address> {
    text.parse::<SocketAddr>()
        .map(Address::from)
        .map_err(|err| RpcError::Configuration {
            detail: format!("endpoint `{text}` is not `ip:port`: {err}"),
        })
}
