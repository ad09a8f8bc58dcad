use std::fmt;
use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RpcError};

/// IP + 端口形式的地址模型，持久化时以 JSON 保存在 [`AddressDescriptor::value`] 中。
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpAddressModel {
    pub ip: String,
    pub port: u16,
}

/// 服务实例的网络地址，不可变值。
///
/// # 契约说明（What）
/// - 通过 [`Address::endpoint`] 物化为可连接的 [`SocketAddr`]；
/// - 结构相等即视为同一地址，可作为健康追踪的键；
/// - [`Address::type_name`] 与 [`AddressDescriptor::type_name`] 对应，用于后端存储的往返。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Address {
    Ip(IpAddressModel),
}

impl Address {
    /// `ip` 类型地址在描述符中的类型名。
    pub const IP_TYPE_NAME: &'static str = "ip";

    /// 以 IP 与端口构造地址。
    pub fn ip(ip: impl Into<String>, port: u16) -> Self {
        Address::Ip(IpAddressModel {
            ip: ip.into(),
            port,
        })
    }

    /// 将地址转换为可连接端点。
    pub fn endpoint(&self) -> Result<SocketAddr> {
        match self {
            Address::Ip(model) => {
                let ip: IpAddr = model.ip.parse().map_err(|err| RpcError::InvalidAddress {
                    detail: format!("`{}` is not an ip address: {err}", model.ip),
                })?;
                Ok(SocketAddr::new(ip, model.port))
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Address::Ip(_) => Self::IP_TYPE_NAME,
        }
    }

    /// 转换为后端存储使用的原始描述符。
    pub fn to_descriptor(&self) -> Result<AddressDescriptor> {
        let value = match self {
            Address::Ip(model) => serde_json::to_string(model),
        }
        .map_err(|err| RpcError::RouteMaterialization {
            detail: err.to_string(),
        })?;
        Ok(AddressDescriptor {
            type_name: self.type_name().to_owned(),
            value,
        })
    }
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        Address::ip(addr.ip().to_string(), addr.port())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Ip(model) => match model.ip.parse::<IpAddr>() {
                Ok(IpAddr::V6(v6)) => write!(f, "[{v6}]:{}", model.port),
                _ => write!(f, "{}:{}", model.ip, model.port),
            },
        }
    }
}

/// 后端存储中的地址原始形态：类型名 + JSON 文本。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDescriptor {
    pub type_name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_address_materializes_endpoint() {
        let address = Address::ip("127.0.0.1", 9981);
        assert_eq!(
            address.endpoint().unwrap(),
            "127.0.0.1:9981".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(address.to_string(), "127.0.0.1:9981");
    }

    #[test]
    fn malformed_ip_is_rejected() {
        let err = Address::ip("not-an-ip", 1).endpoint().unwrap_err();
        assert!(matches!(err, RpcError::InvalidAddress { .. }));
    }

    #[test]
    fn ipv6_display_is_bracketed() {
        let address: Address = "[::1]:80".parse::<SocketAddr>().unwrap().into();
        assert_eq!(address.to_string(), "[::1]:80");
    }

    #[test]
    fn descriptor_carries_json_value() {
        let descriptor = Address::ip("10.0.0.1", 80).to_descriptor().unwrap();
        assert_eq!(descriptor.type_name, "ip");
        let model: IpAddressModel = serde_json::from_str(&descriptor.value).unwrap();
        assert_eq!(model.port, 80);
    }
}
