use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde_json::Value;
use spark_rpc_core::{
    Address, Cancellation, InvokeContext, InvokeMessage, Parameters, Result, RpcError, ScopedInvokeMessage,
    service_id_with_channel,
};

use spark_rpc_router::RouteTable;

use crate::invoker::RemoteInvoker;
use crate::registration::register_remote_services;

/// 进程内自动生成通道的序号。
static ENDPOINT_CHANNELS: AtomicU64 = AtomicU64::new(0);

/// 通用服务代理：按服务 Id 与具名参数转发调用，取代为每个服务接口生成的桩代码。
///
/// # 契约说明（What）
/// - 设置通道后，解析键为 `channel/serviceId`，线上消息仍只携带 `serviceId`；
/// - 空字符串通道等同于未设置；
/// - 远端回传异常描述时返回 [`RpcError::Remote`]；
/// - 结果消息缺少载荷（或载荷为 `null`）时返回目标类型的默认值。
#[derive(Clone)]
pub struct ServiceProxy {
    invoker: Arc<RemoteInvoker>,
    channel: Option<String>,
}

impl ServiceProxy {
    pub fn new(invoker: Arc<RemoteInvoker>) -> Self {
        Self {
            invoker,
            channel: None,
        }
    }

    /// 构建限定在 `channel` 上的代理。
    pub fn with_channel(invoker: Arc<RemoteInvoker>, channel: impl Into<String>) -> Self {
        let channel = channel.into();
        Self {
            invoker,
            channel: (!channel.is_empty()).then_some(channel),
        }
    }

    /// 构建直连 `endpoints` 的代理。
    ///
    /// 生成一个进程内唯一的通道，把 `services` 以该通道注册到 `endpoints`，再返回限定在
    /// 这个通道上的代理。同一服务 Id 可据此同时存在多个指向不同端点的代理，互不覆盖。
    /// 注册失败（端点或服务 Id 为空）时返回 `InvalidArgument`，路由表不变。
    pub async fn with_endpoints<I, S>(
        invoker: Arc<RemoteInvoker>,
        table: &RouteTable,
        services: I,
        endpoints: &[Address],
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sequence = ENDPOINT_CHANNELS.fetch_add(1, Ordering::Relaxed);
        let channel = format!("endpoints-{}-{sequence}", std::process::id());
        register_remote_services(table, Some(&channel), services, endpoints).await?;
        Ok(Self::with_channel(invoker, channel))
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// 生成带解析键的调用消息；无通道时不设置解析键。
    pub fn scoped_message(&self, service_id: &str, parameters: Parameters) -> ScopedInvokeMessage {
        let local_service_id = self
            .channel
            .as_deref()
            .map(|channel| service_id_with_channel(service_id, Some(channel)));
        ScopedInvokeMessage::new(
            InvokeMessage {
                service_id: service_id.to_owned(),
                parameters,
            },
            local_service_id,
        )
    }

    /// 调用远程服务并把结果反序列化为 `T`。
    pub async fn invoke<T>(
        &self,
        service_id: &str,
        parameters: Parameters,
        cancellation: Option<&Cancellation>,
    ) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.call(service_id, parameters, cancellation).await? {
            None | Some(Value::Null) => Ok(T::default()),
            Some(value) => serde_json::from_value(value).map_err(|err| RpcError::Transport {
                detail: format!("cannot decode result of `{service_id}`: {err}"),
            }),
        }
    }

    /// 调用无返回值的远程服务。
    pub async fn invoke_unit(
        &self,
        service_id: &str,
        parameters: Parameters,
        cancellation: Option<&Cancellation>,
    ) -> Result<()> {
        self.call(service_id, parameters, cancellation).await.map(drop)
    }

    async fn call(
        &self,
        service_id: &str,
        parameters: Parameters,
        cancellation: Option<&Cancellation>,
    ) -> Result<Option<Value>> {
        let context = InvokeContext::new(self.scoped_message(service_id, parameters));
        let reply = self.invoker.invoke(context, cancellation).await?;
        if let Some(message) = reply.exception_message {
            return Err(RpcError::Remote { message });
        }
        Ok(reply.result)
    }
}
