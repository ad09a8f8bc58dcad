use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use spark_rpc_core::{
    BoxError, Cancellation, DefaultServiceIdGenerator, DefaultTypeConverter, InvokeMessage,
    InvokeResultMessage, MethodSignature, Parameters, Result, RpcError, ServiceDescriptor,
    ServiceIdGenerator, TypeConverter,
};
use tracing::{debug, warn};

use crate::binding::bind;
use crate::entry::{Handler, ServiceEntry};
use crate::registration::{InstanceFactory, Method, ServiceRegistration};

/// 分发表构建器。
///
/// # 教案式解读
/// - **意图（Why）**：启动期一次性把全部服务实现转换为 [`ServiceEntry`]，运行期只读；
/// - **执行逻辑（How）**：每个注册方法经 [`ServiceIdGenerator`] 得到线上 Id，签名元数据写入
///   服务描述，处理函数闭包持有实例工厂、方法与 [`TypeConverter`]；
/// - **契约（What）**：两个方法生成相同 Id 时以 `DuplicateServiceId` 拒绝。
pub struct DispatchTableBuilder {
    ids: Arc<dyn ServiceIdGenerator>,
    converter: Arc<dyn TypeConverter>,
    entries: Vec<ServiceEntry>,
    index: HashMap<String, usize>,
}

impl Default for DispatchTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTableBuilder {
    /// 使用默认 Id 生成器与默认类型转换器。
    pub fn new() -> Self {
        Self {
            ids: Arc::new(DefaultServiceIdGenerator),
            converter: Arc::new(DefaultTypeConverter),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn ServiceIdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    #[must_use]
    pub fn with_type_converter(mut self, converter: Arc<dyn TypeConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// 为 `registration` 的每个方法生成一个服务条目。
    ///
    /// 冲突时整个注册被拒绝，已有条目保持不变。
    pub fn register<S: Send + 'static>(
        mut self,
        registration: ServiceRegistration<S>,
    ) -> Result<Self> {
        let ServiceRegistration { factory, methods } = registration;
        let mut pending = Vec::with_capacity(methods.len());
        for (signature, method) in methods {
            let id = self.ids.id_for(&signature);
            if self.index.contains_key(&id) || pending.iter().any(|e: &ServiceEntry| e.id() == id) {
                return Err(RpcError::DuplicateServiceId { id });
            }
            let descriptor = ServiceDescriptor {
                id: id.clone(),
                metadata: signature.metadata.clone(),
            };
            let handler = build_handler(
                id,
                signature.clone(),
                Arc::clone(&factory),
                method,
                Arc::clone(&self.converter),
            );
            pending.push(ServiceEntry {
                descriptor,
                signature,
                handler,
            });
        }
        for entry in pending {
            self.index.insert(entry.id().to_owned(), self.entries.len());
            self.entries.push(entry);
        }
        Ok(self)
    }

    pub fn build(self) -> DispatchTable {
        debug!(entries = self.entries.len(), "dispatch table built");
        DispatchTable {
            entries: self.entries,
            index: self.index,
        }
    }
}

/// 服务端分发表：线上服务 Id → [`ServiceEntry`]，构建后不可变。
///
/// # 契约说明（What）
/// - [`Self::entries`] 交给传输层监听器注册入站服务 Id；
/// - [`Self::handler`] 对未知 Id 返回 `None`；
/// - [`Self::execute`] 把任何失败折叠成带异常描述的结果消息，供监听器直接回写。
#[derive(Debug, Default)]
pub struct DispatchTable {
    entries: Vec<ServiceEntry>,
    index: HashMap<String, usize>,
}

impl DispatchTable {
    pub fn builder() -> DispatchTableBuilder {
        DispatchTableBuilder::new()
    }

    pub fn entries(&self) -> &[ServiceEntry] {
        &self.entries
    }

    pub fn entry(&self, service_id: &str) -> Option<&ServiceEntry> {
        self.index.get(service_id).map(|&i| &self.entries[i])
    }

    pub fn handler(&self, service_id: &str) -> Option<Handler> {
        self.entry(service_id).map(|entry| Arc::clone(&entry.handler))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 执行一条入站线上消息。
    pub async fn execute(
        &self,
        message: InvokeMessage,
        cancellation: &Cancellation,
    ) -> InvokeResultMessage {
        let Some(entry) = self.entry(&message.service_id) else {
            warn!(service_id = %message.service_id, "no service entry for incoming message");
            return InvokeResultMessage::failure(format!(
                "service `{}` is not registered",
                message.service_id
            ));
        };
        match entry.invoke(message.parameters, cancellation.clone()).await {
            Ok(result) => InvokeResultMessage::success(result),
            Err(err) => InvokeResultMessage::failure(err.to_string()),
        }
    }
}

/// 组装单个方法的处理函数：绑定参数、逐次实例化、调用并包装失败。
fn build_handler<S: Send + 'static>(
    service_id: String,
    signature: MethodSignature,
    factory: InstanceFactory<S>,
    method: Method<S>,
    converter: Arc<dyn TypeConverter>,
) -> Handler {
    let service_id: Arc<str> = Arc::from(service_id);
    let signature = Arc::new(signature);
    Arc::new(move |parameters: Parameters, cancellation: Cancellation| {
        let service_id = Arc::clone(&service_id);
        let bound = bind(&signature, converter.as_ref(), parameters, &cancellation);
        let factory = Arc::clone(&factory);
        let method = Arc::clone(&method);
        async move {
            let arguments = match bound {
                Ok(arguments) => arguments,
                Err(err) => {
                    warn!(
                        service_id = %service_id,
                        code = err.code(),
                        error = %err,
                        "parameter binding failed"
                    );
                    return Err(err);
                }
            };
            if cancellation.is_cancelled() {
                return Err(RpcError::Cancelled);
            }
            debug!(service_id = %service_id, arguments = arguments.len(), "dispatching service call");
            let call = async move {
                match factory() {
                    Ok(instance) => method(instance, arguments).await,
                    Err(err) => Err(err),
                }
            };
            let outcome = match AssertUnwindSafe(call).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => Err(panic_error(panic)),
            };
            outcome.map_err(|source| {
                warn!(service_id = %service_id, error = %source, "service method failed");
                RpcError::RemoteInvocationFailed {
                    service_id: service_id.to_string(),
                    source,
                }
            })
        }
        .boxed()
    })
}

fn panic_error(panic: Box<dyn Any + Send>) -> BoxError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_owned());
    format!("service method panicked: {message}").into()
}
