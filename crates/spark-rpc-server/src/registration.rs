use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use spark_rpc_core::{BoxError, MethodSignature};

use crate::entry::Arguments;

pub(crate) type InstanceFactory<S> = Arc<dyn Fn() -> Result<S, BoxError> + Send + Sync>;
pub(crate) type Method<S> =
    Arc<dyn Fn(S, Arguments) -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync>;

/// 一个服务实现的显式注册：实例工厂加上逐个声明的方法。
///
/// # 教案式解读
/// - **意图（Why）**：用启动期的显式注册表代替运行时扫描实现类型；
/// - **执行逻辑（How）**：
///   - `factory` 在每次调用时执行一次，产出本次调用独占的实例；
///   - 实例按值交给方法，方法返回（或其 future 被丢弃）时实例随之释放，覆盖成功、失败与取消；
///   - 同步方法的结果被包装成已完成的异步结果；
/// - **契约（What）**：方法返回值需可序列化为 JSON 值；方法或工厂的错误会被分发表包装为
///   `RemoteInvocationFailed`。
pub struct ServiceRegistration<S> {
    pub(crate) factory: InstanceFactory<S>,
    pub(crate) methods: Vec<(MethodSignature, Method<S>)>,
}

impl<S: Send + 'static> ServiceRegistration<S> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<S, BoxError> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            methods: Vec::new(),
        }
    }

    /// 以 `Default` 构造每次调用的实例。
    pub fn with_default() -> Self
    where
        S: Default,
    {
        Self::new(|| Ok(S::default()))
    }

    /// 注册一个异步方法。
    #[must_use]
    pub fn method<F, Fut, R>(mut self, signature: MethodSignature, method: F) -> Self
    where
        F: Fn(S, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, BoxError>> + Send + 'static,
        R: Serialize + 'static,
    {
        let method: Method<S> = Arc::new(move |instance, arguments| {
            method(instance, arguments)
                .map(|outcome| outcome.and_then(to_value))
                .boxed()
        });
        self.methods.push((signature, method));
        self
    }

    /// 注册一个同步方法。
    #[must_use]
    pub fn sync_method<F, R>(mut self, signature: MethodSignature, method: F) -> Self
    where
        F: Fn(S, Arguments) -> Result<R, BoxError> + Send + Sync + 'static,
        R: Serialize + 'static,
    {
        let method = Arc::new(method);
        let method: Method<S> = Arc::new(move |instance, arguments| {
            let method = Arc::clone(&method);
            async move { method(instance, arguments).and_then(to_value) }.boxed()
        });
        self.methods.push((signature, method));
        self
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

fn to_value<R: Serialize>(result: R) -> Result<Value, BoxError> {
    Ok(serde_json::to_value(result)?)
}
