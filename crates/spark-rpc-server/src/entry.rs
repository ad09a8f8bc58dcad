use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use spark_rpc_core::{BoxError, Cancellation, MethodSignature, Parameters, Result, ServiceDescriptor};

/// 分发表对外暴露的调用入口：`(参数映射, 取消令牌) → 结果`。
pub type Handler = Arc<dyn Fn(Parameters, Cancellation) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// 一个已注册方法的可调用单元。
///
/// # 契约说明（What）
/// - 启动时构建一次，之后不可变，可被并发调用；
/// - `descriptor.id` 即线上服务 Id，传输层监听器据此把入站消息交给 [`Self::handler`]；
/// - `signature` 保留注册时声明的参数顺序与绑定方式，便于诊断。
#[derive(Clone)]
pub struct ServiceEntry {
    pub descriptor: ServiceDescriptor,
    pub signature: MethodSignature,
    pub handler: Handler,
}

impl ServiceEntry {
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    /// 以给定参数与取消令牌调用一次。
    pub fn invoke(&self, parameters: Parameters, cancellation: Cancellation) -> BoxFuture<'static, Result<Value>> {
        (self.handler)(parameters, cancellation)
    }
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("descriptor", &self.descriptor)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Argument {
    Value(Value),
    Cancellation(Cancellation),
}

/// 按声明顺序绑定好的实参。
///
/// 值参数已按声明类型转换；取消参数是本次调用的令牌。下标越界或种类不符时返回错误，
/// 该错误会作为实现抛出的错误包装进 `RemoteInvocationFailed`。
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    values: Vec<Argument>,
}

impl Arguments {
    pub(crate) fn new(values: Vec<Argument>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 第 `index` 个参数的原始值。
    pub fn raw(&self, index: usize) -> Option<&Value> {
        match self.values.get(index) {
            Some(Argument::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// 把第 `index` 个参数反序列化为 `T`。
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> std::result::Result<T, BoxError> {
        let value = self
            .raw(index)
            .ok_or_else(|| format!("argument {index} is not a value parameter"))?;
        Ok(T::deserialize(value)?)
    }

    /// 第 `index` 个参数绑定的取消令牌。
    pub fn cancellation(&self, index: usize) -> std::result::Result<Cancellation, BoxError> {
        match self.values.get(index) {
            Some(Argument::Cancellation(token)) => Ok(token.clone()),
            _ => Err(format!("argument {index} is not a cancellation parameter").into()),
        }
    }
}
