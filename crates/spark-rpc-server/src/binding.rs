use spark_rpc_core::{
    Cancellation, MethodSignature, ParameterKind, Parameters, Result, RpcError, TypeConverter,
};

use crate::entry::{Argument, Arguments};

/// 按声明顺序构造实参。
///
/// # 执行逻辑（How）
/// - 值参数按参数名从入站映射中取出，经 `converter` 转换为声明类型；
/// - 取消参数按种类绑定为 `cancellation`，不读取入站映射，与它在签名中的位置无关；
/// - 入站映射里多余的键被忽略。
///
/// # 契约说明（What）
/// - 缺少参数时返回 `MissingParameter`，转换失败时返回携带期望/实际类型的 `ParameterConversion`；
/// - 任一参数失败即返回，不会构造部分实参。
pub(crate) fn bind(
    signature: &MethodSignature,
    converter: &dyn TypeConverter,
    mut parameters: Parameters,
    cancellation: &Cancellation,
) -> Result<Arguments> {
    let mut bound = Vec::with_capacity(signature.parameters.len());
    for parameter in &signature.parameters {
        let argument = match parameter.kind {
            ParameterKind::Cancellation => Argument::Cancellation(cancellation.clone()),
            ParameterKind::Value(target) => {
                let value = parameters
                    .remove(&parameter.name)
                    .ok_or_else(|| RpcError::MissingParameter {
                        name: parameter.name.clone(),
                    })?;
                let converted =
                    converter
                        .convert(value, target)
                        .map_err(|err| RpcError::ParameterConversion {
                            name: parameter.name.clone(),
                            expected: err.expected.to_string(),
                            actual: err.actual.to_owned(),
                            detail: err.detail,
                        })?;
                Argument::Value(converted)
            }
        };
        bound.push(argument);
    }
    Ok(Arguments::new(bound))
}
