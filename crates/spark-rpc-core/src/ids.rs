use crate::contract::ServiceIdGenerator;
use crate::signature::MethodSignature;

/// 默认服务 Id 生成策略：`{service}.{method}`，有参数时追加 `_` 连接的参数名。
///
/// 只依赖签名中的名称，因此同一签名在进程重启后得到相同的 Id。
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultServiceIdGenerator;

impl ServiceIdGenerator for DefaultServiceIdGenerator {
    fn id_for(&self, method: &MethodSignature) -> String {
        let mut id = format!("{}.{}", method.service, method.name);
        if !method.parameters.is_empty() {
            id.push('_');
            id.push_str(&method.parameter_names().collect::<Vec<_>>().join("_"));
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ParameterType;

    #[test]
    fn id_includes_parameter_names_in_order() {
        let signature = MethodSignature::new("Demo.IUserService", "GetUserName")
            .param("id", ParameterType::Integer)
            .cancellation("ct");
        assert_eq!(
            DefaultServiceIdGenerator.id_for(&signature),
            "Demo.IUserService.GetUserName_id_ct"
        );
    }

    #[test]
    fn parameterless_method_has_no_suffix() {
        let signature = MethodSignature::new("Demo.IUserService", "Try");
        assert_eq!(DefaultServiceIdGenerator.id_for(&signature), "Demo.IUserService.Try");
    }
}
