/// 生成通道限定的解析键：有通道时为 `channel/serviceId`，否则原样返回服务 Id。
///
/// 该键只用于地址解析，永远不会出现在线上消息中。
pub fn service_id_with_channel(service_id: &str, channel: Option<&str>) -> String {
    match channel {
        Some(channel) if !channel.is_empty() => format!("{channel}/{service_id}"),
        _ => service_id.to_owned(),
    }
}
