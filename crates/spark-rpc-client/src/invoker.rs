use std::future::Future;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use spark_rpc_core::{
    Address, AddressResolver, Cancellation, HealthReporter, InvokeContext, InvokeMessage,
    InvokeResultMessage, Result, RpcError, TransportClientFactory,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// 客户端调用管线。
///
/// # 教案式解读
/// - **意图（Why）**：调用方只给出逻辑服务 Id，管线负责找到地址、取得传输客户端、发送消息，
///   并在通信失败时通知健康追踪方，让下一次解析避开失效地址；
/// - **执行逻辑（How）**：
///   1. 校验上下文：消息缺失或服务 Id 为空时立即以 `InvalidArgument` 失败；
///   2. 以解析键（通道限定 Id 优先）向 [`AddressResolver`] 解析地址，与取消信号竞争；
///   3. 剥离解析键得到线上消息，按端点从 [`TransportClientFactory`] 取客户端并发送；
///   4. 通信失败时把地址投递给后台上报队列，随后立即原样返回原始错误；其他失败记录解析键后
///      原样返回；
/// - **契约（What）**：
///   - 校验失败与解析失败都发生在任何网络 I/O 之前；
///   - 取消在解析完成前生效时返回 `Cancelled`，不会发送任何消息；
///   - 传输客户端在调用结束（含取消）时被丢弃，即归还给池；
///   - 健康上报从不阻塞调用方，上报方挂起或失败都不会延迟错误返回；
///   - 不做重试、退避或熔断。
pub struct RemoteInvoker {
    resolver: Arc<dyn AddressResolver>,
    clients: Arc<dyn TransportClientFactory>,
    reports: HealthReports,
}

impl RemoteInvoker {
    /// 构建调用管线并启动健康上报工作者。
    ///
    /// 在 Tokio 运行时内构建时工作者是该运行时上的任务，否则运行在独立线程上。
    pub fn new(
        resolver: Arc<dyn AddressResolver>,
        clients: Arc<dyn TransportClientFactory>,
        health: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            resolver,
            clients,
            reports: HealthReports::start(health),
        }
    }

    /// 执行一次远程调用。
    pub async fn invoke(
        &self,
        context: InvokeContext,
        cancellation: Option<&Cancellation>,
    ) -> Result<InvokeResultMessage> {
        let scoped = context
            .message
            .ok_or(RpcError::InvalidArgument { field: "message" })?;
        if scoped.service_id().is_empty() {
            return Err(RpcError::InvalidArgument {
                field: "service_id",
            });
        }

        let resolution_key = scoped.resolution_key().to_owned();
        let address = match self.resolve(&resolution_key, cancellation).await {
            Ok(address) => address,
            Err(err) => {
                log_failure(&resolution_key, &err);
                return Err(err);
            }
        };

        match self.send(&address, scoped.into_wire(), cancellation).await {
            Ok(result) => {
                debug!(resolution_key = %resolution_key, address = %address, "remote call completed");
                Ok(result)
            }
            Err(err) if err.is_communication() => {
                warn!(
                    resolution_key = %resolution_key,
                    address = %address,
                    error = %err,
                    "communication failure, reporting address to health tracking"
                );
                self.reports.submit(address);
                Err(err)
            }
            Err(err) => {
                log_failure(&resolution_key, &err);
                Err(err)
            }
        }
    }

    async fn resolve(
        &self,
        resolution_key: &str,
        cancellation: Option<&Cancellation>,
    ) -> Result<Address> {
        until_cancelled(cancellation, self.resolver.resolve(resolution_key))
            .await??
            .ok_or_else(|| RpcError::ServiceUnresolved {
                key: resolution_key.to_owned(),
            })
    }

    async fn send(
        &self,
        address: &Address,
        message: InvokeMessage,
        cancellation: Option<&Cancellation>,
    ) -> Result<InvokeResultMessage> {
        let endpoint = address.endpoint()?;
        let client = self.clients.client_for(endpoint)?;
        debug!(service_id = %message.service_id, %endpoint, "sending invoke message");
        until_cancelled(cancellation, client.send(message)).await?
    }
}

/// 健康失败上报队列：调用路径只入队，后台工作者并发驱动各条上报。
struct HealthReports {
    queue: mpsc::UnboundedSender<Address>,
}

impl HealthReports {
    fn start(health: Arc<dyn HealthReporter>) -> Self {
        let (queue, pending) = mpsc::unbounded_channel();
        let worker = drain_reports(health, pending);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(worker);
            }
            Err(_) => {
                let spawned = std::thread::Builder::new()
                    .name("spark-rpc-health".into())
                    .spawn(move || futures::executor::block_on(worker));
                if let Err(err) = spawned {
                    warn!(error = %err, "failed to start health report worker");
                }
            }
        }
        Self { queue }
    }

    fn submit(&self, address: Address) {
        if let Err(rejected) = self.queue.send(address) {
            warn!(address = %rejected.0, "health report worker stopped, failure report dropped");
        }
    }
}

/// 队列关闭（管线被丢弃）后等待在途上报结束再退出。
async fn drain_reports(health: Arc<dyn HealthReporter>, mut pending: mpsc::UnboundedReceiver<Address>) {
    let mut in_flight = FuturesUnordered::new();
    loop {
        tokio::select! {
            biased;
            Some(()) = in_flight.next(), if !in_flight.is_empty() => {}
            next = pending.recv() => match next {
                Some(address) => in_flight.push(report_once(Arc::clone(&health), address)),
                None => break,
            },
        }
    }
    while in_flight.next().await.is_some() {}
}

/// 上报本身失败只记录日志，不影响原始错误。
async fn report_once(health: Arc<dyn HealthReporter>, address: Address) {
    if let Err(err) = health.report_failure(&address).await {
        warn!(address = %address, error = %err, "health failure report failed");
    }
}

/// 让 `future` 与取消信号竞争；已取消的令牌不会让 `future` 被轮询。
async fn until_cancelled<F: Future>(
    cancellation: Option<&Cancellation>,
    future: F,
) -> Result<F::Output> {
    let Some(token) = cancellation else {
        return Ok(future.await);
    };
    tokio::select! {
        biased;
        () = token.cancelled() => Err(RpcError::Cancelled),
        output = future => Ok(output),
    }
}

fn log_failure(resolution_key: &str, err: &RpcError) {
    if matches!(err, RpcError::Cancelled) {
        debug!(resolution_key = %resolution_key, "remote call cancelled");
    } else {
        error!(
            resolution_key = %resolution_key,
            code = err.code(),
            error = %err,
            "remote call failed"
        );
    }
}
