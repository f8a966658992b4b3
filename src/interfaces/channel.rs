//! 在后台线程中运行优化，并通过通道把消息交给另一个线程
//!

use super::{Interface, Message};
use crate::optimizers::{CancellationToken, OptimizationResult, RouteOptimizer};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// 把消息发送到通道中；接收端关闭后消息被直接丢弃
#[derive(Debug, Clone)]
pub struct ChannelInterface {
    sender: UnboundedSender<Message>,
}

impl ChannelInterface {
    pub fn new(sender: UnboundedSender<Message>) -> Self {
        Self { sender }
    }
}

impl Interface for ChannelInterface {
    fn post(&self, message: Message) {
        let _ = self.sender.send(message);
    }
}

/// 正在后台运行的一次优化
pub struct OptimizationHandle {
    pub messages: UnboundedReceiver<Message>,
    pub cancellation: CancellationToken,
    pub task: JoinHandle<OptimizationResult>,
}

impl OptimizationHandle {
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }
}

/// 在 tokio 的阻塞线程池中运行优化，调用者可以在任意时刻读取进度或者取消
pub fn spawn_optimization(optimizer: RouteOptimizer) -> OptimizationHandle {
    spawn_optimization_with(optimizer, CancellationToken::new())
}

/// 和 spawn_optimization 相同，但使用调用者事先准备好的取消标记
pub fn spawn_optimization_with(
    optimizer: RouteOptimizer,
    cancellation: CancellationToken,
) -> OptimizationHandle {
    let (sender, messages) = unbounded_channel();
    let token = cancellation.clone();
    let task = tokio::task::spawn_blocking(move || {
        let interface = ChannelInterface::new(sender);
        let mut rng = optimizer.make_rng();
        optimizer.optimize_with(&mut rng, &interface, &token)
    });
    OptimizationHandle {
        messages,
        cancellation,
        task,
    }
}
