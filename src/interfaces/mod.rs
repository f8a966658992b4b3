use serde::{Deserialize, Serialize};

pub mod channel;
pub mod command_line;
pub mod web;

/// 向用户反馈的消息类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// 每完成一代发送一次，`progress` 为百分比
    Progress {
        generation: usize,
        progress: f64,
        best_distance: f64,
    },
    BetterSolution {
        generation: usize,
        distance: f64,
        fitness: f64,
    },
    /// 第一代的用时，单位为微秒
    Elapsed {
        time: u64,
    },
    Finished {
        generation: usize,
        distance: f64,
        cancelled: bool,
    },
}

/// 定义了向用户报告消息的接口，用于统一命令行、图形界面和服务器的输出方式
///
/// 各个界面只需要实现 post 方法，就可向用户报告优化进度。报告失败不能影响优化结果，所以 post 不返回错误
pub trait Interface {
    fn post(&self, message: Message);

    /// 每隔若干代调用一次，界面可以借机刷新输出
    fn checkpoint(&self) {}
}

/// 不需要任何反馈时使用
impl Interface for () {
    fn post(&self, _message: Message) {}
}
