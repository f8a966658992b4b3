//! libroute 是使用 Rust 实现的带优先级约束的路径优化算法。给定一组地理坐标点，其中一部分被标记为优先点，本库会先按优先级依次访问所有优先点，再用遗传算法寻找其余普通点的近似最短访问顺序。
//!
//! route 是使用 libroute 实现的命令行程序，用户提供坐标点表和配置文件，本程序能够评测路径长度、优化访问顺序，也可以作为 HTTP 服务运行。libroute 同时可以编译为 WebAssembly 供浏览器调用。

pub mod config;
pub mod data;
pub mod interfaces;
pub mod objectives;
pub mod operators;
pub mod optimizers;
pub mod problem;
pub mod representation;
pub mod server;

use std::fmt::Display;

pub use data::Waypoint;
pub use interfaces::{Interface, Message};
pub use optimizers::{CancellationToken, OptimizationResult, Outcome, RouteOptimizer};

/// 错误类型
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// 坐标点少于两个，无法优化
    InsufficientInput { found: usize },
    /// 优化参数超出取值范围
    InvalidConfiguration(String),
    /// 坐标点本身不合法
    InvalidWaypoint(String),
    /// 读写文件、解析输入时出现的错误
    Input(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InsufficientInput { found } => {
                write!(f, "至少需要 2 个坐标点才能优化，当前只有 {found} 个")
            }
            Error::InvalidConfiguration(message) => write!(f, "优化参数不合法：{message}"),
            Error::InvalidWaypoint(message) => write!(f, "坐标点不合法：{message}"),
            Error::Input(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self::Input(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Self::Input(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Input(format!("读写文件失败：{value}"))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Input(format!("配置文件解析错误：{value}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Input(format!("JSON 解析错误：{value}"))
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Self::Input(format!("坐标点表解析错误：{value}"))
    }
}
