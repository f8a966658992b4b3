//! HTTP 服务：在后台运行优化，通过 SSE 推送进度
//!
//! 同一时刻只允许一次优化运行。优化在 tokio 的阻塞线程池中进行，进度消息经由通道转发到广播，再推送给所有 SSE 连接。

use crate::config::GeneticConfig;
use crate::data::{presets, Waypoint};
use crate::interfaces::channel::{spawn_optimization_with, OptimizationHandle};
use crate::interfaces::Message;
use crate::objectives::metric::RouteMetric;
use crate::optimizers::{CancellationToken, OptimizationResult, RouteExport, RouteOptimizer};
use crate::problem::RouteProblem;
use crate::Error;
use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

/// HTTP API 响应类型
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ApiResponse<T> {
    #[serde(rename = "success")]
    Success { result: T },
    #[serde(rename = "error")]
    Error { error: String },
}

impl<T> From<Result<T, Error>> for ApiResponse<T> {
    fn from(value: Result<T, Error>) -> Self {
        match value {
            Ok(result) => ApiResponse::Success { result },
            Err(error) => ApiResponse::Error {
                error: error.to_string(),
            },
        }
    }
}

/// 优化状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OptimizationStatus {
    Idle,
    Running { message: Option<Message> },
    Completed { final_message: Option<Message> },
    Cancelled { final_message: Option<Message> },
    Failed { error: String },
}

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub optimization_status: Arc<RwLock<OptimizationStatus>>,
    /// 最近一次结束的优化结果
    pub result: Arc<RwLock<Option<OptimizationResult>>>,
    pub cancellation: Arc<RwLock<Option<CancellationToken>>>,
    pub status_broadcast: broadcast::Sender<OptimizationStatus>,
}

impl AppState {
    pub fn new() -> Self {
        let (status_broadcast, _) = broadcast::channel(100);
        Self {
            optimization_status: Arc::new(RwLock::new(OptimizationStatus::Idle)),
            result: Arc::new(RwLock::new(None)),
            cancellation: Arc::new(RwLock::new(None)),
            status_broadcast,
        }
    }

    async fn publish(&self, status: OptimizationStatus) {
        *self.optimization_status.write().await = status.clone();
        // 没有 SSE 连接时发送会失败，可以忽略
        let _ = self.status_broadcast.send(status);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub points: Vec<Waypoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub points: Vec<Waypoint>,
    #[serde(default)]
    pub options: GeneticConfig,
}

/// HTTP API: 验证优化参数，返回补全了默认值的参数
pub async fn validate_config(
    Json(options): Json<serde_json::Value>,
) -> Json<ApiResponse<GeneticConfig>> {
    info!("POST /api/validate");
    let parsed = serde_json::from_value::<GeneticConfig>(options)
        .map_err(Error::from)
        .and_then(|config| config.validate().map(|_| config));
    Json(parsed.into())
}

/// HTTP API: 计算不经优化的路径长度
pub async fn evaluate(Json(request): Json<EvaluateRequest>) -> Json<ApiResponse<RouteMetric>> {
    info!("POST /api/evaluate");
    let metric = RouteProblem::new(request.points)
        .map(|problem| problem.metric(&problem.initial_route()));
    Json(metric.into())
}

/// HTTP API: 内置的城市坐标
pub async fn list_presets() -> Json<ApiResponse<Vec<Waypoint>>> {
    Json(ApiResponse::Success { result: presets() })
}

/// HTTP API: 当前状态
pub async fn get_status(State(state): State<AppState>) -> Json<OptimizationStatus> {
    Json(state.optimization_status.read().await.clone())
}

/// HTTP API: 开始优化（异步），已有优化在运行时拒绝
pub async fn start_optimize(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRequest>,
) -> Json<ApiResponse<String>> {
    info!("POST /api/optimize");
    let optimizer = match RouteOptimizer::new(request.points, request.options) {
        Ok(optimizer) => optimizer,
        Err(error) => {
            return Json(ApiResponse::Error {
                error: error.to_string(),
            })
        }
    };

    info!(
        "收到 {} 个坐标点，共 {} 代",
        optimizer.problem().waypoints().len(),
        optimizer.config().generations
    );

    // 检查状态、登记取消标记、广播运行状态必须在同一个写锁内完成，
    // 这样收到 Running 的客户端总能取消这次优化
    let cancellation = CancellationToken::new();
    {
        let mut status = state.optimization_status.write().await;
        if matches!(*status, OptimizationStatus::Running { .. }) {
            return Json(ApiResponse::Error {
                error: "优化已在进行中".to_string(),
            });
        }
        *state.cancellation.write().await = Some(cancellation.clone());
        *status = OptimizationStatus::Running { message: None };
        let _ = state.status_broadcast.send(status.clone());
    }

    let OptimizationHandle {
        mut messages, task, ..
    } = spawn_optimization_with(optimizer, cancellation);

    tokio::spawn(async move {
        let mut last = None;
        while let Some(message) = messages.recv().await {
            last = Some(message.clone());
            state
                .publish(OptimizationStatus::Running {
                    message: Some(message),
                })
                .await;
        }
        let final_status = match task.await {
            Ok(result) => {
                let status = if result.is_cancelled() {
                    OptimizationStatus::Cancelled {
                        final_message: last,
                    }
                } else {
                    OptimizationStatus::Completed {
                        final_message: last,
                    }
                };
                *state.result.write().await = Some(result);
                status
            }
            Err(error) => {
                warn!("优化任务崩溃：{error}");
                OptimizationStatus::Failed {
                    error: format!("任务崩溃：{error}"),
                }
            }
        };
        *state.cancellation.write().await = None;
        state.publish(final_status).await;
    });

    Json(ApiResponse::Success {
        result: "优化已启动".to_string(),
    })
}

/// HTTP API: 取消正在进行的优化
pub async fn cancel_optimize(State(state): State<AppState>) -> Json<ApiResponse<String>> {
    info!("POST /api/cancel");
    match state.cancellation.read().await.as_ref() {
        Some(token) => {
            token.cancel();
            Json(ApiResponse::Success {
                result: "已请求取消".to_string(),
            })
        }
        None => Json(ApiResponse::Error {
            error: "没有正在进行的优化".to_string(),
        }),
    }
}

/// HTTP API: 最近一次优化的结果
pub async fn get_result(State(state): State<AppState>) -> Json<ApiResponse<RouteExport>> {
    match state.result.read().await.as_ref() {
        Some(result) => Json(ApiResponse::Success {
            result: result.to_export(),
        }),
        None => Json(ApiResponse::Error {
            error: "还没有优化结果".to_string(),
        }),
    }
}

/// SSE 处理函数：先发送当前状态，之后转发每一次状态变化
pub async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let initial_status = state.optimization_status.read().await.clone();
    let receiver = state.status_broadcast.subscribe();
    info!("[SSE] 连接建立");
    let updates = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(status) => return Some((status, receiver)),
                // 客户端太慢时跳过积压的进度，只要后面的状态还能送达
                Err(RecvError::Lagged(skipped)) => {
                    warn!("[SSE] 跳过了 {skipped} 条消息");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });
    let stream = stream::once(async move { initial_status })
        .chain(updates)
        .map(|status| {
            let json = serde_json::to_string(&status).unwrap_or_default();
            Ok(Event::default().data(json))
        });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// 主页面
pub async fn index() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>libroute API 服务器</title></head>
<body>
    <h1>libroute API 服务器</h1>
    <ul>
        <li><code>POST /api/validate</code> - 验证优化参数</li>
        <li><code>POST /api/evaluate</code> - 计算路径长度</li>
        <li><code>POST /api/optimize</code> - 开始优化</li>
        <li><code>POST /api/cancel</code> - 取消优化</li>
        <li><code>GET /api/status</code> - 当前状态</li>
        <li><code>GET /api/result</code> - 优化结果</li>
        <li><code>GET /api/presets</code> - 内置城市</li>
        <li><code>GET /sse/status</code> - SSE 实时状态推送</li>
    </ul>
</body>
</html>"#,
    )
}

pub fn create_app() -> Router {
    create_app_with_state(AppState::new())
}

pub fn create_app_with_state(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    Router::new()
        .route("/", get(index))
        .route("/api/validate", post(validate_config))
        .route("/api/evaluate", post(evaluate))
        .route("/api/optimize", post(start_optimize))
        .route("/api/cancel", post(cancel_optimize))
        .route("/api/status", get(get_status))
        .route("/api/result", get(get_result))
        .route("/api/presets", get(list_presets))
        .route("/sse/status", get(sse_handler))
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .layer(TimeoutLayer::new(Duration::from_secs(600)))
        .layer(cors)
        .with_state(state)
}

/// 尝试绑定首选端口，被占用时由系统分配
async fn bind_available_port(preferred_port: u16) -> Result<tokio::net::TcpListener, Error> {
    match tokio::net::TcpListener::bind(("0.0.0.0", preferred_port)).await {
        Ok(listener) => Ok(listener),
        Err(error) => {
            info!("端口 {preferred_port} 已被占用：{error}");
            Ok(tokio::net::TcpListener::bind(("0.0.0.0", 0)).await?)
        }
    }
}

/// 启动服务器
pub async fn start_server(port: u16) -> Result<(), Error> {
    let app = create_app();
    let listener = bind_available_port(port).await?;
    let actual_port = listener.local_addr()?.port();
    info!("Listening on: http://127.0.0.1:{actual_port}");
    axum::serve(listener, app).await?;
    Ok(())
}
