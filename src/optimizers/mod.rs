//! 优化方法接口，以及遗传算法的实现
//!

use crate::config::{GeneticConfig, SolverConfig};
use crate::data::Waypoint;
use crate::interfaces::Interface;
use crate::objectives::metric::RouteMetric;
use crate::problem::RouteProblem;
use crate::Error;
use genetic::Genetic;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub mod genetic;

pub trait Metaheuristic {
    fn solve<R: Rng>(
        &self,
        problem: &RouteProblem,
        rng: &mut R,
        interface: &dyn Interface,
        cancellation: &CancellationToken,
    ) -> OptimizationResult;
}

/// 用于从外部提前结束一次优化，可以跨线程克隆
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    Cancelled,
}

/// 整个优化过程中见过的最优路径
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub route: Vec<Waypoint>,
    pub total_distance: f64,
    pub generation: usize,
    pub fitness: f64,
    pub outcome: Outcome,
}

/// 导出为 JSON 时每一站的格式
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedStop {
    pub order: usize,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub priority: u32,
    pub is_priority: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteExport {
    pub total_distance: f64,
    pub route: Vec<ExportedStop>,
}

impl OptimizationResult {
    pub fn is_cancelled(&self) -> bool {
        self.outcome == Outcome::Cancelled
    }

    pub fn metric(&self) -> RouteMetric {
        RouteMetric {
            stops: self.route.clone(),
            total_distance: self.total_distance,
        }
    }

    pub fn to_export(&self) -> RouteExport {
        let route = self
            .route
            .iter()
            .enumerate()
            .map(|(index, point)| ExportedStop {
                order: index + 1,
                name: point.name.clone(),
                latitude: point.lat,
                longitude: point.lng,
                priority: point.priority,
                is_priority: point.is_priority,
            })
            .collect();
        RouteExport {
            total_distance: self.total_distance,
            route,
        }
    }
}

impl SolverConfig {
    pub fn solve<R: Rng>(
        &self,
        problem: &RouteProblem,
        rng: &mut R,
        interface: &dyn Interface,
        cancellation: &CancellationToken,
    ) -> Result<OptimizationResult, Error> {
        match self {
            SolverConfig::Genetic(config) => {
                let genetic = Genetic::new(config.clone())?;
                Ok(genetic.solve(problem, rng, interface, cancellation))
            }
        }
    }
}

/// 路径优化器：在创建时固定坐标点快照和参数，之后每次调用 optimize 都是一次独立的优化
#[derive(Debug, Clone)]
pub struct RouteOptimizer {
    problem: RouteProblem,
    genetic: Genetic,
}

impl RouteOptimizer {
    pub fn new(points: Vec<Waypoint>, config: GeneticConfig) -> Result<Self, Error> {
        let problem = RouteProblem::new(points)?;
        let genetic = Genetic::new(config)?;
        Ok(Self { problem, genetic })
    }

    pub fn problem(&self) -> &RouteProblem {
        &self.problem
    }

    pub fn config(&self) -> &GeneticConfig {
        self.genetic.config()
    }

    pub fn make_rng(&self) -> StdRng {
        self.genetic.config().make_rng()
    }

    pub fn optimize(&self, interface: &dyn Interface) -> OptimizationResult {
        self.optimize_with(&mut self.make_rng(), interface, &CancellationToken::new())
    }

    pub fn optimize_with<R: Rng>(
        &self,
        rng: &mut R,
        interface: &dyn Interface,
        cancellation: &CancellationToken,
    ) -> OptimizationResult {
        self.genetic.solve(&self.problem, rng, interface, cancellation)
    }

    /// 每隔 report_interval 代让出一次控制权，适合在单线程的异步运行时中使用
    pub async fn optimize_async(
        &self,
        interface: &dyn Interface,
        cancellation: &CancellationToken,
    ) -> OptimizationResult {
        let mut rng = self.make_rng();
        self.genetic
            .solve_async(&self.problem, &mut rng, interface, cancellation)
            .await
    }
}
