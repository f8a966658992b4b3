// 路径的评测结果以及输出到命令行的方式

use crate::data::Waypoint;
use serde::Serialize;
use std::fmt::Display;

#[derive(Debug, Clone, Serialize)]
pub struct RouteMetric {
    pub stops: Vec<Waypoint>,
    pub total_distance: f64,
}

impl Display for RouteMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, point) in self.stops.iter().enumerate() {
            let marker = if point.is_priority {
                format!(" [优先 {}]", point.priority)
            } else {
                String::new()
            };
            writeln!(
                f,
                "{}. {} ({:.4}, {:.4}){}",
                index + 1,
                point.name,
                point.lat,
                point.lng,
                marker
            )?;
        }
        writeln!(f, "总距离：{:.1} km", self.total_distance)
    }
}
