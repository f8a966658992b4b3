use super::Objective;
use crate::data::{Waypoint, Waypoints};

/// 地球半径，单位为千米
pub const EARTH_RADIUS: f64 = 6371.0;

/// 用半正矢公式计算两点之间的大圆距离
pub fn haversine(a: &Waypoint, b: &Waypoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + (d_lng / 2.0).sin().powi(2) * (lat1.cos() * lat2.cos());
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS * c
}

/// 默认目标函数：预先算好所有点对之间的距离
#[derive(Debug, Clone)]
pub struct TourObjective {
    size: usize,
    matrix: Vec<f64>,
}

impl TourObjective {
    pub fn new(waypoints: &Waypoints) -> Self {
        let points = waypoints.points();
        let size = points.len();
        let mut matrix = vec![0.0; size * size];
        for i in 0..size {
            for j in (i + 1)..size {
                let distance = haversine(&points[i], &points[j]);
                matrix[i * size + j] = distance;
                matrix[j * size + i] = distance;
            }
        }
        Self { size, matrix }
    }
}

impl Objective for TourObjective {
    #[inline(always)]
    fn distance(&self, from: usize, to: usize) -> f64 {
        self.matrix[from * self.size + to]
    }
}
