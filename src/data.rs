//! 坐标点的数据格式，以及从外部读入的原始格式。
//!

use crate::Error;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

/// 一个地理坐标点。优先级只在 `is_priority` 为真时有意义，数字越小越先访问
///
/// 从 YAML 或 JSON 读入时，没有写 `is_priority` 的点按 `priority > 0` 判断，和 CSV 一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SerializedWaypoint")]
pub struct Waypoint {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub priority: u32,
    pub is_priority: bool,
}

#[derive(Deserialize)]
struct SerializedWaypoint {
    id: Option<String>,
    lat: f64,
    lng: f64,
    name: String,
    #[serde(default)]
    priority: u32,
    #[serde(alias = "isPriority")]
    is_priority: Option<bool>,
}

impl From<SerializedWaypoint> for Waypoint {
    fn from(value: SerializedWaypoint) -> Self {
        let SerializedWaypoint {
            id,
            lat,
            lng,
            name,
            priority,
            is_priority,
        } = value;
        Self {
            id: id
                .filter(|x| !x.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            lat,
            lng,
            name,
            priority,
            is_priority: is_priority.unwrap_or(priority > 0),
        }
    }
}

impl Waypoint {
    pub fn new(name: &str, lat: f64, lng: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            lat,
            lng,
            name: name.to_string(),
            priority: 0,
            is_priority: false,
        }
    }

    /// 把该点标记为优先点
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self.is_priority = true;
        self
    }

    fn check(&self) -> Result<(), Error> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::InvalidWaypoint(format!(
                "{} 的纬度 {} 超出范围",
                self.name, self.lat
            )));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(Error::InvalidWaypoint(format!(
                "{} 的经度 {} 超出范围",
                self.name, self.lng
            )));
        }
        if self.is_priority && self.priority == 0 {
            return Err(Error::InvalidWaypoint(format!(
                "{} 被标记为优先点，但优先级不是正整数",
                self.name
            )));
        }
        Ok(())
    }
}

/// 坐标点表中的一行：name, lat, lng, priority，可选 id
///
/// priority 为空或者为 0 表示普通点
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawWaypoint {
    pub id: Option<String>,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub priority: Option<u32>,
}

impl From<RawWaypoint> for Waypoint {
    fn from(value: RawWaypoint) -> Self {
        let RawWaypoint {
            id,
            name,
            lat,
            lng,
            priority,
        } = value;
        let priority = priority.unwrap_or(0);
        Self {
            id: id
                .filter(|x| !x.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            lat,
            lng,
            name,
            priority,
            is_priority: priority > 0,
        }
    }
}

/// 从 CSV 文本中读取坐标点，第一行为表头
pub fn read_waypoints<R: std::io::Read>(reader: R) -> Result<Vec<Waypoint>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut waypoints = vec![];
    for row in reader.deserialize::<RawWaypoint>() {
        waypoints.push(row?.into());
    }
    Ok(waypoints)
}

/// 一次优化过程中使用的坐标点快照，创建后不再改变
///
/// 优先点按优先级升序排列，优先级相同的按输入顺序排列
#[derive(Debug, Clone)]
pub struct Waypoints {
    points: Vec<Waypoint>,
    priority: Vec<usize>,
    regular: Vec<usize>,
}

impl Waypoints {
    pub fn new(points: Vec<Waypoint>) -> Result<Self, Error> {
        if points.len() < 2 {
            return Err(Error::InsufficientInput {
                found: points.len(),
            });
        }
        let mut ids = FxHashSet::default();
        for point in &points {
            point.check()?;
            if !ids.insert(point.id.as_str()) {
                return Err(Error::InvalidWaypoint(format!("标识 {} 重复", point.id)));
            }
        }
        let mut priority: Vec<usize> = (0..points.len())
            .filter(|&index| points[index].is_priority)
            .collect();
        priority.sort_by_key(|&index| points[index].priority);
        let regular = (0..points.len())
            .filter(|&index| !points[index].is_priority)
            .collect();
        Ok(Self {
            points,
            priority,
            regular,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> &Waypoint {
        &self.points[index]
    }

    pub fn points(&self) -> &[Waypoint] {
        &self.points
    }

    /// 优先点的下标，已按优先级排好序
    pub fn priority(&self) -> &[usize] {
        &self.priority
    }

    /// 普通点的下标，按输入顺序
    pub fn regular(&self) -> &[usize] {
        &self.regular
    }
}

/// 孟加拉国几个主要城市，用于快速添加坐标点
pub fn presets() -> Vec<Waypoint> {
    [
        ("Dhaka", 23.6850, 90.3563),
        ("Chittagong", 22.3569, 91.7832),
        ("Sylhet", 24.8949, 91.8687),
        ("Rajshahi", 24.3745, 88.6042),
        ("Khulna", 22.8456, 89.5403),
        ("Barisal", 22.7010, 90.3535),
    ]
    .into_iter()
    .map(|(name, lat, lng)| Waypoint {
        id: name.to_lowercase(),
        lat,
        lng,
        name: name.to_string(),
        priority: 0,
        is_priority: false,
    })
    .collect()
}
