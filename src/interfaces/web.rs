use crate::config::GeneticConfig;
use crate::data::{presets as preset_waypoints, Waypoint};
use crate::interfaces::{Interface, Message};
use crate::optimizers::RouteOptimizer;
use crate::problem::RouteProblem;
use js_sys::Function;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::{prelude::*, JsError};

fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    let serializer = Serializer::json_compatible();
    Ok(value.serialize(&serializer)?)
}

/// 用于在图形界面验证输入的参数是否正确，返回补全了默认值的参数
#[wasm_bindgen]
pub fn validate(options: JsValue) -> Result<JsValue, JsError> {
    set_panic_hook();
    let config: GeneticConfig = if options.is_undefined() || options.is_null() {
        GeneticConfig::default()
    } else {
        from_value(options)?
    };
    config.validate()?;
    to_js(&config)
}

/// 内置的城市坐标
#[wasm_bindgen]
pub fn presets() -> Result<JsValue, JsError> {
    to_js(&preset_waypoints())
}

/// 通过图形界面来使用 libroute 的入口，实现了界面特征
///
/// 每条消息都会以普通 JS 对象的形式传给回调函数
#[wasm_bindgen]
pub struct Web {
    callback: Function,
}

#[wasm_bindgen]
impl Web {
    pub fn new(callback: Function) -> Web {
        set_panic_hook();
        Self { callback }
    }

    /// 计算不经优化的路径长度
    pub fn evaluate(&self, points: JsValue) -> Result<JsValue, JsError> {
        let points: Vec<Waypoint> = from_value(points)?;
        let problem = RouteProblem::new(points)?;
        to_js(&problem.metric(&problem.initial_route()))
    }

    /// 同步运行一次优化，进度通过回调函数报告，返回导出格式的结果
    pub fn optimize(&self, points: JsValue, options: JsValue) -> Result<JsValue, JsError> {
        let points: Vec<Waypoint> = from_value(points)?;
        let config: GeneticConfig = if options.is_undefined() || options.is_null() {
            GeneticConfig::default()
        } else {
            from_value(options)?
        };
        let optimizer = RouteOptimizer::new(points, config)?;
        let result = optimizer.optimize(self);
        to_js(&result.to_export())
    }
}

impl Interface for Web {
    fn post(&self, message: Message) {
        if let Ok(value) = to_js(&message) {
            let _ = self.callback.call1(&JsValue::null(), &value);
        }
    }
}
