/*
 * @Author       : 老董
 * @Date         : 2026-07-19
 * @Description  : 从配置记录构造参数节点
 *
 * 配置记录是带类型化取值的键值结构（serde_json::Value 对象）。
 * 早期写法要求先给出初始化方式再配上同名参数，现在只给出相应参数即可：
 *   - init="uniform|gaussian"（随机初始化，按 initValueScale 缩放）
 *   - init="zero"
 *   - initValue=标量 --> 以该值填充
 *   - initFromFilePath="..." --> 从数据文件读入，维度由文件推断
 * 仍然兼容的旧写法：
 *   - init="fixedValue"，值取自 value
 *   - init="fromLiteral"，文本取自 initFromLiteral
 */

use std::path::PathBuf;

use serde_json::Value;

use crate::tensor::Device;

use super::error::NodeError;
use super::init::Init;
use super::parameter::Parameter;

impl Parameter {
    /// 从配置记录构造参数节点。
    ///
    /// 必需键：`shape`（非负整数数组，0 表示该轴待推断）。
    /// 可选键：`init`、`initValue`、`initValueScale`、`initFromFilePath`、
    /// `initFromLiteral`、`value`、`randomSeed`、`initOnCPUOnly`、
    /// `learningRateMultiplier`、`deviceId`。
    pub fn from_config(name: &str, record: &Value) -> Result<Self, NodeError> {
        // 1. 形状
        let shape = parse_shape(record)?;

        // 2. 学习率乘数；已废弃的布尔写法直接拒绝
        for deprecated in ["needsGradient", "needGradient", "computeGradient"] {
            if record.get(deprecated).is_some() {
                return Err(NodeError::InvalidConfiguration(format!(
                    "配置键{deprecated}已废弃，请改用learningRateMultiplier"
                )));
            }
        }
        let multiplier = match record.get("learningRateMultiplier") {
            Some(v) => as_f32(v, "learningRateMultiplier")?,
            None => 1.0,
        };

        // 3. 放置设备：deviceId 为负或缺省时落在主机内存
        let device = match record.get("deviceId").and_then(Value::as_i64) {
            Some(id) if id >= 0 => Device::Cuda(id as usize),
            _ => Device::Cpu,
        };

        // 4. 初始化策略
        let init = parse_init(record)?;

        // 5. 构造
        let mut node = Self::new_on_device(&shape, init, name, device)?;
        node.set_learning_rate_multiplier(multiplier);
        Ok(node)
    }
}

fn parse_shape(record: &Value) -> Result<Vec<usize>, NodeError> {
    let Some(value) = record.get("shape") else {
        return Err(NodeError::InvalidConfiguration(
            "缺少必需的配置键shape".to_string(),
        ));
    };
    let Some(items) = value.as_array() else {
        return Err(NodeError::InvalidConfiguration(format!(
            "shape必须是非负整数数组，实际为{value}"
        )));
    };
    items
        .iter()
        .map(|item| {
            item.as_u64().map(|d| d as usize).ok_or_else(|| {
                NodeError::InvalidConfiguration(format!("shape的元素必须是非负整数: {item}"))
            })
        })
        .collect()
}

fn parse_init(record: &Value) -> Result<Init, NodeError> {
    // 1. 读取与初始化相关的键
    let init_str = opt_str(record, "init")?;
    let from_file_path = opt_str(record, "initFromFilePath")?;
    let init_value = record.get("initValue");

    // 2. init 缺省时按给出的其他键推断初始化方式
    let resolved = if init_str.is_empty() {
        if !from_file_path.is_empty() {
            "fromFile"
        } else {
            match init_value {
                Some(Value::Number(_)) => "fromValue",
                Some(Value::Array(_)) => {
                    return Err(NodeError::InvalidConfiguration(
                        "initValue暂不支持数组形式".to_string(),
                    ));
                }
                Some(Value::String(s)) if !s.is_empty() => {
                    return Err(NodeError::InvalidConfiguration(
                        "initValue必须是数值或空字符串".to_string(),
                    ));
                }
                // 没有给出任何相关键：默认均匀分布
                _ => "uniform",
            }
        }
    } else {
        init_str
    };

    // 3. 按方式装配策略
    match resolved {
        "uniform" | "gaussian" => {
            let scale = match record.get("initValueScale") {
                Some(v) => as_f32(v, "initValueScale")?,
                None => 1.0,
            };
            let cpu_only = record
                .get("initOnCPUOnly")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            // 指定非负 randomSeed 可获得与构建顺序无关的可复现初始化；
            // 负值或缺省则按构建顺序自动分配
            let seed = match record.get("randomSeed").and_then(Value::as_i64) {
                Some(s) if s >= 0 => Some(s as u64),
                _ => None,
            };
            if resolved == "uniform" {
                Ok(Init::Uniform {
                    seed,
                    scale,
                    cpu_only,
                })
            } else {
                Ok(Init::Gaussian {
                    seed,
                    scale,
                    cpu_only,
                })
            }
        }
        "zero" => Ok(Init::Zero),
        "fromValue" => {
            let Some(value) = init_value else {
                return Err(NodeError::InvalidConfiguration(
                    "fromValue初始化必须提供initValue".to_string(),
                ));
            };
            Ok(Init::Constant(as_f32(value, "initValue")?))
        }
        "fromFile" => {
            if from_file_path.is_empty() {
                return Err(NodeError::InvalidConfiguration(
                    "fromFile初始化必须提供initFromFilePath".to_string(),
                ));
            }
            Ok(Init::FromFile(PathBuf::from(from_file_path)))
        }
        // 旧写法：值取自 value 键
        "fixedValue" => {
            let Some(value) = record.get("value") else {
                return Err(NodeError::InvalidConfiguration(
                    "fixedValue初始化必须提供value".to_string(),
                ));
            };
            Ok(Init::Constant(as_f32(value, "value")?))
        }
        // 旧写法：文本取自 initFromLiteral 键
        "fromLiteral" => {
            let literal = opt_str(record, "initFromLiteral")?;
            if literal.is_empty() {
                return Err(NodeError::InvalidConfiguration(
                    "fromLiteral初始化必须提供initFromLiteral".to_string(),
                ));
            }
            Ok(Init::FromLiteral(literal.to_string()))
        }
        other => Err(NodeError::InvalidConfiguration(format!(
            "init必须是[ uniform | gaussian | zero | fixedValue | fromFile | fromLiteral ]之一，实际为{other}"
        ))),
    }
}

/// 读取可选的字符串键；缺省视为空串，存在但不是字符串则报配置错误
fn opt_str<'a>(record: &'a Value, key: &str) -> Result<&'a str, NodeError> {
    match record.get(key) {
        None => Ok(""),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(NodeError::InvalidConfiguration(format!(
            "{key}必须是字符串，实际为{other}"
        ))),
    }
}

fn as_f32(value: &Value, key: &str) -> Result<f32, NodeError> {
    value.as_f64().map(|v| v as f32).ok_or_else(|| {
        NodeError::InvalidConfiguration(format!("{key}必须是数值，实际为{value}"))
    })
}
