/*
 * @Author       : 老董
 * @Date         : 2026-07-19
 * @Description  : 初始化策略、自动种子分配与缓冲区实体化
 */

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::tensor::{Device, Tensor};

use super::shape::ShapeSpec;

// ==================== 自动种子分配 ====================

// 进程级自增种子计数器，从 1 开始。
// 未显式指定种子的随机初始化按构建顺序从这里取种子：
// 同一进程内按同一顺序构建同一张图，每个节点得到互不相同且可复现的种子。
static AUTO_SEED: AtomicU64 = AtomicU64::new(1);

/// 取出下一个自动种子并使计数器前进一位
pub fn take_auto_seed() -> u64 {
    AUTO_SEED.fetch_add(1, Ordering::Relaxed)
}

/// 将计数器重置到`next`（进程启动时无需调用；测试需要固定种子序列时使用）
pub fn reset_auto_seed(next: u64) {
    AUTO_SEED.store(next, Ordering::Relaxed);
}

// ==================== Init 枚举 ====================

/// 随机初始化的分布类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::nn) enum RandomKind {
    /// 均匀分布
    Uniform,
    /// 正态分布
    Gaussian,
}

/// 参数初始化策略（配置期描述）
///
/// 前四种为可延迟策略：维度未齐备时挂起，待形状推断完成后再执行。
/// `FromFile` / `FromLiteral` 自带维度，构造时立即执行，绝不挂起。
#[derive(Debug, Clone, PartialEq)]
pub enum Init {
    /// 全零
    Zero,
    /// 常数初始化
    Constant(f32),
    /// 均匀分布，取值范围 `[-0.05*scale, 0.05*scale]`；
    /// `seed`为`None`时按构建顺序自动分配种子
    Uniform {
        seed: Option<u64>,
        scale: f32,
        cpu_only: bool,
    },
    /// 正态分布，标准差 `0.2*scale/sqrt(列数)`（列数取缓冲区矩阵视角的第二个维度）
    Gaussian {
        seed: Option<u64>,
        scale: f32,
        cpu_only: bool,
    },
    /// 从文本文件读入矩阵（维度由文件推断，立即执行）
    FromFile(PathBuf),
    /// 从字符串字面量读入矩阵（维度由字面量推断，立即执行）
    FromLiteral(String),
}

// ==================== 挂起计划 ====================

/// 节点上挂起的初始化计划。
/// 一个节点同一时刻至多持有一个挂起计划；重设计划会整体替换旧计划，不存在合并。
#[derive(Debug, Clone, PartialEq)]
pub(in crate::nn) enum PendingInit {
    /// 以固定值填满整个缓冲区
    FromValue(f32),
    /// 随机采样填充
    Random {
        kind: RandomKind,
        seed: u64,
        scale: f32,
        cpu_only: bool,
    },
}

impl PendingInit {
    /// 将可延迟的配置策略转为挂起计划；种子缺省时从进程计数器分配。
    /// 自带维度的策略（fromFile/fromLiteral）不构成挂起计划，返回`None`。
    pub(in crate::nn) fn from_deferrable(init: &Init) -> Option<Self> {
        match init {
            Init::Zero => Some(Self::FromValue(0.0)),
            Init::Constant(v) => Some(Self::FromValue(*v)),
            Init::Uniform {
                seed,
                scale,
                cpu_only,
            } => Some(Self::Random {
                kind: RandomKind::Uniform,
                seed: seed.unwrap_or_else(take_auto_seed),
                scale: *scale,
                cpu_only: *cpu_only,
            }),
            Init::Gaussian {
                seed,
                scale,
                cpu_only,
            } => Some(Self::Random {
                kind: RandomKind::Gaussian,
                seed: seed.unwrap_or_else(take_auto_seed),
                scale: *scale,
                cpu_only: *cpu_only,
            }),
            Init::FromFile(_) | Init::FromLiteral(_) => None,
        }
    }

    /// 状态日志用的描述文本
    pub(in crate::nn) fn describe(&self) -> String {
        match self {
            Self::FromValue(v) => format!("fromValue({v})"),
            Self::Random {
                kind,
                seed,
                scale,
                cpu_only,
            } => {
                let kind = match kind {
                    RandomKind::Uniform => "uniform",
                    RandomKind::Gaussian => "gaussian",
                };
                format!("{kind}(seed={seed}, scale={scale}, onCPU={cpu_only})")
            }
        }
    }
}

// ==================== 实体化 ====================

/// 依据挂起计划填充形状已齐备的缓冲区。
///
/// 随机路径上保留一处历史兼容分支：底层采样器早期只支持二维布局，
/// 秩不超过 2 时经由矩阵视图采样，更高秩才直接在全张量上采样。
/// 两条路径的数据顺序一致；不再需要复现旧模型后即可删除该分支。
pub(in crate::nn) fn apply_pending(plan: &PendingInit, shape: &ShapeSpec, value: &mut Tensor) {
    match plan {
        PendingInit::FromValue(v) => value.fill_mut(*v),
        PendingInit::Random {
            kind,
            seed,
            scale,
            cpu_only,
        } => {
            // cpuOnly：采样前迁回主存，结束后迁回原设备，
            // 使初始化结果与节点落在哪个设备无关
            let original_device = value.device();
            if *cpu_only {
                value.transfer_to_mut(Device::Cpu);
            }

            let sampled = if shape.rank() > 2 {
                sample_full_tensor(*kind, shape, *seed, *scale)
            } else {
                sample_as_matrix(*kind, shape, *seed, *scale)
            };
            value.assign(&sampled);

            value.transfer_to_mut(original_device);
        }
    }
}

/// 高秩张量：直接在全张量上采样
fn sample_full_tensor(kind: RandomKind, shape: &ShapeSpec, seed: u64, scale: f32) -> Tensor {
    match kind {
        RandomKind::Uniform => {
            let rand_range = 0.05 * scale;
            Tensor::uniform_seeded(-rand_range, rand_range, shape.dims(), seed)
        }
        RandomKind::Gaussian => {
            Tensor::normal_seeded(0.0, gaussian_std_dev(shape, scale), shape.dims(), seed)
        }
    }
}

/// 低秩张量：经由二维矩阵视图采样，再还原为逻辑形状
fn sample_as_matrix(kind: RandomKind, shape: &ShapeSpec, seed: u64, scale: f32) -> Tensor {
    let (rows, cols) = shape.as_matrix_dims();
    let matrix = match kind {
        RandomKind::Uniform => {
            let rand_range = 0.05 * scale;
            Tensor::uniform_seeded(-rand_range, rand_range, &[rows, cols], seed)
        }
        RandomKind::Gaussian => {
            Tensor::normal_seeded(0.0, gaussian_std_dev(shape, scale), &[rows, cols], seed)
        }
    };
    matrix.reshape(shape.dims())
}

/// 正态初始化的标准差：`0.2*scale/sqrt(列数)`，列数取矩阵视角的第二个维度
fn gaussian_std_dev(shape: &ShapeSpec, scale: f32) -> f32 {
    let (_, num_cols) = shape.as_matrix_dims();
    0.2 * scale / (num_cols as f32).sqrt()
}
