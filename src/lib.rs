//! # Lazy Torch
//!
//! `lazy_torch`实现计算图中可学习参数（权重/偏置）节点的延迟初始化状态机：
//! 节点声明时维度往往尚未齐备（需等图验证期间相邻节点解析后才能确定），
//! 但"将来如何填充"（常数、随机采样、外部数据）必须在配置期就能指定。
//! 形状一旦齐备，节点自动完成实体化；（反）序列化全程维持这一不变量。

pub mod data;
pub mod nn;
pub mod tensor;
pub mod utils;
