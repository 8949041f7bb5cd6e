/*
 * @Author       : 老董
 * @Date         : 2026-07-19
 * @Description  : 可学习参数节点（权重/偏置）的延迟初始化状态机
 *
 * 节点的生命周期状态：{未定形+挂起, 已定形+挂起, 已实体化}。
 * 不存在"已定形+无计划+未实体化"：自带维度的初始化在构造时立即完成，
 * 可延迟计划则在形状齐备的瞬间由 try_materialize 消费。
 * 延迟初始化建模为"显式的可选计划值 + 幂等的 try_materialize 入口"，
 * 在形状可能发生变化的每个位置调用一次即可，不依赖任何回调机制。
 */

use std::fmt;
use std::path::Path;

use crate::data::{load_matrix_from_string_literal, load_matrix_from_text_file};
use crate::tensor::{Device, Tensor};

use super::error::NodeError;
use super::init::{Init, PendingInit, apply_pending};
use super::shape::ShapeSpec;

/// 可学习参数节点
///
/// 持有形状描述、至多一个挂起的初始化计划、按形状分配的值缓冲区，
/// 以及供优化器消费的学习率乘数（默认 1.0）。
/// 克隆节点会连同挂起计划一起复制。
#[derive(Debug, Clone)]
pub struct Parameter {
    pub(in crate::nn) name: String,
    pub(in crate::nn) shape: ShapeSpec,
    /// 挂起的初始化计划；`None`表示节点已实体化
    pub(in crate::nn) pending: Option<PendingInit>,
    /// 节点独占的值缓冲区，始终按当前形状分配
    pub(in crate::nn) value: Tensor,
    /// 学习率乘数；置 0 即把节点排除在梯度驱动的更新之外
    pub(in crate::nn) learning_rate_multiplier: f32,
}

/// 按形状分配缓冲区。
/// 形状未齐备时只分配空占位（秩为 0 时没有轴可依，用 0 长度向量表达"无元素"）。
fn alloc_value(shape: &ShapeSpec, device: Device) -> Tensor {
    let mut value = if shape.rank() == 0 {
        Tensor::zeros(&[0])
    } else {
        Tensor::zeros(shape.dims())
    };
    value.transfer_to_mut(device);
    value
}

impl Parameter {
    /// 构造参数节点（缓冲区落在主机内存）。
    ///
    /// `shape`中轴长为 0 的轴表示待推断；`init`为自带维度的策略时立即执行，
    /// 否则挂起计划并马上尝试实体化（显式给全维度+随机计划的常见情形当场完成）。
    pub fn new(shape: &[usize], init: Init, name: &str) -> Result<Self, NodeError> {
        Self::new_on_device(shape, init, name, Device::Cpu)
    }

    /// 构造参数节点并指定缓冲区的放置设备
    pub fn new_on_device(
        shape: &[usize],
        init: Init,
        name: &str,
        device: Device,
    ) -> Result<Self, NodeError> {
        // 1. 先按声明的形状分配缓冲区（未知轴按 0 长度分配，推断成功后重新分配）
        let shape = ShapeSpec::new(shape);
        let mut node = Self {
            name: name.to_string(),
            value: alloc_value(&shape, device),
            shape,
            pending: None,
            learning_rate_multiplier: 1.0,
        };

        // 2. 按策略分派
        match &init {
            // 2.1 自带维度的初始化立即执行，完成后不留挂起计划
            Init::FromFile(path) => {
                if path.as_os_str().is_empty() {
                    return Err(NodeError::InvalidConfiguration(
                        "fromFile初始化必须提供非空的文件路径".to_string(),
                    ));
                }
                let (data, rows, cols) = load_matrix_from_text_file(path)?;
                node.init_from_matrix(&data, rows, cols)?;
            }
            Init::FromLiteral(literal) => {
                if literal.trim().is_empty() {
                    return Err(NodeError::InvalidConfiguration(
                        "fromLiteral初始化必须提供非空的矩阵字面量".to_string(),
                    ));
                }
                let (data, rows, cols) = load_matrix_from_string_literal(literal)?;
                node.init_from_matrix(&data, rows, cols)?;
            }
            // 2.2 可延迟计划：挂起并立即尝试实体化
            deferrable => {
                node.pending = PendingInit::from_deferrable(deferrable);
                node.try_materialize();
                if let Some(plan) = &node.pending {
                    eprintln!(
                        "{}: 形状{}尚未齐备，初始化({})挂起，待维度推断完成后执行。",
                        node, node.shape, plan.describe()
                    );
                }
            }
        }
        Ok(node)
    }

    /// 构造之后重设初始化计划。
    ///
    /// 新计划整体替换任何旧的挂起计划（不存在合并），随后立即尝试实体化。
    /// 只接受可延迟策略；自带维度的策略应走构造入口，在此属于契约违规。
    pub fn post_init(&mut self, init: &Init) -> Result<(), NodeError> {
        let Some(plan) = PendingInit::from_deferrable(init) else {
            return Err(NodeError::InvalidOperation(format!(
                "post_init只接受可延迟的初始化策略，收到了自带维度的{init:?}"
            )));
        };
        self.pending = Some(plan);
        self.try_materialize();
        if let Some(plan) = &self.pending {
            eprintln!(
                "{}: 形状{}尚未齐备，初始化({})挂起，待维度推断完成后执行。",
                self, self.shape, plan.describe()
            );
        }
        Ok(())
    }

    /// 消费挂起的初始化计划。
    ///
    /// 幂等：无挂起计划或形状未齐备时为无操作。
    /// 图验证可能多次途经同一节点，从任何调用点冗余调用都是安全的。
    pub fn try_materialize(&mut self) {
        // 1. 无挂起计划：已实体化
        let Some(plan) = &self.pending else {
            return;
        };
        // 2. 形状尚未齐备：保持挂起
        if !self.shape.is_fully_known() {
            return;
        }
        // 3. 执行并清除计划
        eprintln!(
            "{}: 以{}初始化形状为{}的缓冲区。",
            self, plan.describe(), self.shape
        );
        apply_pending(plan, &self.shape, &mut self.value);
        self.pending = None;
    }

    /// 维度推断钩子：图验证时以相邻节点的已解析形状调用，可能被调用零次或多次。
    ///
    /// 本节点形状已齐备时为无操作（显式形状优先，绝不被覆写）；
    /// 无挂起计划却被要求推断属于调用方契约违规——不延迟初始化的节点
    /// 根本不需要邻居替它推断维度，静默接受只会掩盖上游的设计错误；
    /// 秩不一致时静默放弃（软失败），图验证可在后续轮次从其他邻居重试。
    pub fn infer_dimensions_from(&mut self, other: &ShapeSpec) -> Result<(), NodeError> {
        // 1. 显式形状优先
        if self.shape.is_fully_known() {
            return Ok(());
        }
        // 2. 对方形状本身不完整时没有推断价值
        if other.rank() == 0 || other.num_elements() == 0 {
            return Ok(());
        }
        // 3. 契约检查
        if self.pending.is_none() {
            return Err(NodeError::InvalidOperation(format!(
                "参数节点{}没有挂起的初始化计划，却被要求推断维度",
                self.name
            )));
        }
        // 4. 填充维度：一个轴都未配置时整体采纳对方形状（不做校验——节点
        //    可能被有意声明为 0 长度向量），否则逐轴补全未知维度
        let filled = self.shape.with_inferred_axes(other);
        if filled == self.shape {
            return Ok(()); // 秩不一致，静默放弃
        }
        self.adopt_shape(filled);
        eprintln!("{}: 维度推断得到形状{}。", self, self.shape);

        // 5. 形状可能已齐备，立即尝试实体化
        self.try_materialize();
        Ok(())
    }

    /// 从文件重载数值。任何计划状态下都合法；只替换数值，绝不改变形状。
    /// 重载过程中的一切失败都会附加节点名、操作与路径上下文后再上抛，
    /// 使调用方无需栈回溯即可定位出问题的数据文件。
    pub fn revise_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), NodeError> {
        let path = path.as_ref();
        self.revise_inner(path)
            .map_err(|e| wrap_revise_error(e, &self.name, path))
    }

    fn revise_inner(&mut self, path: &Path) -> Result<(), NodeError> {
        let (data, _num_rows, _num_cols) = load_matrix_from_text_file(path)?;
        self.verify_data_size(data.len())?;
        self.value.assign(&Tensor::new(&data, self.shape.dims()));
        Ok(())
    }

    /// 执行器在节点首次参与前向计算之前调用：挂起计划仍未消费即属逻辑错误
    pub fn ensure_materialized(&self) -> Result<(), NodeError> {
        if let Some(plan) = &self.pending {
            return Err(NodeError::InvalidOperation(format!(
                "参数节点{}的延迟初始化({})尚未完成，不能投入计算",
                self.name,
                plan.describe()
            )));
        }
        Ok(())
    }

    /// 将学习率乘数归零，把节点排除在此后的梯度驱动更新之外；
    /// 不触碰形状、计划与数值。
    pub fn freeze(&mut self) {
        self.learning_rate_multiplier = 0.0;
    }

    // ==================== 访问器 ====================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &ShapeSpec {
        &self.shape
    }

    /// 值缓冲区（未实体化时为空占位）
    pub fn value(&self) -> &Tensor {
        &self.value
    }

    pub fn device(&self) -> Device {
        self.value.device()
    }

    /// 是否仍有初始化计划挂起
    pub fn has_pending_init(&self) -> bool {
        self.pending.is_some()
    }

    /// 学习率乘数（梯度更新调度时消费）
    pub fn learning_rate_multiplier(&self) -> f32 {
        self.learning_rate_multiplier
    }

    pub fn set_learning_rate_multiplier(&mut self, multiplier: f32) {
        self.learning_rate_multiplier = multiplier;
    }

    // ==================== 内部工具 ====================

    /// 采纳推断所得形状并按新尺寸重新分配缓冲区（仅推断路径可达）
    fn adopt_shape(&mut self, new_shape: ShapeSpec) {
        let device = self.value.device();
        self.shape = new_shape;
        self.value = alloc_value(&self.shape, device);
    }

    /// 以外部矩阵数据初始化：必要时先从矩阵行列推断未知轴，再覆写缓冲区
    fn init_from_matrix(
        &mut self,
        data: &[f32],
        num_rows: usize,
        num_cols: usize,
    ) -> Result<(), NodeError> {
        // 1. 形状尚未齐备时从矩阵行列推断（自带维度的初始化因此绝不挂起）
        if self.shape.num_elements() == 0 {
            let inferred = self.shape.infer_from_matrix_dims(num_rows, num_cols)?;
            self.adopt_shape(inferred);
        }
        // 2. 数据量必须与形状严格一致
        self.verify_data_size(data.len())?;
        // 3. 覆写缓冲区数值（放置标记保持不变）
        self.value.assign(&Tensor::new(data, self.shape.dims()));
        Ok(())
    }

    fn verify_data_size(&self, got: usize) -> Result<(), NodeError> {
        let expected = self.shape.num_elements();
        if got != expected {
            return Err(NodeError::DataSizeMismatch {
                expected,
                got,
                context: format!("参数节点{}", self.name),
            });
        }
        Ok(())
    }
}

/// 为 revise 过程中的失败补充定位上下文。
/// 元素数不匹配保留原变体（仅改写上下文字段），其余失败折叠为带上下文的 IO 错误。
fn wrap_revise_error(err: NodeError, name: &str, path: &Path) -> NodeError {
    let context = format!("参数节点{name}自文件{}重载数值", path.display());
    match err {
        NodeError::DataSizeMismatch { expected, got, .. } => NodeError::DataSizeMismatch {
            expected,
            got,
            context,
        },
        other => NodeError::Io(format!("{context}失败: {other}")),
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, cols) = self.shape.as_matrix_dims();
        write!(
            f,
            "节点[name={}, type=Parameter, dims=[{}x{}], learningRateMultiplier={}, needsGradient={}]",
            self.name,
            rows,
            cols,
            self.learning_rate_multiplier,
            self.learning_rate_multiplier > 0.0
        )
    }
}
