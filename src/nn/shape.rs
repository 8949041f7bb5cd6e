/*
 * ShapeSpec: 以 0 作为"未知"占位的轴长序列
 *
 * 参数节点在声明时可能只知道部分维度（例如 [0, 10]），
 * 未知轴在图验证期间由相邻节点的已解析形状逐步补全。
 * 所有轴均为非零后，形状在节点的余生中即告冻结——
 * 只有推断钩子在初始化计划仍挂起时允许替换它。
 *
 * # 示例
 * ```
 * use lazy_torch::nn::ShapeSpec;
 *
 * let partial = ShapeSpec::new(&[0, 10]);
 * assert!(!partial.is_fully_known());
 * assert_eq!(partial.to_string(), "[?, 10]");
 *
 * let filled = partial.with_inferred_axes(&ShapeSpec::new(&[5, 10]));
 * assert_eq!(filled.dims(), &[5, 10]);
 * assert!(filled.is_fully_known());
 * ```
 */

use std::fmt;

use super::error::NodeError;

/// 形状描述：有序的轴长序列，轴长为 0 表示该轴未知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeSpec {
    dims: Vec<usize>,
}

impl ShapeSpec {
    /// 创建一个形状描述（任何轴都允许为 0）
    pub fn new(dims: &[usize]) -> Self {
        Self {
            dims: dims.to_vec(),
        }
    }

    /// 轴的个数
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// 获取内部轴长数组的引用
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// 所有轴长的乘积；秩为 0 或存在未知轴时为 0
    pub fn num_elements(&self) -> usize {
        if self.dims.is_empty() {
            return 0;
        }
        self.dims.iter().product()
    }

    /// 秩大于 0 且所有轴均已知
    pub fn is_fully_known(&self) -> bool {
        !self.dims.is_empty() && self.dims.iter().all(|&d| d != 0)
    }

    /// 是否存在至少一个已配置（非零）的轴
    pub fn has_any_dim(&self) -> bool {
        self.dims.iter().any(|&d| d != 0)
    }

    /// 在末尾追加一个轴（旧版序列化格式把最后一维拆成了显式列数，载入时需要拼回）
    pub(in crate::nn) fn with_appended_axis(&self, dim: usize) -> Self {
        let mut dims = self.dims.clone();
        dims.push(dim);
        Self { dims }
    }

    /// 逐轴填充未知维度：本形状某轴为 0 时，取`source`对应位置的轴长。
    ///
    /// 一个轴都未配置时整体采纳`source`（不做校验）；
    /// 秩不一致且本形状并非全空时，原样返回自身——这是软失败而非错误：
    /// 图验证可能从多个相邻位置投机地尝试推断，直到某一次成功为止。
    pub fn with_inferred_axes(&self, source: &ShapeSpec) -> ShapeSpec {
        if !self.has_any_dim() {
            return source.clone();
        }
        if self.rank() != source.rank() {
            return self.clone();
        }
        let dims = self
            .dims
            .iter()
            .zip(source.dims.iter())
            .map(|(&d, &s)| if d == 0 { s } else { d })
            .collect();
        ShapeSpec { dims }
    }

    /// 依据外部二维矩阵的行列数推断未知轴。
    ///
    /// 与[`with_inferred_axes`](Self::with_inferred_axes)不同，这条路径用于从外部
    /// 矩阵数据（而非相邻节点）获取维度：
    /// 1. 无任何轴时先建立 1 或 2 个轴的骨架（列数为 1 时只需 1 个轴）；
    /// 2. 第一个轴未知时取矩阵行数；
    /// 3. 首轴之外至多允许一个未知轴，其值由列数除以已知轴之积得出；
    ///    更多未知轴在做除法之前就报`DimensionInference`；
    /// 4. 推断结果必须恰好容纳整个矩阵（除不尽同样落入此检查）。
    pub fn infer_from_matrix_dims(
        &self,
        num_rows: usize,
        num_cols: usize,
    ) -> Result<ShapeSpec, NodeError> {
        let mut dims = self.dims.clone();

        // 1. 补足秩
        if dims.is_empty() {
            dims.push(0);
        }
        if dims.len() == 1 && num_cols != 1 {
            dims.push(0);
        }

        // 2. 行维度
        if dims[0] == 0 {
            dims[0] = num_rows;
        }

        // 3. 列维度：定位首轴之外唯一允许的未知轴
        let mut unknown_pos = None;
        let mut known_prod = 1usize;
        for (k, &dim) in dims.iter().enumerate().skip(1) {
            if dim != 0 {
                known_prod *= dim;
            } else if unknown_pos.is_none() {
                unknown_pos = Some(k);
            } else {
                return Err(NodeError::DimensionInference(format!(
                    "形状{self}存在过多未知维度，无法由{num_rows}x{num_cols}矩阵推断"
                )));
            }
        }
        if let Some(k) = unknown_pos {
            dims[k] = num_cols / known_prod;
        }

        // 4. 整体校验
        let inferred = ShapeSpec { dims };
        if inferred.num_elements() != num_rows * num_cols {
            return Err(NodeError::DimensionInference(format!(
                "形状{self}无法容纳{num_rows}x{num_cols}矩阵（推断结果为{inferred}）"
            )));
        }
        Ok(inferred)
    }

    /// 以矩阵视角给出（行数, 列数）：行数取第一个轴，列数取其余轴之积（秩小于 2 时为 1）
    pub fn as_matrix_dims(&self) -> (usize, usize) {
        let rows = self.dims.first().copied().unwrap_or(0);
        let cols = if self.dims.len() > 1 {
            self.dims[1..].iter().product()
        } else {
            1
        };
        (rows, cols)
    }
}

impl fmt::Display for ShapeSpec {
    /// 未知轴显示为`?`，如`[?, 10]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .dims
            .iter()
            .map(|&d| {
                if d == 0 {
                    "?".to_string()
                } else {
                    d.to_string()
                }
            })
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

impl From<&[usize]> for ShapeSpec {
    fn from(dims: &[usize]) -> Self {
        ShapeSpec::new(dims)
    }
}

impl From<Vec<usize>> for ShapeSpec {
    fn from(dims: Vec<usize>) -> Self {
        ShapeSpec { dims }
    }
}
