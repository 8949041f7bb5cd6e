/*
 * @Author       : 老董
 * @Date         : 2026-07-19
 * @Description  : 参数节点的二进制编解码（含旧版格式兼容）
 *
 * 当前布局（版本 >= 3）：[学习率乘数 f32][形状编码][值缓冲区]
 * 旧版布局（版本 < 3）：[updateRequired u8][numRows u64][numCols u64]，
 * numRows 非零时即为旧式二维形状；否则后随通用形状编码，
 * 且某些旧格式把最后一维拆成了显式列数（numCols > 1 时载入后拼回末轴）。
 * 所有整数/浮点字段均为小端字节序；值缓冲区载荷见 tensor::save_load。
 */

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::tensor::Tensor;

use super::error::NodeError;
use super::parameter::Parameter;
use super::shape::ShapeSpec;

/// 模型文件魔数
const MODEL_MAGIC: &[u8; 4] = b"LTPR";
/// 当前模型格式版本；自版本 3 起采用 [乘数][形状][缓冲区] 布局
pub const MODEL_VERSION: u32 = 3;

// ==================== 基础字段读写 ====================

fn write_u32(writer: &mut impl Write, value: u32, what: &str) -> Result<(), NodeError> {
    writer
        .write_all(&value.to_le_bytes())
        .map_err(|e| NodeError::Io(format!("{what}失败: {e}")))
}

fn read_u32(reader: &mut impl Read, what: &str) -> Result<u32, NodeError> {
    let mut bytes = [0u8; 4];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| NodeError::Io(format!("{what}失败: {e}")))?;
    Ok(u32::from_le_bytes(bytes))
}

fn write_u64(writer: &mut impl Write, value: u64, what: &str) -> Result<(), NodeError> {
    writer
        .write_all(&value.to_le_bytes())
        .map_err(|e| NodeError::Io(format!("{what}失败: {e}")))
}

fn read_u64(reader: &mut impl Read, what: &str) -> Result<u64, NodeError> {
    let mut bytes = [0u8; 8];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| NodeError::Io(format!("{what}失败: {e}")))?;
    Ok(u64::from_le_bytes(bytes))
}

fn write_f32(writer: &mut impl Write, value: f32, what: &str) -> Result<(), NodeError> {
    writer
        .write_all(&value.to_le_bytes())
        .map_err(|e| NodeError::Io(format!("{what}失败: {e}")))
}

fn read_f32(reader: &mut impl Read, what: &str) -> Result<f32, NodeError> {
    let mut bytes = [0u8; 4];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| NodeError::Io(format!("{what}失败: {e}")))?;
    Ok(f32::from_le_bytes(bytes))
}

fn read_bool(reader: &mut impl Read, what: &str) -> Result<bool, NodeError> {
    let mut byte = [0u8; 1];
    reader
        .read_exact(&mut byte)
        .map_err(|e| NodeError::Io(format!("{what}失败: {e}")))?;
    Ok(byte[0] != 0)
}

// ==================== 形状编码 ====================

// 形状编码：[rank u32][dim u64]...
impl ShapeSpec {
    pub(in crate::nn) fn save(&self, writer: &mut impl Write) -> Result<(), NodeError> {
        write_u32(writer, self.rank() as u32, "写入形状秩")?;
        for &dim in self.dims() {
            write_u64(writer, dim as u64, "写入形状轴长")?;
        }
        Ok(())
    }

    pub(in crate::nn) fn load(reader: &mut impl Read) -> Result<Self, NodeError> {
        let rank = read_u32(reader, "读取形状秩")? as usize;
        let mut dims = Vec::with_capacity(rank);
        for _ in 0..rank {
            dims.push(read_u64(reader, "读取形状轴长")? as usize);
        }
        Ok(Self::new(&dims))
    }
}

// ==================== 节点编解码 ====================

impl Parameter {
    /// 序列化节点。
    /// 挂起计划未消费时拒绝写出：序列化结果必须始终代表完全实体化、
    /// 可复现的状态，绝不产生半成品。
    pub fn save(&self, writer: &mut impl Write) -> Result<(), NodeError> {
        if self.has_pending_init() {
            return Err(NodeError::InvalidOperation(format!(
                "参数节点{}的延迟初始化尚未完成，不能保存",
                self.name()
            )));
        }
        write_f32(writer, self.learning_rate_multiplier, "写入学习率乘数")?;
        self.shape.save(writer)?;
        self.value
            .save(writer)
            .map_err(|e| NodeError::Io(format!("写入值缓冲区失败: {e}")))?;
        Ok(())
    }

    /// 反序列化节点（版本门控）。
    /// 载入后节点必然已实体化：任何挂起计划都被清除。
    pub fn load(&mut self, reader: &mut impl Read, model_version: u32) -> Result<(), NodeError> {
        // 1. 乘数与形状
        let shape = if model_version >= MODEL_VERSION {
            self.learning_rate_multiplier = read_f32(reader, "读取学习率乘数")?;
            ShapeSpec::load(reader)?
        } else {
            // 旧版以"是否需要更新"的布尔值充当乘数
            let update_required = read_bool(reader, "读取更新标记")?;
            self.learning_rate_multiplier = if update_required { 1.0 } else { 0.0 };

            let num_rows = read_u64(reader, "读取行数")? as usize;
            let num_cols = read_u64(reader, "读取列数")? as usize;
            if num_rows != 0 {
                // 旧式二维形状
                ShapeSpec::new(&[num_rows, num_cols])
            } else {
                // 通用形状编码；列数大于 1 时是被拆出的末轴，拼回
                let decoded = ShapeSpec::load(reader)?;
                if num_cols > 1 {
                    decoded.with_appended_axis(num_cols)
                } else {
                    decoded
                }
            }
        };

        // 2. 值缓冲区（放置沿用节点当前设备）
        let device = self.value.device();
        let mut value = Tensor::load(reader)
            .map_err(|e| NodeError::Io(format!("读取值缓冲区失败: {e}")))?;
        value.transfer_to_mut(device);

        // 3. 缓冲区元素数必须与形状一致；一致则以形状的轴布局安放数据
        //   （旧版载荷的内部布局可能与形状编码不同）
        if value.size() != shape.num_elements() {
            return Err(NodeError::DataSizeMismatch {
                expected: shape.num_elements(),
                got: value.size(),
                context: format!("参数节点{}反序列化", self.name),
            });
        }
        self.value = value.reshape(shape.dims());
        self.shape = shape;

        // 4. 载入即实体化
        self.pending = None;
        Ok(())
    }

    // ==================== 模型文件容器 ====================

    /// 将节点保存为带魔数与版本头的模型文件
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<(), NodeError> {
        let file = File::create(path.as_ref())
            .map_err(|e| NodeError::Io(format!("无法创建模型文件: {e}")))?;
        let mut writer = BufWriter::new(file);

        writer
            .write_all(MODEL_MAGIC)
            .map_err(|e| NodeError::Io(format!("写入魔数失败: {e}")))?;
        write_u32(&mut writer, MODEL_VERSION, "写入版本")?;
        self.save(&mut writer)?;

        writer
            .flush()
            .map_err(|e| NodeError::Io(format!("刷新缓冲区失败: {e}")))?;
        Ok(())
    }

    /// 从模型文件恢复节点；版本 3 之前的文件自动走旧版解码
    pub fn load_model<P: AsRef<Path>>(&mut self, path: P) -> Result<(), NodeError> {
        let file = File::open(path.as_ref())
            .map_err(|e| NodeError::Io(format!("无法打开模型文件: {e}")))?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|e| NodeError::Io(format!("读取魔数失败: {e}")))?;
        if &magic != MODEL_MAGIC {
            return Err(NodeError::Io(
                "无效的模型文件：这不是 lazy_torch 格式的模型文件".to_string(),
            ));
        }
        let version = read_u32(&mut reader, "读取版本")?;
        if version > MODEL_VERSION {
            return Err(NodeError::Io(format!("不支持的模型文件版本: {version}")));
        }
        self.load(&mut reader, version)
    }
}
