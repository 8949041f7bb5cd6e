use std::fmt;

use super::Tensor;

/// 张量的放置标记。
/// 本后端的数据始终存放在主机内存中，标记只承载放置语义：
/// 迁移对调用方而言是同步完成的，不存在后台传输。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    /// 主机内存
    #[default]
    Cpu,
    /// 编号为该值的 CUDA 设备
    Cuda(usize),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda(id) => write!(f, "cuda:{id}"),
        }
    }
}

impl Tensor {
    /// 当前的放置标记
    pub fn device(&self) -> Device {
        self.device
    }

    /// 同步迁移到目标设备。目标与当前一致时为无操作。
    pub fn transfer_to_mut(&mut self, device: Device) {
        self.device = device;
    }
}
