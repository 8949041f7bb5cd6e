use std::io::{Read, Write};

use super::{Device, Tensor};

// 值缓冲区的二进制载荷：bincode 自带长度前缀，可安全地嵌入更大的流中
impl Tensor {
    /// 将张量数据写入字节流
    pub fn save(&self, writer: &mut impl Write) -> bincode::Result<()> {
        bincode::serialize_into(writer, &self.data)
    }

    /// 从字节流恢复张量数据（放置标记恢复为默认的主机内存）
    pub fn load(reader: &mut impl Read) -> bincode::Result<Self> {
        let data = bincode::deserialize_from(reader)?;
        Ok(Self {
            data,
            device: Device::Cpu,
        })
    }
}
