use ndarray::{Array, IxDyn};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

mod device;
mod save_load;
mod shape;

pub use device::Device;


/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 数据始终驻留在主机内存中；`device`仅为放置标记，见[`Device`]。
/// 注：两个张量比较相等时只比较数据，放置标记不参与。
#[derive(Debug, Clone)]
pub struct Tensor {
    data: Array<f32, IxDyn>,
    device: Device,
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Tensor {
    /// 创建一个张量，若为标量，`shape`可以是[]、[1]、[1,1]...
    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；
    /// 若为矩阵，`shape`可以是[n,m]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]；
    /// 注：`data`的长度必须和`shape`中所有元素的乘积相等。
    pub fn new(data: &[f32], shape: &[usize]) -> Tensor {
        let data = Array::from_shape_vec(IxDyn(shape), data.to_vec()).unwrap();
        Tensor {
            data,
            device: Device::Cpu,
        }
    }

    /// 创建一个全零张量。允许某个轴长为 0（此时张量不含任何元素）。
    pub fn zeros(shape: &[usize]) -> Tensor {
        Tensor {
            data: Array::zeros(IxDyn(shape)),
            device: Device::Cpu,
        }
    }

    /// 创建一个所有元素均为`value`的张量
    pub fn filled(value: f32, shape: &[usize]) -> Tensor {
        Tensor {
            data: Array::from_elem(IxDyn(shape), value),
            device: Device::Cpu,
        }
    }

    /// 使用固定种子创建一个均匀分布的随机张量，其值在[min, max]的闭区间。
    /// 相同的（种子, 区间, 形状）必然产生逐位一致的数据。
    pub fn uniform_seeded(min: f32, max: f32, shape: &[usize], seed: u64) -> Tensor {
        let mut rng = StdRng::seed_from_u64(seed);
        let uniform = Uniform::from(min..=max);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| uniform.sample(&mut rng))
            .collect::<Vec<_>>();
        Tensor::new(&data, shape)
    }

    /// 使用固定种子创建一个服从正态分布的随机张量（Box-Muller 变换）。
    /// 相同的（种子, 均值, 标准差, 形状）必然产生逐位一致的数据。
    pub fn normal_seeded(mean: f32, std_dev: f32, shape: &[usize], seed: u64) -> Tensor {
        let mut rng = StdRng::seed_from_u64(seed);
        let data_len = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(data_len);

        while data.len() < data_len {
            let u1: f32 = rng.r#gen();
            let u2: f32 = rng.r#gen();
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f32::consts::PI * u2;
            let z0 = mean + std_dev * r * theta.cos();
            let z1 = mean + std_dev * r * theta.sin();

            if z0.is_finite() {
                data.push(z0);
            }
            if data.len() < data_len && z1.is_finite() {
                data.push(z1);
            }
        }

        Tensor::new(&data, shape)
    }

    /// 以另一张量的数据整体覆写本张量的数据（放置标记保持不变）
    pub fn assign(&mut self, other: &Tensor) {
        self.data = other.data.clone();
    }

    /// 将所有元素置为`value`
    pub fn fill_mut(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// 以只读切片形式访问底层数据（按行主序展平）
    pub fn data_as_slice(&self) -> &[f32] {
        self.data.as_slice().unwrap()
    }
}
