use super::Tensor;

impl Tensor {
    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；
    /// 若为矩阵，`shape`可以是[n,m]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]。
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 张量的维（dim）数、阶（rank）数
    /// 即`shape()`的元素个数--如：形状为`[]`的标量阶数为0，向量阶数为1，矩阵阶数为2，以此类推
    pub fn dimension(&self) -> usize {
        self.data.ndim()
    }

    /// 张量所含元素的总个数
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 返回一个数据相同、形状为`shape`的新张量。
    /// 新旧形状的元素总数必须一致，否则panic。
    pub fn reshape(&self, shape: &[usize]) -> Self {
        assert!(
            self.data.len() == shape.iter().product::<usize>(),
            "新形状{:?}与张量元素数{}不兼容",
            shape,
            self.data.len()
        );
        Self {
            data: self.data.clone().into_shape(shape).unwrap(),
            device: self.device,
        }
    }
}
