//! 运行时错误.

/// 最近邻距离分析的运行时错误.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NndError {
    /// 输入图像栈没有有效体素 (切片数或平面尺寸为 0). 分析无法进行.
    EmptyStack,

    /// 请求的通道不存在.
    ///
    /// 第一个参数代表请求的通道号 (1-based), 第二个参数代表实际通道个数.
    MissingChannel(usize, usize),

    /// 3D 平滑协作器失败.
    Smoothing(String),

    /// 阈值分割协作器失败.
    Segmentation(String),

    /// 距离变换协作器失败.
    DistanceTransform(String),
}

/// 最近邻距离分析的结果别名.
pub type NndResult<T> = Result<T, NndError>;
