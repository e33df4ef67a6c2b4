use std::ops::Index;

use ndarray::{Array3, Array4, ArrayView, Axis, Ix3};

use crate::{Idx2d, Idx3d};

mod calibration;
pub mod slice;

pub use calibration::{Calibration, LengthUnit};
pub use slice::{MaskSlice, ScanSlice};

/// 标定 3D 体数据的共用属性和部分通用操作.
pub trait CalibratedAttr {
    /// 获取体素标定.
    fn calibration(&self) -> &Calibration;

    /// 获取数据形状, 按 (z, H, W) 格式.
    fn shape(&self) -> Idx3d;

    /// 获取数据水平切片形状大小.
    #[inline]
    fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 体素尺寸在三个维度上是否是各向同的?
    #[inline]
    fn is_isotropic(&self) -> bool {
        self.calibration().is_isotropic()
    }

    /// 获取体素的实际体积值 (立方标定单位).
    #[inline]
    fn voxel(&self) -> f64 {
        self.calibration().voxel()
    }
}

/// 多通道标定 3D 荧光图像栈. 体素以 `f32` 保存, 按 (c, z, H, W) 布局.
///
/// 图像栈由采集方构建, 流水线不会修改它; 所有派生体数据都是新实例.
#[derive(Debug, Clone)]
pub struct ChannelStack {
    data: Array4<f32>,
    cal: Calibration,
    title: String,
}

impl ChannelStack {
    /// 从每通道体数据直接构建. 每个通道按 (z, H, W) 组织.
    ///
    /// 通道列表必须非空且所有通道形状一致, 否则程序 panic.
    pub fn from_channels(
        title: impl Into<String>,
        channels: Vec<Array3<f32>>,
        cal: Calibration,
    ) -> Self {
        assert!(!channels.is_empty(), "通道列表为空");
        let (z, h, w) = channels[0].dim();
        assert!(
            channels.iter().all(|c| c.dim() == (z, h, w)),
            "通道形状不一致"
        );

        let mut data = Array4::zeros((channels.len(), z, h, w));
        for (i, ch) in channels.into_iter().enumerate() {
            data.index_axis_mut(Axis(0), i).assign(&ch);
        }
        Self {
            data,
            cal,
            title: title.into(),
        }
    }

    /// 图像栈标题.
    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// 通道个数.
    #[inline]
    pub fn channels(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// 提取第 `c` 个通道 (1-based) 为独立的扫描体数据 (deepcopy).
    /// `c` 为 0 或越界时返回 `None`.
    pub fn channel(&self, c: usize) -> Option<ScanVolume> {
        if c == 0 || c > self.channels() {
            return None;
        }
        Some(ScanVolume::new(
            self.data.index_axis(Axis(0), c - 1).to_owned(),
            self.cal,
        ))
    }
}

impl CalibratedAttr for ChannelStack {
    #[inline]
    fn calibration(&self) -> &Calibration {
        &self.cal
    }

    #[inline]
    fn shape(&self) -> Idx3d {
        let (_, z, h, w) = self.data.dim();
        (z, h, w)
    }
}

/// 单通道标定扫描体数据 (荧光强度). 体素以 `f32` 保存.
#[derive(Debug, Clone)]
pub struct ScanVolume {
    data: Array3<f32>,
    cal: Calibration,
}

impl CalibratedAttr for ScanVolume {
    #[inline]
    fn calibration(&self) -> &Calibration {
        &self.cal
    }

    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl Index<Idx3d> for ScanVolume {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl ScanVolume {
    /// 从裸数据和标定直接构建. `data` 按 (z, H, W) 组织.
    #[inline]
    pub fn new(data: Array3<f32>, cal: Calibration) -> Self {
        Self { data, cal }
    }

    /// 获取 z 空间第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ScanSlice<'_> {
        ScanSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取能按升序迭代水平切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ScanSlice> {
        self.data.axis_iter(Axis(0)).map(ScanSlice::new)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<f32> {
        self.data
    }
}

/// 二值掩膜体数据, 由分割协作器从扫描体数据派生. 体素以 `u8` 保存,
/// 任何非零值都视为前景 (参见 [`crate::consts::mask`]).
///
/// 一经产生即不可变.
#[derive(Debug, Clone)]
pub struct MaskVolume {
    data: Array3<u8>,
    cal: Calibration,
}

impl CalibratedAttr for MaskVolume {
    #[inline]
    fn calibration(&self) -> &Calibration {
        &self.cal
    }

    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl Index<Idx3d> for MaskVolume {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl MaskVolume {
    /// 从裸数据和标定直接构建. `data` 按 (z, H, W) 组织.
    #[inline]
    pub fn new(data: Array3<u8>, cal: Calibration) -> Self {
        Self { data, cal }
    }

    /// 获取 z 空间第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> MaskSlice<'_> {
        MaskSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取能按升序迭代水平切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = MaskSlice> {
        self.data.axis_iter(Axis(0)).map(MaskSlice::new)
    }

    /// 获取 3D 掩膜中前景体素的个数.
    #[inline]
    pub fn foreground_count(&self) -> usize {
        self.data
            .iter()
            .filter(|p| crate::consts::mask::is_foreground(**p))
            .count()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }
}

/// 有符号距离场体数据, 由距离变换协作器从掩膜派生. 场值以体素为单位:
/// 前景内部及表面为非负值, 前景外部为负值, 其绝对值为到最近前景表面的欧氏距离.
///
/// 一经产生即不可变.
#[derive(Debug, Clone)]
pub struct DistanceField {
    data: Array3<f32>,
    cal: Calibration,
}

impl CalibratedAttr for DistanceField {
    #[inline]
    fn calibration(&self) -> &Calibration {
        &self.cal
    }

    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl Index<Idx3d> for DistanceField {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl DistanceField {
    /// 从裸数据和标定直接构建. `data` 按 (z, H, W) 组织.
    #[inline]
    pub fn new(data: Array3<f32>, cal: Calibration) -> Self {
        Self { data, cal }
    }

    /// 获取 z 空间第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ScanSlice<'_> {
        ScanSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }
}
