//! 逐切片距离采样.

use super::report::{DistanceSample, Overlay, OverlayRoi};
use crate::consts::rgb;
use crate::data::{CalibratedAttr, DistanceField, MaskVolume};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 逐切片距离采样器.
///
/// 持有重采样后的两个通道掩膜、compare 通道的距离场, 以及原始栈的切片个数
/// (用于把重采样 z 索引映射回原始栈). 采样本身不拥有任何体数据.
pub struct SliceSampler<'a> {
    map_mask: &'a MaskVolume,
    compare_mask: &'a MaskVolume,
    field: &'a DistanceField,
    map_channel: usize,
    compare_channel: usize,
    original_len_z: usize,
}

impl<'a> SliceSampler<'a> {
    /// 构建采样器.
    ///
    /// 两个掩膜与距离场的形状必须一致, 且 `original_len_z` 非零, 否则程序 panic.
    pub fn new(
        map_mask: &'a MaskVolume,
        compare_mask: &'a MaskVolume,
        field: &'a DistanceField,
        map_channel: usize,
        compare_channel: usize,
        original_len_z: usize,
    ) -> Self {
        assert_eq!(map_mask.shape(), compare_mask.shape(), "掩膜形状不一致");
        assert_eq!(map_mask.shape(), field.shape(), "掩膜与距离场形状不一致");
        assert_ne!(original_len_z, 0);
        Self {
            map_mask,
            compare_mask,
            field,
            map_channel,
            compare_channel,
            original_len_z,
        }
    }

    /// 顺序处理所有重采样切片, 返回全部距离样本和剪影边界叠加层.
    ///
    /// 样本按切片优先、子区域其次、区域内行优先的顺序排列.
    pub fn run(&self) -> (Vec<DistanceSample>, Overlay) {
        let outcomes = (0..self.map_mask.len_z()).map(|z| self.sample_slice(z));
        Self::merge(outcomes)
    }

    /// 借助 `rayon` 并行处理各切片, 再按 z 升序合并.
    ///
    /// 输出与 [`Self::run`] 逐位一致.
    #[cfg(feature = "rayon")]
    pub fn par_run(&self) -> (Vec<DistanceSample>, Overlay) {
        let outcomes: Vec<_> = (0..self.map_mask.len_z())
            .into_par_iter()
            .map(|z| self.sample_slice(z))
            .collect();
        Self::merge(outcomes)
    }

    fn merge<I>(outcomes: I) -> (Vec<DistanceSample>, Overlay)
    where
        I: IntoIterator<Item = (Vec<DistanceSample>, Vec<OverlayRoi>)>,
    {
        let mut samples = Vec::new();
        let mut overlay = Overlay::new();
        for (s, rois) in outcomes {
            samples.extend(s);
            rois.into_iter().for_each(|r| overlay.push(r));
        }
        (samples, overlay)
    }

    /// 处理单个重采样切片.
    ///
    /// map 通道剪影为空的切片不产生样本, 也不产生 map 注记;
    /// compare 通道的注记独立判定. 两个剪影都为空时该切片没有任何贡献.
    fn sample_slice(&self, z: usize) -> (Vec<DistanceSample>, Vec<OverlayRoi>) {
        let cal = self.map_mask.calibration();
        let mut samples = Vec::new();
        let mut rois = Vec::new();
        let original_z = self.original_slice_index(z);

        let silhouette = self.map_mask.slice_at(z).silhouette();
        if !silhouette.is_empty() {
            let field = self.field.slice_at(z);
            samples.reserve(silhouette.area());
            for region in silhouette.regions() {
                for pos in region.iter_contained() {
                    // 场值以体素为单位, 各向同性间距下乘以像素宽度即为物理距离.
                    let raw = field[pos] as f64;
                    let distance = cal.to_nanometres(raw * cal.pixel_width());
                    let (x, y) = cal.planar_position(pos);
                    samples.push(DistanceSample {
                        x,
                        y,
                        z: cal.depth_position(z),
                        distance,
                    });
                }
            }
            rois.push(OverlayRoi::new(
                self.map_channel,
                original_z,
                rgb::MAGENTA,
                silhouette.outlines(),
            ));
        }

        let compare_silhouette = self.compare_mask.slice_at(z).silhouette();
        if !compare_silhouette.is_empty() {
            rois.push(OverlayRoi::new(
                self.compare_channel,
                original_z,
                rgb::CYAN,
                compare_silhouette.outlines(),
            ));
        }

        (samples, rois)
    }

    /// 将重采样 z 索引 (0-based) 映射回原始栈的切片索引 (1-based).
    fn original_slice_index(&self, z: usize) -> usize {
        let resampled = self.map_mask.len_z();
        ((z + 1) as f64 / resampled as f64 * self.original_len_z as f64) as usize + 1
    }
}
