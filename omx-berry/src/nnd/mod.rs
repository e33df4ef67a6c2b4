//! 最近邻体素距离 (nearest neighbour distance) 分析流水线.
//!
//! 对标定图像栈的两个通道:
//!
//! 1. 分别提取通道, 沿 z 方向重采样到等距切片;
//! 2. 通过协作器做 3D 平滑与阈值分割, 得到两个掩膜;
//! 3. 通过协作器对 compare 通道掩膜做一次精确有符号欧氏距离变换;
//! 4. 逐切片遍历 map 通道剪影, 采样距离场并换算为物理单位;
//! 5. 聚合为结果表、64-bin 相对频率分布和剪影边界叠加层.
//!
//! 平滑、分割、距离变换都不是本 crate 的职责, 由调用方以协作接口注入,
//! 因此可以在不触碰采样逻辑的情况下替换任一算法.

mod error;
mod report;
mod sample;

pub use error::{NndError, NndResult};
pub use report::{
    DistanceSample, Distribution, NndReport, Overlay, OverlayRoi, RenderHistogram, RenderTable,
    ResultsTable,
};
pub use sample::SliceSampler;

use crate::data::{CalibratedAttr, ChannelStack, DistanceField, MaskVolume, ScanVolume};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 3D 平滑协作接口. 在阈值分割前抑制噪声, 对两个通道施加同样的参数.
pub trait Smooth3d {
    /// 对体数据做 3D 平滑, 返回同形状的新体数据.
    ///
    /// `sigma` 按 (x, y, z) 顺序给出各方向的平滑强度 (体素单位).
    fn smooth_3d(&self, volume: &ScanVolume, sigma: (f64, f64, f64)) -> NndResult<ScanVolume>;
}

/// 阈值分割协作接口.
///
/// 掩膜语义为 "暗背景, 按整个栈取阈": 阈值在全部切片的统计上计算一次,
/// 亮于阈值的体素为前景 (非零), 其余为背景 (零).
pub trait Segment3d {
    /// 以名为 `method` 的阈值方法对体数据做二值分割, 返回同形状的掩膜.
    fn segment(&self, volume: &ScanVolume, method: &str) -> NndResult<MaskVolume>;
}

/// 3D 精确有符号欧氏距离变换协作接口.
///
/// 场值以体素为单位; 前景内部及表面为非负值, 外部为负值,
/// 其绝对值为到最近前景表面的欧氏距离 (参见 [`DistanceField`]).
pub trait SignedEdt3d {
    /// 对掩膜计算距离场, 返回同形状的场体数据.
    fn signed_edt_3d(&self, mask: &MaskVolume) -> NndResult<DistanceField>;
}

/// 分析配置. 不存在任何进程级可变状态, 所有参数都在这里显式给出.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NndConfig {
    map_channel: usize,
    compare_channel: usize,
    target_depth_spacing: Option<f64>,
    threshold_method: String,
    smoothing_sigma: (f64, f64, f64),
}

impl NndConfig {
    /// 以默认参数构建: 阈值方法 `"MaxEntropy"`, 平滑 sigma `(3, 3, 3)`,
    /// 重采样间距取像素宽度 (即把栈各向同性化).
    ///
    /// 两个通道号都是 1-based 且不得相同, 否则程序 panic.
    pub fn new(map_channel: usize, compare_channel: usize) -> Self {
        assert_ne!(map_channel, 0, "通道号是 1-based 的");
        assert_ne!(compare_channel, 0, "通道号是 1-based 的");
        assert_ne!(map_channel, compare_channel, "两个通道必须不同");
        Self {
            map_channel,
            compare_channel,
            target_depth_spacing: None,
            threshold_method: "MaxEntropy".to_owned(),
            smoothing_sigma: (3.0, 3.0, 3.0),
        }
    }

    /// 显式指定重采样切片间距 (标定单位). 必须是正的有限值, 否则程序 panic.
    pub fn with_target_depth_spacing(mut self, spacing: f64) -> Self {
        assert!(
            spacing.is_finite() && spacing > 0.0,
            "切片间距必须是正的有限值"
        );
        self.target_depth_spacing = Some(spacing);
        self
    }

    /// 指定阈值分割方法名.
    pub fn with_threshold_method(mut self, method: impl Into<String>) -> Self {
        self.threshold_method = method.into();
        self
    }

    /// 指定平滑 sigma, 按 (x, y, z) 顺序 (体素单位). 分量必须非负, 否则程序 panic.
    pub fn with_smoothing_sigma(mut self, sigma: (f64, f64, f64)) -> Self {
        assert!(
            sigma.0 >= 0.0 && sigma.1 >= 0.0 && sigma.2 >= 0.0,
            "sigma 分量必须非负"
        );
        self.smoothing_sigma = sigma;
        self
    }

    /// map 通道号 (1-based).
    #[inline]
    pub fn map_channel(&self) -> usize {
        self.map_channel
    }

    /// compare 通道号 (1-based).
    #[inline]
    pub fn compare_channel(&self) -> usize {
        self.compare_channel
    }

    /// 重采样切片间距. `None` 表示取像素宽度.
    #[inline]
    pub fn target_depth_spacing(&self) -> Option<f64> {
        self.target_depth_spacing
    }

    /// 阈值分割方法名.
    #[inline]
    pub fn threshold_method(&self) -> &str {
        &self.threshold_method
    }

    /// 平滑 sigma, 按 (x, y, z) 顺序.
    #[inline]
    pub fn smoothing_sigma(&self) -> (f64, f64, f64) {
        self.smoothing_sigma
    }
}

impl Default for NndConfig {
    /// 默认分析通道 1 相对通道 2 的距离.
    #[inline]
    fn default() -> Self {
        Self::new(1, 2)
    }
}

/// 完整分析入口.
///
/// 对 `stack` 的 map 通道相对 compare 通道运行整条流水线, 返回聚合报告.
/// 所有派生体数据 (重采样、平滑结果、掩膜、距离场) 都由本次调用独占,
/// 并在报告构建完成后随即释放.
///
/// # 错误
///
/// 输入栈没有有效体素或请求的通道不存在时, 返回前置条件错误;
/// 协作器失败原样上抛. 某个切片的剪影为空不是错误, 只影响该切片的贡献.
pub fn analyse<S, G, D>(
    stack: &ChannelStack,
    cfg: &NndConfig,
    smoother: &S,
    segmenter: &G,
    edt: &D,
) -> NndResult<NndReport>
where
    S: Smooth3d,
    G: Segment3d,
    D: SignedEdt3d,
{
    if stack.size() == 0 {
        return Err(NndError::EmptyStack);
    }
    let target = cfg
        .target_depth_spacing()
        .unwrap_or_else(|| stack.calibration().pixel_width());

    let derive_mask = |channel: usize| -> NndResult<MaskVolume> {
        let raw = stack
            .channel(channel)
            .ok_or(NndError::MissingChannel(channel, stack.channels()))?;
        let resliced = raw.reslice(target);
        let smoothed = smoother.smooth_3d(&resliced, cfg.smoothing_sigma())?;
        segmenter.segment(&smoothed, cfg.threshold_method())
    };

    let compare_mask = derive_mask(cfg.compare_channel())?;
    let field = edt.signed_edt_3d(&compare_mask)?;
    let map_mask = derive_mask(cfg.map_channel())?;

    let sampler = SliceSampler::new(
        &map_mask,
        &compare_mask,
        &field,
        cfg.map_channel(),
        cfg.compare_channel(),
        stack.len_z(),
    );
    let (samples, overlay) = sampler.run();

    Ok(NndReport::new(
        stack.title(),
        cfg.map_channel(),
        cfg.compare_channel(),
        samples,
        overlay,
    ))
}
