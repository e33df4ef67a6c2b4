//! 参考协作器实现: 3D 高斯平滑、最大熵阈值分割、穷举法有符号欧氏距离变换.
//!
//! 这些实现只面向小规模合成 phantom, 追求语义上的正确而不是速度.

use ndarray::Array3;
use omx_berry::prelude::*;

/// 可分离 3D 高斯平滑.
pub struct GaussianSmooth;

/// 一维高斯核, 半径取 `ceil(3 * sigma)`, 权重归一化.
/// `sigma <= 0` 时退化为单位核.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (3.0 * sigma).ceil() as i64;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|i| (-(i * i) as f64 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

/// 沿单个轴做一维卷积, 边界按最近值延拓.
fn blur_axis(data: &Array3<f32>, axis: usize, sigma: f64) -> Array3<f32> {
    let kernel = gaussian_kernel(sigma);
    if kernel.len() == 1 {
        return data.clone();
    }
    let radius = (kernel.len() / 2) as i64;
    let dim = data.dim();
    let len = [dim.0, dim.1, dim.2][axis] as i64;

    Array3::from_shape_fn(dim, |(z, h, w)| {
        let centre = [z as i64, h as i64, w as i64];
        let mut acc = 0.0f64;
        for (k, &weight) in kernel.iter().enumerate() {
            let mut pos = centre;
            pos[axis] = (pos[axis] + k as i64 - radius).clamp(0, len - 1);
            acc += weight * data[(pos[0] as usize, pos[1] as usize, pos[2] as usize)] as f64;
        }
        acc as f32
    })
}

impl Smooth3d for GaussianSmooth {
    fn smooth_3d(&self, volume: &ScanVolume, sigma: (f64, f64, f64)) -> NndResult<ScanVolume> {
        let (sx, sy, sz) = sigma;
        let mut data = volume.data().to_owned();
        // sigma 按 (x, y, z) 给出; 数据按 (z, h, w) 布局.
        for (axis, s) in [(2, sx), (1, sy), (0, sz)] {
            data = blur_axis(&data, axis, s);
        }
        Ok(ScanVolume::new(data, *volume.calibration()))
    }
}

/// 最大熵 (Kapur) 自动阈值分割. 阈值按整个栈的 256-bin 直方图计算一次,
/// 亮于阈值的体素为前景 (暗背景语义).
pub struct MaxEntropyThreshold;

const BINS: usize = 256;

/// 在归一化直方图上搜索让背景与前景熵之和最大的 bin 分界.
fn kapur_threshold_bin(histogram: &[f64; BINS]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for t in 0..BINS - 1 {
        let p_bg: f64 = histogram[..=t].iter().sum();
        let p_fg = 1.0 - p_bg;
        if p_bg <= 0.0 || p_fg <= 0.0 {
            continue;
        }
        let entropy = |slot: &[f64], p_total: f64| -> f64 {
            slot.iter()
                .filter(|p| **p > 0.0)
                .map(|p| {
                    let q = p / p_total;
                    -q * q.ln()
                })
                .sum()
        };
        let h = entropy(&histogram[..=t], p_bg) + entropy(&histogram[t + 1..], p_fg);
        if best.map_or(true, |(_, prev)| h > prev) {
            best = Some((t, h));
        }
    }
    best.map(|(t, _)| t)
}

impl Segment3d for MaxEntropyThreshold {
    fn segment(&self, volume: &ScanVolume, method: &str) -> NndResult<MaskVolume> {
        if method != "MaxEntropy" {
            return Err(NndError::Segmentation(format!(
                "不支持的阈值方法: {method}"
            )));
        }

        let data = volume.data();
        let min = data.iter().copied().fold(f32::INFINITY, f32::min) as f64;
        let max = data.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
        if !(min.is_finite() && max.is_finite()) || max <= min {
            return Err(NndError::Segmentation("体数据没有灰度层次".to_owned()));
        }

        let width = (max - min) / BINS as f64;
        let mut histogram = [0.0f64; BINS];
        for &v in data.iter() {
            let bin = (((v as f64 - min) / width) as usize).min(BINS - 1);
            histogram[bin] += 1.0;
        }
        let total = data.len() as f64;
        histogram.iter_mut().for_each(|h| *h /= total);

        let bin = kapur_threshold_bin(&histogram)
            .ok_or_else(|| NndError::Segmentation("直方图退化, 无法取阈".to_owned()))?;
        let threshold = min + (bin as f64 + 1.0) * width;

        let mask = data.mapv(|v| {
            if (v as f64) > threshold {
                MASK_FOREGROUND
            } else {
                MASK_BACKGROUND
            }
        });
        Ok(MaskVolume::new(mask, *volume.calibration()))
    }
}

/// 穷举法 3D 精确有符号欧氏距离变换. O(体素数 x 表面体素数), 仅适用于小体数据.
pub struct ExhaustiveSignedEdt;

fn euclid((az, ay, ax): Idx3d, (bz, by, bx): Idx3d) -> f64 {
    let d = |p: usize, q: usize| (p as f64 - q as f64).powi(2);
    (d(az, bz) + d(ay, by) + d(ax, bx)).sqrt()
}

impl SignedEdt3d for ExhaustiveSignedEdt {
    fn signed_edt_3d(&self, mask: &MaskVolume) -> NndResult<DistanceField> {
        let foreground: Vec<Idx3d> = mask
            .data()
            .indexed_iter()
            .filter_map(|(pos, &p)| is_foreground(p).then_some(pos))
            .collect();
        if foreground.is_empty() {
            return Err(NndError::DistanceTransform("掩膜没有前景".to_owned()));
        }
        let background: Vec<Idx3d> = mask
            .data()
            .indexed_iter()
            .filter_map(|(pos, &p)| is_background(p).then_some(pos))
            .collect();

        let min_to = |pos: Idx3d, set: &[Idx3d]| {
            set.iter()
                .map(|&q| euclid(pos, q))
                .fold(f64::INFINITY, f64::min)
        };

        let field = Array3::from_shape_fn(mask.shape(), |pos| {
            if is_foreground(mask[pos]) {
                if background.is_empty() {
                    0.0
                } else {
                    min_to(pos, &background) as f32
                }
            } else {
                -(min_to(pos, &foreground) as f32)
            }
        });
        Ok(DistanceField::new(field, *mask.calibration()))
    }
}

#[cfg(test)]
mod tests {
    use super::{gaussian_kernel, ExhaustiveSignedEdt, GaussianSmooth, MaxEntropyThreshold};
    use ndarray::Array3;
    use omx_berry::prelude::*;

    fn cal() -> Calibration {
        Calibration::isotropic(1.0, LengthUnit::Micron).unwrap()
    }

    #[test]
    fn test_gaussian_kernel_normalised() {
        for sigma in [0.0, 0.5, 1.0, 3.0] {
            let k = gaussian_kernel(sigma);
            let sum: f64 = k.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12, "sigma {sigma}");
            assert_eq!(k.len() % 2, 1);
        }
    }

    /// 高斯平滑保持常数体数据不变.
    #[test]
    fn test_gaussian_preserves_constant() {
        let v = ScanVolume::new(Array3::from_elem((4, 5, 5), 7.0), cal());
        let smoothed = GaussianSmooth.smooth_3d(&v, (1.5, 1.5, 1.5)).unwrap();
        for &p in smoothed.data().iter() {
            assert!((p - 7.0).abs() < 1e-4);
        }
    }

    /// 双峰体数据的最大熵阈值落在两峰之间.
    #[test]
    fn test_max_entropy_bimodal() {
        let mut data = Array3::from_elem((2, 8, 8), 20.0f32);
        for h in 0..4 {
            for w in 0..4 {
                data[(0, h, w)] = 1000.0;
            }
        }
        let v = ScanVolume::new(data, cal());
        let mask = MaxEntropyThreshold.segment(&v, "MaxEntropy").unwrap();
        assert_eq!(mask.foreground_count(), 16);
        assert!(is_foreground(mask[(0, 0, 0)]));
        assert!(is_background(mask[(0, 5, 5)]));
        assert!(is_background(mask[(1, 0, 0)]));
    }

    #[test]
    fn test_max_entropy_rejects_unknown_method() {
        let v = ScanVolume::new(Array3::from_elem((2, 2, 2), 1.0), cal());
        assert!(MaxEntropyThreshold.segment(&v, "Otsu").is_err());
    }

    /// 单前景体素的距离场: 外部为负的欧氏距离, 前景本身非负.
    #[test]
    fn test_exhaustive_edt_point() {
        let mut mask = Array3::<u8>::zeros((3, 3, 3));
        mask[(1, 1, 1)] = MASK_FOREGROUND;
        let field = ExhaustiveSignedEdt
            .signed_edt_3d(&MaskVolume::new(mask, cal()))
            .unwrap();
        assert!(field[(1, 1, 1)] >= 0.0);
        assert!((field[(1, 1, 0)] - -1.0).abs() < 1e-6);
        assert!((field[(0, 0, 0)] - -(3.0f32.sqrt())).abs() < 1e-6);
    }
}
