//! 沿深度方向的线性插值重采样 (reslice).

use crate::data::{CalibratedAttr, ScanVolume};
use ndarray::{Array3, Axis, Zip};

impl ScanVolume {
    /// 将体数据沿 z 方向重采样到新的切片间距 `pixel_depth`, 返回新的体数据.
    ///
    /// 输出切片个数为 `round(len_z * 原间距 / pixel_depth)`, 第 `z` 个输出切片
    /// 位于物理深度 `z * pixel_depth` 处, 其内容是相邻两个原始切片的线性插值;
    /// 当该深度恰好落在原始采样点上时, 输出与原始切片一致 (不引入插值误差).
    /// 超出最后一个原始切片的深度被钳制到最后一个切片.
    ///
    /// `pixel_depth` 必须是正的有限值, 否则程序 panic. 不修改输入.
    pub fn reslice(&self, pixel_depth: f64) -> ScanVolume {
        assert!(
            pixel_depth.is_finite() && pixel_depth > 0.0,
            "切片间距必须是正的有限值"
        );
        let (z_len, h, w) = self.shape();
        let depth = self.calibration().pixel_depth();

        let num_slices = (z_len as f64 * depth / pixel_depth).round() as usize;
        let mut out = Array3::<f32>::zeros((num_slices, h, w));

        for z in 0..num_slices {
            let pos = z as f64 * pixel_depth;
            let ind_p = (pos / depth) as usize;
            let ind_n = (ind_p + 1).min(z_len - 1);

            let d_p = pos - ind_p as f64 * depth;
            let d_n = ind_n as f64 * depth - pos;
            // 钳制到同一个切片时 d_p + d_n == 0, 此时直接取该切片.
            let w_p = if d_p + d_n > 0.0 {
                d_n / (d_p + d_n)
            } else {
                1.0
            };
            let w_n = 1.0 - w_p;

            let before = self.data().index_axis_move(Axis(0), ind_p);
            let after = self.data().index_axis_move(Axis(0), ind_n);
            Zip::from(out.index_axis_mut(Axis(0), z))
                .and(before)
                .and(after)
                .for_each(|t, &b, &a| {
                    *t = (b as f64 * w_p + a as f64 * w_n) as f32;
                });
        }

        ScanVolume::new(out, self.calibration().with_pixel_depth(pixel_depth))
    }
}

#[cfg(test)]
mod tests {
    use crate::data::{CalibratedAttr, Calibration, LengthUnit, ScanVolume};
    use ndarray::Array3;

    fn volume(z: usize, depth: f64) -> ScanVolume {
        let cal = Calibration::new(0.1, 0.1, depth, LengthUnit::Micron).unwrap();
        // 每个切片填充自己的 z 索引, 便于核对插值结果.
        let data = Array3::from_shape_fn((z, 2, 2), |(zi, _, _)| zi as f32);
        ScanVolume::new(data, cal)
    }

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    /// 以原间距重采样必须逐体素复原输入.
    #[test]
    fn test_reslice_identity() {
        for depth in [0.3, 0.125, 1.0] {
            let v = volume(5, depth);
            let r = v.reslice(depth);
            assert_eq!(r.len_z(), 5);
            for (a, b) in v.data().iter().zip(r.data().iter()) {
                assert!(float_eq(*a, *b), "{a} != {b} (depth {depth})");
            }
        }
    }

    /// 更小的目标间距产生不少于更大间距的切片数.
    #[test]
    fn test_reslice_monotonic_coverage() {
        let v = volume(7, 0.25);
        let mut last = usize::MAX;
        for target in [0.05, 0.1, 0.2, 0.25, 0.4, 0.8] {
            let n = v.reslice(target).len_z();
            assert!(n <= last, "target {target} 产生了 {n} > {last} 个切片");
            last = n;
        }
    }

    /// 正中间的插值位置取两侧切片的平均.
    #[test]
    fn test_reslice_midpoint() {
        let v = volume(3, 1.0);
        let r = v.reslice(0.5);
        assert_eq!(r.len_z(), 6);
        // z=1 位于深度 0.5, 在原始切片 0 和 1 的正中间.
        assert!(float_eq(r[(1, 0, 0)], 0.5));
        assert!(float_eq(r[(3, 1, 1)], 1.5));
        // 原始采样点上无插值误差.
        assert!(float_eq(r[(2, 0, 0)], 1.0));
        assert!(float_eq(r[(4, 0, 1)], 2.0));
    }

    /// 超出最后一个原始切片的位置钳制到最后一个切片.
    #[test]
    fn test_reslice_clamps_tail() {
        let v = volume(2, 1.0);
        let r = v.reslice(0.8);
        // round(2 / 0.8) = 3 个切片; z=2 位于深度 1.6, 钳制后落在最后一个切片上.
        assert_eq!(r.len_z(), 3);
        assert!(float_eq(r[(2, 0, 0)], 1.0));
        // z=1 位于深度 0.8, 是常规插值.
        assert!(float_eq(r[(1, 0, 0)], 0.8));
        // 钳制也覆盖单切片输入.
        let single = volume(1, 1.0).reslice(0.6);
        assert_eq!(single.len_z(), 2);
        assert!(float_eq(single[(1, 0, 0)], 0.0));
    }

    /// 重采样结果携带新的切片间距标定, 其余标定字段不变.
    #[test]
    fn test_reslice_calibration() {
        let v = volume(4, 0.5);
        let r = v.reslice(0.1);
        assert!(float_eq(r.calibration().pixel_depth() as f32, 0.1));
        assert!(float_eq(
            r.calibration().pixel_width() as f32,
            v.calibration().pixel_width() as f32
        ));
        assert_eq!(r.calibration().unit(), v.calibration().unit());
    }

    #[test]
    #[should_panic]
    fn test_reslice_invalid_spacing() {
        volume(3, 1.0).reslice(0.0);
    }
}
