//! 体素标定: 体素索引到物理长度的映射.

use crate::Idx2d;
use num::ToPrimitive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 物理长度单位.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LengthUnit {
    /// 纳米.
    Nanometre,

    /// 微米.
    Micron,

    /// 毫米.
    Millimetre,
}

impl LengthUnit {
    /// 一个该单位的长度等于多少纳米.
    #[inline]
    pub const fn nanometres(&self) -> f64 {
        match self {
            LengthUnit::Nanometre => 1.0,
            LengthUnit::Micron => 1e3,
            LengthUnit::Millimetre => 1e6,
        }
    }

    /// 单位缩写.
    #[inline]
    pub const fn abbreviation(&self) -> &'static str {
        match self {
            LengthUnit::Nanometre => "nm",
            LengthUnit::Micron => "um",
            LengthUnit::Millimetre => "mm",
        }
    }
}

/// 体素物理尺寸标定, 分别代表宽 (自然图像的水平方向)、高 (自然图像的垂直方向)、
/// 空间 (相邻切片方向) 三个维度上一个体素的实际长度.
///
/// 该标定是只读的. 若要修改参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Calibration {
    pixel_width: f64,
    pixel_height: f64,
    pixel_depth: f64,
    unit: LengthUnit,
}

impl Calibration {
    /// 构建标定. 三个尺寸都必须是正的有限值, 否则返回 `None`.
    pub fn new(
        pixel_width: f64,
        pixel_height: f64,
        pixel_depth: f64,
        unit: LengthUnit,
    ) -> Option<Calibration> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(pixel_width) && valid(pixel_height) && valid(pixel_depth) {
            Some(Self {
                pixel_width,
                pixel_height,
                pixel_depth,
                unit,
            })
        } else {
            None
        }
    }

    /// 构建各向同性标定, 三个维度的体素尺寸均为 `dim`.
    #[inline]
    pub fn isotropic(dim: f64, unit: LengthUnit) -> Option<Calibration> {
        Self::new(dim, dim, dim, unit)
    }

    /// 用新的切片间距派生一份标定, 其余字段不变.
    ///
    /// `pixel_depth` 必须是正的有限值, 否则程序 panic.
    pub fn with_pixel_depth(&self, pixel_depth: f64) -> Calibration {
        Self::new(self.pixel_width, self.pixel_height, pixel_depth, self.unit)
            .expect("切片间距必须是正的有限值")
    }

    /// width 方向 (自然 2D 图像的水平方向) 体素尺寸.
    #[inline]
    pub fn pixel_width(&self) -> f64 {
        self.pixel_width
    }

    /// height 方向 (自然 2D 图像的垂直方向) 体素尺寸.
    #[inline]
    pub fn pixel_height(&self) -> f64 {
        self.pixel_height
    }

    /// 空间方向 (相邻 2D 切片的方向) 体素尺寸.
    #[inline]
    pub fn pixel_depth(&self) -> f64 {
        self.pixel_depth
    }

    /// 长度单位.
    #[inline]
    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    /// 体素尺寸在三个维度上是否是各向同的?
    #[inline]
    pub fn is_isotropic(&self) -> bool {
        self.pixel_width == self.pixel_height && self.pixel_width == self.pixel_depth
    }

    /// 体素的实际体积值 (立方标定单位).
    #[inline]
    pub fn voxel(&self) -> f64 {
        self.pixel_width * self.pixel_height * self.pixel_depth
    }

    /// 将以标定单位计的长度换算为纳米.
    #[inline]
    pub fn to_nanometres(&self, value: f64) -> f64 {
        value * self.unit.nanometres()
    }

    /// 像素索引 `(h, w)` 对应的物理平面坐标 `(x, y)`.
    pub fn planar_position(&self, (h, w): Idx2d) -> (f64, f64) {
        // usize -> f64 不会失败, 可直接 unwrap.
        let x = w.to_f64().unwrap() * self.pixel_width;
        let y = h.to_f64().unwrap() * self.pixel_height;
        (x, y)
    }

    /// 第 `z` 个切片对应的物理深度坐标.
    #[inline]
    pub fn depth_position(&self, z: usize) -> f64 {
        // usize -> f64 不会失败, 可直接 unwrap.
        z.to_f64().unwrap() * self.pixel_depth
    }
}

#[cfg(test)]
mod tests {
    use super::{Calibration, LengthUnit};

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_calibration_invalid_input() {
        assert!(Calibration::new(0.0, 1.0, 1.0, LengthUnit::Micron).is_none());
        assert!(Calibration::new(1.0, -2.0, 1.0, LengthUnit::Micron).is_none());
        assert!(Calibration::new(1.0, 1.0, f64::NAN, LengthUnit::Micron).is_none());
        assert!(Calibration::new(1.0, 1.0, f64::INFINITY, LengthUnit::Micron).is_none());
        assert!(Calibration::isotropic(0.04, LengthUnit::Micron).is_some());
    }

    #[test]
    fn test_calibration_units() {
        let cal = Calibration::new(0.08, 0.08, 0.125, LengthUnit::Micron).unwrap();
        assert!(float_eq(cal.to_nanometres(1.0), 1000.0));
        assert!(float_eq(cal.to_nanometres(0.08), 80.0));
        assert_eq!(cal.unit().abbreviation(), "um");

        let cal = Calibration::isotropic(2.0, LengthUnit::Millimetre).unwrap();
        assert!(float_eq(cal.to_nanometres(2.0), 2e6));
    }

    #[test]
    fn test_calibration_positions() {
        let cal = Calibration::new(0.5, 0.25, 2.0, LengthUnit::Micron).unwrap();
        let (x, y) = cal.planar_position((4, 3));
        assert!(float_eq(x, 1.5));
        assert!(float_eq(y, 1.0));
        assert!(float_eq(cal.depth_position(5), 10.0));
        assert!(!cal.is_isotropic());
        assert!(float_eq(cal.voxel(), 0.25));
    }

    #[test]
    fn test_calibration_with_pixel_depth() {
        let cal = Calibration::new(0.08, 0.08, 0.125, LengthUnit::Micron).unwrap();
        let derived = cal.with_pixel_depth(0.08);
        assert!(derived.is_isotropic());
        assert!(float_eq(derived.pixel_width(), cal.pixel_width()));
        assert_eq!(derived.unit(), cal.unit());
    }
}
