//! 掩膜前景剪影 (silhouette) 的区域分解.
//!
//! 任意掩膜切片的前景可能是凹的、多连通的、带孔的. 直接对这样的复合区域做
//! 逐像素包含测试需要扫描整幅图像. 本模块按 4-相邻规则将前景分解为
//! 一组互不相交的简单子区域, 每个子区域携带自己的包围盒和局部占用位图,
//! 包含测试为 O(1) 且逐像素遍历被限制在包围盒内.

use crate::data::slice::neighbour4;
use crate::data::MaskSlice;
use crate::{Area2d, Areas2d, Idx2d};
use ndarray::Array2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 轴对齐包围盒 (全局切片坐标).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    /// 包围盒上边缘的行索引.
    pub top: usize,

    /// 包围盒左边缘的列索引.
    pub left: usize,

    /// 包围盒的高.
    pub height: usize,

    /// 包围盒的宽.
    pub width: usize,
}

impl Bounds {
    /// 像素集合的最小包围盒. `pixels` 必须非空, 否则程序 panic.
    fn enclosing(pixels: &[Idx2d]) -> Bounds {
        assert!(!pixels.is_empty());
        let (mut top, mut left) = (usize::MAX, usize::MAX);
        let (mut bottom, mut right) = (0, 0);
        for &(h, w) in pixels {
            top = top.min(h);
            left = left.min(w);
            bottom = bottom.max(h);
            right = right.max(w);
        }
        Bounds {
            top,
            left,
            height: bottom - top + 1,
            width: right - left + 1,
        }
    }

    /// 判断全局坐标是否落在包围盒内.
    #[inline]
    pub fn contains(&self, (h, w): Idx2d) -> bool {
        (self.top..self.top + self.height).contains(&h)
            && (self.left..self.left + self.width).contains(&w)
    }

    /// 包围盒覆盖的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.height * self.width
    }
}

/// 单连通简单子区域: 包围盒加局部占用位图.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubRegion {
    bounds: Bounds,
    grid: Array2<bool>,
    area: usize,
}

impl SubRegion {
    /// 从一个 4-连通像素集合构建. `area` 必须非空, 否则程序 panic.
    fn from_area(area: Area2d) -> Self {
        let bounds = Bounds::enclosing(&area);
        let mut grid = Array2::from_elem((bounds.height, bounds.width), false);
        for &(h, w) in area.iter() {
            grid[(h - bounds.top, w - bounds.left)] = true;
        }
        Self {
            bounds,
            grid,
            area: area.len(),
        }
    }

    /// 包围盒.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// 区域像素个数.
    #[inline]
    pub fn area(&self) -> usize {
        self.area
    }

    /// 判断全局坐标是否属于该区域. O(1).
    #[inline]
    pub fn contains(&self, pos @ (h, w): Idx2d) -> bool {
        self.bounds.contains(pos) && self.grid[(h - self.bounds.top, w - self.bounds.left)]
    }

    /// 以行优先顺序迭代包围盒内所有属于该区域的像素 (全局坐标).
    pub fn iter_contained(&self) -> impl Iterator<Item = Idx2d> + '_ {
        let Bounds { top, left, .. } = self.bounds;
        self.grid
            .indexed_iter()
            .filter_map(move |((h, w), &occupied)| occupied.then_some((top + h, left + w)))
    }

    /// 区域轮廓: 所有 4-邻域不完全在区域内的区域像素
    /// (含贴着切片边缘的像素). 行优先顺序.
    pub fn outline(&self) -> Area2d {
        self.iter_contained()
            .filter(|&pos| !neighbour4(pos).into_iter().all(|n| self.contains(n)))
            .collect()
    }
}

/// 一个掩膜切片的前景剪影: 互不相交的简单子区域集合.
///
/// 逐切片重新计算, 不长期保存.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Silhouette {
    regions: Vec<SubRegion>,
    shape: Idx2d,
}

impl Silhouette {
    /// 所有子区域, 按各自首像素的行优先顺序排列.
    #[inline]
    pub fn regions(&self) -> &[SubRegion] {
        &self.regions
    }

    /// 剪影是否为空 (全背景切片)?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// 剪影总像素个数.
    #[inline]
    pub fn area(&self) -> usize {
        self.regions.iter().map(SubRegion::area).sum()
    }

    /// 来源切片的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.shape
    }

    /// 每个子区域的轮廓.
    pub fn outlines(&self) -> Areas2d {
        self.regions.iter().map(SubRegion::outline).collect()
    }
}

/// 剪影提取实现块.
impl<'a> MaskSlice<'a> {
    /// 提取该掩膜切片的前景剪影, 并分解为以包围盒约束的简单子区域.
    ///
    /// 前景为任何非零像素; 全背景切片产生空剪影. 子区域的并集恰好等于前景,
    /// 且两两不相交.
    pub fn silhouette(&self) -> Silhouette {
        Silhouette {
            regions: self
                .foreground_areas()
                .into_iter()
                .map(SubRegion::from_area)
                .collect(),
            shape: self.shape(),
        }
    }
}
