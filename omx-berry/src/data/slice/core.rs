use crate::consts::mask::*;
use crate::{Area2d, Areas2d, Idx2d, Predicate};
use ndarray::iter::Iter;
use ndarray::{ArrayView2, Ix2};
use std::collections::{HashSet, VecDeque};
use std::ops::Index;

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 不可变、借用的二维荧光强度切片. 同一结构也用作距离场的切片视图.
pub struct ScanSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::ScanVolume`] 或 [`crate::DistanceField`].
    ///
    /// 这里有意把代码写死为 `ArrayView` 降低灵活性, 但使结构的意图更加明确.
    data: ArrayView2<'a, f32>,
}

/// 不可变、借用的二维掩膜切片.
pub struct MaskSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::MaskVolume`].
    data: ArrayView2<'a, u8>,
}

/// 切片视图共用的几何方法集合.
macro_rules! impl_slice_geometry {
    ($life: lifetime, $slice: ty, $elem: ty) => {
        impl<$life> $slice {
            /// 直接初始化.
            #[inline]
            pub(crate) fn new(data: ArrayView2<$life, $elem>) -> Self {
                Self { data }
            }

            /// 获得 **底层** 数据的一份不可变 shallow copy.
            #[inline]
            pub fn array_view(&self) -> ArrayView2<$elem> {
                self.data.view()
            }

            /// 获取可以迭代切片像素的迭代器.
            #[inline]
            pub fn iter(&self) -> Iter<'_, $elem, Ix2> {
                self.data.iter()
            }

            /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
            #[inline]
            pub fn get(&self, pos: Idx2d) -> Option<&$elem> {
                self.data.get(pos)
            }

            /// 切片的分辨率 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                let &[h, w] = self.data.shape() else {
                    unreachable!()
                };
                (h, w)
            }

            /// 切片的像素个数.
            #[inline]
            pub fn size(&self) -> usize {
                let (h, w) = self.shape();
                h * w
            }

            /// 获得切片的高.
            #[inline]
            pub fn height(&self) -> usize {
                self.shape().0
            }

            /// 获得切片的宽.
            #[inline]
            pub fn width(&self) -> usize {
                self.shape().1
            }

            /// 判断一个索引是否合法 (未越界).
            #[inline]
            pub fn check(&self, (h, w): Idx2d) -> bool {
                let (h_len, w_len) = self.shape();
                h < h_len && w < w_len
            }

            /// 以行优先规则, 获取能迭代切片所有索引的迭代器.
            #[inline]
            pub fn pos_iter(&self) -> impl Iterator<Item = Idx2d> {
                super::iter::PosIter::new(self.shape())
            }

            /// 以行优先规则, 获取能迭代切片所有 `(索引, 像素值)` 的迭代器.
            #[inline]
            pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &$elem)> {
                self.data.indexed_iter()
            }
        }

        impl<$life> Index<Idx2d> for $slice {
            type Output = $elem;

            #[inline]
            fn index(&self, index: Idx2d) -> &Self::Output {
                &self.data[index]
            }
        }
    };
}

impl_slice_geometry!('a, ScanSlice<'a>, f32);
impl_slice_geometry!('a, MaskSlice<'a>, u8);

impl<'a> MaskSlice<'a> {
    /// 该切片是否为全背景?
    #[inline]
    pub fn is_background(&self) -> bool {
        self.data.iter().copied().all(is_background)
    }

    /// 前景像素个数.
    #[inline]
    pub fn foreground_area(&self) -> usize {
        self.data.iter().copied().filter(|p| is_foreground(*p)).count()
    }

    /// 按照 4-相邻规则获取所有区域. 两个像素 `p1` 和 `p2` 属于同一个区域,
    /// 当且仅当存在一条从 `p1` 到 `p2` 的 4-相邻路径, 且路径上的所有像素
    /// (包括 `p1` 和 `p2`) 都满足谓词 `pred`.
    ///
    /// 返回的区域按首像素的行优先顺序排列.
    pub fn areas(&self, pred: Predicate) -> Areas2d {
        self.areas_from_local(self.pos_iter(), pred)
    }

    /// 按照 4-相邻原则获得切片中所有前景区域.
    #[inline]
    pub fn foreground_areas(&self) -> Areas2d {
        self.areas(is_foreground)
    }

    /// 按照 4-相邻规则获取所有区域, 但 BFS 种子范围由 `it` 指定.
    pub(crate) fn areas_from_local<I: IntoIterator<Item = Idx2d>>(
        &self,
        it: I,
        pred: Predicate,
    ) -> Areas2d {
        let mut ans = Areas2d::new();
        let mut bfs_q: VecDeque<Idx2d> = VecDeque::with_capacity(4);
        let mut seen = HashSet::with_capacity(16);

        for pos in it.into_iter() {
            if seen.contains(&pos) || !pred(self[pos]) {
                continue;
            }
            bfs_q.push_back(pos);
            let mut this_area = Area2d::with_capacity(1);
            while let Some(cur) = bfs_q.pop_front() {
                if !seen.insert(cur) {
                    continue;
                }
                this_area.push(cur);
                bfs_q.extend(
                    neighbour4(cur)
                        .into_iter()
                        .filter(|p| self.check(*p) && pred(self[*p]) && !seen.contains(p)),
                );
            }
            ans.push(this_area);
        }
        ans
    }
}

#[cfg(test)]
mod tests {
    use super::{MaskSlice, ScanSlice};
    use crate::consts::mask::MASK_FOREGROUND;
    use ndarray::{arr2, Array2};

    #[test]
    fn test_slice_geometry() {
        let data = Array2::<f32>::zeros((3, 5));
        let sli = ScanSlice::new(data.view());
        assert_eq!(sli.shape(), (3, 5));
        assert_eq!(sli.size(), 15);
        assert_eq!(sli.height(), 3);
        assert_eq!(sli.width(), 5);
        assert!(sli.check((2, 4)));
        assert!(!sli.check((3, 0)));
        assert!(!sli.check((0, 5)));
        assert_eq!(sli.pos_iter().count(), 15);
        assert_eq!(sli.get((2, 4)), Some(&0.0));
        assert_eq!(sli.get((3, 0)), None);
    }

    #[test]
    fn test_mask_slice_foreground() {
        let mut data = Array2::<u8>::zeros((4, 4));
        assert!(MaskSlice::new(data.view()).is_background());

        data[(1, 1)] = MASK_FOREGROUND;
        data[(2, 3)] = 1; // 0/1 约定同样是前景.
        let sli = MaskSlice::new(data.view());
        assert!(!sli.is_background());
        assert_eq!(sli.foreground_area(), 2);
    }

    /// 两个对角相触的前景块在 4-相邻规则下是不同区域.
    #[test]
    fn test_mask_slice_areas() {
        let f = MASK_FOREGROUND;
        let data = arr2(&[
            [f, f, 0, 0],
            [f, 0, 0, 0],
            [0, 0, f, f],
            [0, 0, f, 0],
        ]);
        let sli = MaskSlice::new(data.view());
        let areas = sli.foreground_areas();
        assert_eq!(areas.len(), 2);
        // 区域按首像素的行优先顺序排列.
        assert_eq!(areas[0][0], (0, 0));
        assert_eq!(areas[0].len(), 3);
        assert_eq!(areas[1][0], (2, 2));
        assert_eq!(areas[1].len(), 3);
    }
}
