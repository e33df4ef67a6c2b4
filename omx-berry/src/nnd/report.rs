//! 距离样本的聚合: 结果表、频率分布与剪影边界叠加层.

use crate::consts::HIST_BINS;
use crate::{Area2d, Areas2d};
use itertools::{Itertools, MinMaxResult};
use ordered_float::OrderedFloat;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 单个体素距离样本.
///
/// 坐标为标定单位下的物理坐标 (z 基于重采样后的切片间距); `distance`
/// 是该体素到 compare 通道最近分割结构的有符号距离, 以纳米为单位,
/// 符号沿用距离场的约定 (非负 = 触碰或位于结构内部, 负 = 外部).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistanceSample {
    /// 物理横坐标.
    pub x: f64,

    /// 物理纵坐标.
    pub y: f64,

    /// 物理深度坐标.
    pub z: f64,

    /// 有符号距离 (nm).
    pub distance: f64,
}

impl DistanceSample {
    /// 进入频率分布的非负距离: 触碰或被包含的体素记 0,
    /// 外部体素取其距离的绝对值.
    #[inline]
    pub fn outside_distance(&self) -> f64 {
        (-self.distance).max(0.0)
    }
}

/// 结果表: 每个样本一行, 按插入顺序 (切片优先, 其次子区域, 区域内行优先).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResultsTable {
    map_channel: usize,
    compare_channel: usize,
    rows: Vec<DistanceSample>,
}

impl ResultsTable {
    #[inline]
    pub(crate) fn new(map_channel: usize, compare_channel: usize, rows: Vec<DistanceSample>) -> Self {
        Self {
            map_channel,
            compare_channel,
            rows,
        }
    }

    /// 所有行.
    #[inline]
    pub fn rows(&self) -> &[DistanceSample] {
        &self.rows
    }

    /// 行数.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 表是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 各列标签, 依次对应样本的 x, y, z, distance 字段.
    pub fn column_labels(&self) -> [String; 4] {
        [
            format!("C{} X", self.map_channel),
            format!("C{} Y", self.map_channel),
            format!("C{} Z", self.map_channel),
            format!("Distance to C{} (nm)", self.compare_channel),
        ]
    }
}

/// 固定 [`HIST_BINS`] 个 bin 的相对频率分布, 覆盖样本的经验最小-最大值区间.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Distribution {
    min: f64,
    max: f64,
    counts: Vec<usize>,
    total: usize,
}

impl Distribution {
    /// 从数值序列构建.
    ///
    /// 空序列产生空分布 (没有任何 bin); 所有值相等时区间宽度为 0,
    /// 全部质量落入第 0 个 bin.
    pub fn from_values(values: &[f64]) -> Self {
        let (min, max) = match values.iter().copied().map(OrderedFloat).minmax() {
            MinMaxResult::NoElements => {
                return Self {
                    min: 0.0,
                    max: 0.0,
                    counts: Vec::new(),
                    total: 0,
                }
            }
            MinMaxResult::OneElement(m) => (m.0, m.0),
            MinMaxResult::MinMax(lo, hi) => (lo.0, hi.0),
        };

        let width = (max - min) / HIST_BINS as f64;
        let mut counts = vec![0usize; HIST_BINS];
        for &v in values {
            let bin = if width > 0.0 {
                (((v - min) / width) as usize).min(HIST_BINS - 1)
            } else {
                0
            };
            counts[bin] += 1;
        }
        Self {
            min,
            max,
            counts,
            total: values.len(),
        }
    }

    /// 经验最小值.
    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 经验最大值.
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// 进入分布的样本总数.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// 每个 bin 的计数. 空分布返回空切片.
    #[inline]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// 单个 bin 的宽度. 所有值相等时为 0.
    #[inline]
    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / HIST_BINS as f64
    }

    /// 第 `bin` 个 bin 的中心值.
    ///
    /// 当 `bin` 越界时 panic.
    pub fn bin_centre(&self, bin: usize) -> f64 {
        assert!(bin < self.counts.len());
        self.min + (bin as f64 + 0.5) * self.bin_width()
    }

    /// 第 `bin` 个 bin 的相对频率.
    ///
    /// 当 `bin` 越界时 panic.
    pub fn relative_frequency(&self, bin: usize) -> f64 {
        assert!(bin < self.counts.len());
        self.counts[bin] as f64 / self.total as f64
    }

    /// 所有 bin 的相对频率.
    pub fn relative_frequencies(&self) -> Vec<f64> {
        (0..self.counts.len())
            .map(|b| self.relative_frequency(b))
            .collect()
    }
}

/// 叠加层中的单条剪影边界注记.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverlayRoi {
    channel: usize,
    slice: usize,
    colour: [u8; 3],
    outline: Areas2d,
}

impl OverlayRoi {
    #[inline]
    pub(crate) fn new(channel: usize, slice: usize, colour: [u8; 3], outline: Areas2d) -> Self {
        Self {
            channel,
            slice,
            colour,
            outline,
        }
    }

    /// 来源通道 (1-based).
    #[inline]
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// 对应的 **原始** (未重采样) 图像栈切片索引 (1-based).
    #[inline]
    pub fn slice(&self) -> usize {
        self.slice
    }

    /// 显示颜色 (RGB).
    #[inline]
    pub fn colour(&self) -> [u8; 3] {
        self.colour
    }

    /// 每个子区域的边界像素链 (重采样后切片的像素坐标).
    #[inline]
    pub fn outline(&self) -> &[Area2d] {
        &self.outline
    }
}

/// 映射回原始图像栈几何的剪影边界叠加层.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Overlay {
    entries: Vec<OverlayRoi>,
}

impl Overlay {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn push(&mut self, roi: OverlayRoi) {
        self.entries.push(roi);
    }

    /// 所有注记, 按切片升序; 同一切片内 map 通道先于 compare 通道.
    #[inline]
    pub fn entries(&self) -> &[OverlayRoi] {
        &self.entries
    }

    /// 注记条数.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 叠加层是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 迭代对应原始栈第 `slice` 个切片 (1-based) 的注记.
    pub fn for_slice(&self, slice: usize) -> impl Iterator<Item = &OverlayRoi> {
        self.entries.iter().filter(move |r| r.slice == slice)
    }
}

/// 渲染协作接口: 把带标签的数值序列渲染为频率分布图.
pub trait RenderHistogram {
    /// 渲染一个频率分布.
    fn render_histogram(&mut self, label: &str, values: &[f64]);
}

/// 渲染协作接口: 展示结果表.
pub trait RenderTable {
    /// 展示一个结果表.
    fn render_table(&mut self, label: &str, table: &ResultsTable);
}

/// 一次完整分析的聚合结果.
///
/// 只保留样本、分布、叠加层和标签; 所有派生体数据在分析结束时即被释放.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NndReport {
    label: String,
    table: ResultsTable,
    distribution: Distribution,
    overlay: Overlay,
}

impl NndReport {
    pub(crate) fn new(
        title: &str,
        map_channel: usize,
        compare_channel: usize,
        samples: Vec<DistanceSample>,
        overlay: Overlay,
    ) -> Self {
        let values: Vec<f64> = samples.iter().map(DistanceSample::outside_distance).collect();
        Self {
            label: format!("{title} C{map_channel}-C{compare_channel} Distance"),
            table: ResultsTable::new(map_channel, compare_channel, samples),
            distribution: Distribution::from_values(&values),
            overlay,
        }
    }

    /// 结果标签, 由图像栈标题和通道对组成.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// 结果表.
    #[inline]
    pub fn table(&self) -> &ResultsTable {
        &self.table
    }

    /// 频率分布.
    #[inline]
    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// 剪影边界叠加层.
    #[inline]
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// 进入分布的非负距离序列, 与结果表的行顺序一致.
    pub fn outside_distances(&self) -> Vec<f64> {
        self.table
            .rows()
            .iter()
            .map(DistanceSample::outside_distance)
            .collect()
    }

    /// 通过渲染协作器展示分布与结果表.
    pub fn render(&self, hist: &mut impl RenderHistogram, table: &mut impl RenderTable) {
        hist.render_histogram(&self.label, &self.outside_distances());
        table.render_table(&self.label, &self.table);
    }
}

#[cfg(test)]
mod tests {
    use super::{DistanceSample, Distribution, ResultsTable};
    use crate::consts::HIST_BINS;

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_outside_distance_clamp() {
        let sample = |d: f64| DistanceSample {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            distance: d,
        };
        // 非负 (触碰或内部) 记 0.
        assert!(float_eq(sample(0.0).outside_distance(), 0.0));
        assert!(float_eq(sample(250.0).outside_distance(), 0.0));
        // 负值 (外部) 取绝对值.
        assert!(float_eq(sample(-80.0).outside_distance(), 80.0));
    }

    #[test]
    fn test_distribution_generic() {
        // 0..=63 各出现一次, 加一个落入最后一个 bin 的最大值.
        let mut values: Vec<f64> = (0..64).map(|v| v as f64).collect();
        values.push(63.0);
        let d = Distribution::from_values(&values);

        assert_eq!(d.counts().len(), HIST_BINS);
        assert_eq!(d.total(), 65);
        assert!(float_eq(d.min(), 0.0));
        assert!(float_eq(d.max(), 63.0));
        // 最大值落入最后一个 bin, 不越界.
        assert_eq!(d.counts()[HIST_BINS - 1], 2);
        assert_eq!(d.counts().iter().sum::<usize>(), 65);
        // 相对频率之和为 1.
        let sum: f64 = d.relative_frequencies().iter().sum();
        assert!(float_eq(sum, 1.0));
    }

    #[test]
    fn test_distribution_degenerate() {
        // 空序列: 空分布.
        let d = Distribution::from_values(&[]);
        assert_eq!(d.total(), 0);
        assert!(d.counts().is_empty());
        assert!(d.relative_frequencies().is_empty());

        // 所有值相等: 全部质量在第 0 个 bin.
        let d = Distribution::from_values(&[5.0; 10]);
        assert_eq!(d.total(), 10);
        assert_eq!(d.counts()[0], 10);
        assert!(float_eq(d.bin_width(), 0.0));
        assert!(float_eq(d.relative_frequency(0), 1.0));

        // 单元素同理.
        let d = Distribution::from_values(&[2.5]);
        assert_eq!(d.counts()[0], 1);
    }

    #[test]
    fn test_distribution_bin_centre() {
        let values: Vec<f64> = vec![0.0, 128.0];
        let d = Distribution::from_values(&values);
        assert!(float_eq(d.bin_width(), 2.0));
        assert!(float_eq(d.bin_centre(0), 1.0));
        assert!(float_eq(d.bin_centre(63), 127.0));
    }

    #[test]
    fn test_table_labels() {
        let t = ResultsTable::new(1, 2, vec![]);
        assert!(t.is_empty());
        let [x, y, z, d] = t.column_labels();
        assert_eq!(x, "C1 X");
        assert_eq!(y, "C1 Y");
        assert_eq!(z, "C1 Z");
        assert_eq!(d, "Distance to C2 (nm)");
    }
}
