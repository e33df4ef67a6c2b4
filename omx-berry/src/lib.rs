#![warn(missing_docs)]

//! 核心库. 对双通道 (或多通道) 标定 3D 荧光显微图像栈, 计算 map 通道分割结构的
//! 每个剪影体素到 compare 通道最近分割结构的距离, 并聚合为频率分布、结果表和
//! 可回映到原始栈几何的剪影边界叠加层.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 阈值分割、3D 平滑与精确有符号欧氏距离变换不由本 crate 实现,
//!    而是通过 [`nnd`] 模块中的协作接口注入. 图像的采集与读写同样是调用方的职责.
//! 2. 在非期望情况下 (越界索引, 非法构造参数), 程序会直接 panic,
//!    而不会导致内存错误. As what Rust promises.
//!
//! # 流水线结构
//!
//! ### 深度方向重采样 (reslice)
//!
//! 把各向异性的图像栈沿 z 方向线性插值为等距切片.
//!
//! 实现位于 `omx-berry/src/reslice.rs`.
//!
//! ### 掩膜剪影的区域分解
//!
//! 把每个掩膜切片的前景剪影按 4-相邻规则分解为以包围盒约束的简单子区域,
//! 使逐像素包含测试的开销被限制在各自的包围盒内.
//!
//! 实现位于 `omx-berry/src/region`.
//!
//! ### 逐切片距离采样与聚合
//!
//! 沿重采样后的每个切片遍历 map 通道剪影内的全部像素, 读取距离场并换算为物理单位,
//! 聚合为 64-bin 相对频率分布、逐样本结果表和剪影边界叠加层.
//!
//! 实现位于 `omx-berry/src/nnd`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

type Predicate = fn(u8) -> bool;

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

/// 标定体数据基础结构.
mod data;

pub use data::{
    CalibratedAttr, Calibration, ChannelStack, DistanceField, LengthUnit, MaskSlice, MaskVolume,
    ScanSlice, ScanVolume,
};

pub mod consts;

mod reslice;

pub mod region;

pub mod nnd;
pub mod prelude;
