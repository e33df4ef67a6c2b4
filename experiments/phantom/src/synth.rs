//! 合成双通道测试栈.

use ndarray::Array3;
use omx_berry::prelude::*;

/// 前景与背景的荧光强度.
const SIGNAL: f32 = 1000.0;
const NOISE_FLOOR: f32 = 20.0;

/// 在体数据中写入一个实心球. `centre` 与 `radius` 以物理单位给出,
/// 体数据按 `cal` 标定 (因此球在各向异性栈中依然是球).
pub fn fill_ball(
    data: &mut Array3<f32>,
    cal: &Calibration,
    centre: (f64, f64, f64),
    radius: f64,
) {
    let (cz, cy, cx) = centre;
    for ((z, h, w), v) in data.indexed_iter_mut() {
        let dz = z as f64 * cal.pixel_depth() - cz;
        let dy = h as f64 * cal.pixel_height() - cy;
        let dx = w as f64 * cal.pixel_width() - cx;
        if dz * dz + dy * dy + dx * dx <= radius * radius {
            *v = SIGNAL;
        }
    }
}

/// 构建双通道球对 phantom: 每个通道各含一个半径 `radius` 的球,
/// 球心沿 x 方向相距 `separation` (物理单位), 整体居中.
pub fn ball_pair(shape: Idx3d, radius: f64, separation: f64, cal: Calibration) -> ChannelStack {
    let (z, h, w) = shape;
    let centre_z = z as f64 * cal.pixel_depth() / 2.0;
    let centre_y = h as f64 * cal.pixel_height() / 2.0;
    let centre_x = w as f64 * cal.pixel_width() / 2.0;

    let mut c1 = Array3::from_elem(shape, NOISE_FLOOR);
    let mut c2 = Array3::from_elem(shape, NOISE_FLOOR);
    fill_ball(
        &mut c1,
        &cal,
        (centre_z, centre_y, centre_x - separation / 2.0),
        radius,
    );
    fill_ball(
        &mut c2,
        &cal,
        (centre_z, centre_y, centre_x + separation / 2.0),
        radius,
    );

    ChannelStack::from_channels("ball pair", vec![c1, c2], cal)
}
