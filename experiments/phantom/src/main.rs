//! 在合成球对 phantom 上运行完整的最近邻体素距离分析.

mod collab;
mod synth;

use log::info;
use omx_berry::prelude::*;
use simple_logger::SimpleLogger;

/// 以文本条形图输出频率分布.
struct ConsoleHistogram;

impl RenderHistogram for ConsoleHistogram {
    fn render_histogram(&mut self, label: &str, values: &[f64]) {
        let dist = Distribution::from_values(values);
        info!(
            "{label}: {} 个样本, 距离范围 [{:.1}, {:.1}] nm",
            dist.total(),
            dist.min(),
            dist.max()
        );
        for (bin, &count) in dist.counts().iter().enumerate() {
            if count == 0 {
                continue;
            }
            let bar = "#".repeat((dist.relative_frequency(bin) * 60.0).ceil() as usize);
            info!("{:>9.1} nm | {bar} {count}", dist.bin_centre(bin));
        }
    }
}

/// 输出结果表的前几行和总行数.
struct ConsoleTable;

impl RenderTable for ConsoleTable {
    fn render_table(&mut self, label: &str, table: &ResultsTable) {
        let [x, y, z, d] = table.column_labels();
        info!("{label}: {} 行 [{x} | {y} | {z} | {d}]", table.len());
        for row in table.rows().iter().take(5) {
            info!(
                "  {:8.3} {:8.3} {:8.3} {:10.1}",
                row.x, row.y, row.z, row.distance
            );
        }
        if table.len() > 5 {
            info!("  ... 其余 {} 行省略", table.len() - 5);
        }
    }
}

fn main() {
    SimpleLogger::new().init().expect("日志初始化失败");

    // OMX 量级的标定: 平面 80 nm, 切片间距 125 nm.
    let cal = Calibration::new(0.08, 0.08, 0.125, LengthUnit::Micron).expect("非法标定");
    let stack = synth::ball_pair((12, 40, 40), 0.5, 1.6, cal);
    let cfg = NndConfig::new(1, 2).with_smoothing_sigma((1.0, 1.0, 1.0));

    info!(
        "对 {} 运行最近邻距离分析 (C{} -> C{})...",
        stack.title(),
        cfg.map_channel(),
        cfg.compare_channel()
    );
    let report = analyse(
        &stack,
        &cfg,
        &collab::GaussianSmooth,
        &collab::MaxEntropyThreshold,
        &collab::ExhaustiveSignedEdt,
    )
    .expect("分析失败");

    info!("叠加层注记 {} 条", report.overlay().len());
    report.render(&mut ConsoleHistogram, &mut ConsoleTable);
}
