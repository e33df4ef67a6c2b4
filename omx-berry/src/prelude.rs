//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{
    CalibratedAttr, Calibration, ChannelStack, DistanceField, LengthUnit, MaskSlice, MaskVolume,
    ScanSlice, ScanVolume,
};

pub use crate::region::{Bounds, Silhouette, SubRegion};

pub use crate::nnd::{
    analyse, DistanceSample, Distribution, NndConfig, NndError, NndReport, NndResult, Overlay,
    OverlayRoi, RenderHistogram, RenderTable, ResultsTable, Segment3d, SignedEdt3d, SliceSampler,
    Smooth3d,
};

pub use crate::consts::mask::{is_background, is_foreground, MASK_BACKGROUND, MASK_FOREGROUND};
pub use crate::consts::HIST_BINS;
