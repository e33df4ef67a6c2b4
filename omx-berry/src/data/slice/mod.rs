//! 扫描/掩膜切片对象的操作.

mod core;
mod iter;

pub use self::core::{MaskSlice, ScanSlice};

pub(crate) use self::core::neighbour4;
