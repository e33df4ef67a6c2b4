use crate::Idx2d;

/// 行优先索引迭代器.
///
/// 内部只维护一个线性游标, 比 `flat_map` 组合子的迭代器对象更紧凑.
#[derive(Debug)]
pub struct PosIter {
    next: usize,
    len: usize,
    w: usize,
}

impl PosIter {
    #[inline]
    pub fn new((h, w): Idx2d) -> Self {
        Self {
            next: 0,
            len: h * w,
            // w == 0 时 len == 0, 迭代器为空, 除数取 1 即可.
            w: w.max(1),
        }
    }
}

impl Iterator for PosIter {
    type Item = Idx2d;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == self.len {
            return None;
        }
        let pos = (self.next / self.w, self.next % self.w);
        self.next += 1;
        Some(pos)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.len - self.next;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for PosIter {}
