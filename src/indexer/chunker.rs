use super::types::BlockRange;

/// Splits `[start, end]` into consecutive ranges of at most `max_width` blocks.
///
/// Nodes cap how many blocks (or result rows) a single `eth_getLogs` may
/// cover, so every log query goes through this iterator. The last range is
/// clamped to `end` and may be narrower. `start > end` yields nothing.
#[derive(Debug, Clone)]
pub struct RangeChunker {
    next: Option<u64>,
    end: u64,
    max_width: u64,
}

impl RangeChunker {
    pub fn new(start: u64, end: u64, max_width: u64) -> Self {
        Self {
            next: (start <= end).then_some(start),
            end,
            max_width: max_width.max(1),
        }
    }

    pub fn over(range: BlockRange, max_width: u64) -> Self {
        Self::new(range.start, range.end, max_width)
    }
}

impl Iterator for RangeChunker {
    type Item = BlockRange;

    fn next(&mut self) -> Option<BlockRange> {
        let start = self.next?;
        let end = start.saturating_add(self.max_width - 1).min(self.end);
        self.next = end.checked_add(1).filter(|n| *n <= self.end);
        Some(BlockRange { start, end })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            None => (0, Some(0)),
            Some(start) => {
                let remaining = ((self.end - start) / self.max_width).saturating_add(1);
                let n = usize::try_from(remaining).unwrap_or(usize::MAX);
                (n, Some(n))
            }
        }
    }
}
