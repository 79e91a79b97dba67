//! Natural-size distribution.
//!
//! The single numeric primitive shared by the box, grid and flow box
//! allocators: grow a set of entries from their minimum towards their
//! natural size with a fixed pixel budget.

/// One entry being sized: its current size (in `minimum`) and the size it
/// would like (`natural`). `data` is an opaque tag for the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestedSize {
    /// Caller-defined tag (usually an index).
    pub data: usize,
    /// Size the entry currently holds; grows during distribution.
    pub minimum: i32,
    /// Size the entry would like.
    pub natural: i32,
}

impl RequestedSize {
    /// Create an entry.
    #[must_use]
    pub const fn new(data: usize, minimum: i32, natural: i32) -> Self {
        Self {
            data,
            minimum,
            natural,
        }
    }

    const fn gap(&self) -> i32 {
        let gap = self.natural - self.minimum;
        if gap > 0 { gap } else { 0 }
    }
}

/// Distribute `extra` pixels over `sizes`, raising each entry's `minimum`
/// towards its `natural`.
///
/// Entries are served smallest-gap first with an equal share of what is
/// left, so when the budget runs out it is the entries furthest from their
/// natural size that stay short, and they stay short by the same amount.
/// Returns the pixels left over once every entry reached its natural size.
///
/// ```
/// use trellis_layout::distribute::{distribute_natural, RequestedSize};
///
/// let mut sizes = [RequestedSize::new(0, 20, 30), RequestedSize::new(1, 20, 60)];
/// assert_eq!(distribute_natural(100, &mut sizes), 50);
/// assert_eq!((sizes[0].minimum, sizes[1].minimum), (30, 60));
/// ```
pub fn distribute_natural(extra: i32, sizes: &mut [RequestedSize]) -> i32 {
    let mut extra = extra.max(0);
    if sizes.is_empty() {
        return extra;
    }

    // Largest gap first; ties broken by higher index first.
    let mut spreading: Vec<usize> = (0..sizes.len()).collect();
    spreading.sort_by(|&a, &b| {
        sizes[b]
            .gap()
            .cmp(&sizes[a].gap())
            .then_with(|| b.cmp(&a))
    });

    // Walk from the smallest gap; each entry takes at most an even share of
    // what remains.
    for (i, &index) in spreading.iter().enumerate().rev() {
        if extra <= 0 {
            break;
        }
        let remaining = i32::try_from(i + 1).unwrap_or(i32::MAX);
        let glue = (extra + remaining - 1) / remaining;
        let grow = glue.min(sizes[index].gap());
        sizes[index].minimum += grow;
        extra -= grow;
    }

    extra
}

/// Split `total` into `count` floor-divided shares, giving one extra pixel
/// to the first `total % count` shares.
#[must_use]
pub fn split_evenly(total: i32, count: usize) -> Vec<i32> {
    if count == 0 {
        return Vec::new();
    }
    let n = i32::try_from(count).unwrap_or(i32::MAX);
    let base = total.div_euclid(n);
    let remainder = total.rem_euclid(n);
    (0..n).map(|i| base + i32::from(i < remainder)).collect()
}
