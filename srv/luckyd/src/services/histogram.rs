use crate::models::{Bin, HistoryItem};

pub const BIN_COUNT: usize = 6;

/// Bin every number drawn so far, in history order.
pub fn bin_history(history: &[HistoryItem]) -> Vec<Bin> {
    let values: Vec<i64> = history.iter().flat_map(|item| item.results.iter().copied()).collect();
    bin_values(&values)
}

/// Equal-width bins spanning the observed range. The width is the ceiling of
/// `(range + 1) / BIN_COUNT`, or 1 when every value is equal; values past the
/// last bin are clamped into it and bins starting after `max` are dropped.
pub fn bin_values(values: &[i64]) -> Vec<Bin> {
    let (min, max) = match (values.iter().min(), values.iter().max()) {
        (Some(&min), Some(&max)) => (min, max),
        _ => return Vec::new(),
    };

    // i128 keeps `max - min + 1` and the bin edges exact across the whole i64 range.
    let (lo, hi) = (min as i128, max as i128);
    let range = hi - lo;
    let bins_wide = BIN_COUNT as i128;
    let bin_size = if range == 0 { 1 } else { (range + 1 + bins_wide - 1) / bins_wide };

    let mut counts = [0usize; BIN_COUNT];
    for &value in values {
        let index = ((value as i128 - lo) / bin_size).min(bins_wide - 1) as usize;
        counts[index] += 1;
    }

    (0..BIN_COUNT)
        .filter_map(|i| {
            let start = lo + i as i128 * bin_size;
            if start > hi {
                return None;
            }
            let end = hi.min(start + bin_size - 1);
            // start and end lie within [min, max] here
            let (start, end) = (start as i64, end as i64);
            let name = if start == end { start.to_string() } else { format!("{}-{}", start, end) };
            Some(Bin { name, start, end, count: counts[i] })
        })
        .collect()
}
