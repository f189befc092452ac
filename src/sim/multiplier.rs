//! Payout multiplier table
//!
//! Multipliers grow by one per bin away from the middle of the bin row.

/// Payout multiplier for `bin_index` in a row of `total_bins` bins.
///
/// With an odd bin count this is `|i - floor(n/2)| + 1`. With an even count the
/// middle is a pair of bins and the distance is taken to the nearer of the two,
/// keeping the table symmetric.
pub fn multiplier_for(bin_index: usize, total_bins: usize) -> u32 {
    if total_bins == 0 {
        return 1;
    }
    let lower_mid = (total_bins - 1) / 2;
    let upper_mid = total_bins / 2;
    let distance = if bin_index < lower_mid {
        lower_mid - bin_index
    } else if bin_index > upper_mid {
        bin_index - upper_mid
    } else {
        0
    };
    distance as u32 + 1
}
