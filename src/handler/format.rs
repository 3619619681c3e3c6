//! Human-readable sizes and timestamps for directory listings

use chrono::{DateTime, Local};
use std::time::SystemTime;

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

/// Size with one decimal in K, M or G
///
/// A unit is only used once the value is past 1.1 of it; everything at or
/// below 1.1 MiB stays in K, including sizes under one KiB.
///
/// # Examples
/// ```
/// use treeserve::handler::format::format_size;
/// assert_eq!(format_size(500), "0.5K");
/// assert_eq!(format_size(2048), "2.0K");
/// assert_eq!(format_size(1_200_000), "1.1M");
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn format_size(size: u64) -> String {
    let size = size as f64;
    if size > 1.1 * GIB {
        format!("{:.1}G", size / GIB)
    } else if size > 1.1 * MIB {
        format!("{:.1}M", size / MIB)
    } else {
        format!("{:.1}K", size / KIB)
    }
}

/// Local wall-clock time as `YYYY-MM-DD HH:MM`
pub fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format("%Y-%m-%d %H:%M").to_string()
}
