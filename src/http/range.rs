//! HTTP Range request parsing module
//!
//! Single `bytes` range only. The end offset is normalized against the file
//! size: an absent end, an end of zero, or an end past the last byte all mean
//! "to EOF".

/// Inclusive byte span `start..=end` inside a file of known size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte to send
    pub start: u64,
    /// Last byte to send (inclusive)
    pub end: u64,
}

// A span always holds at least one byte
#[allow(clippy::len_without_is_empty)]
impl ByteRange {
    /// Span covering a whole non-empty file, `None` for an empty one
    pub const fn whole(size: u64) -> Option<Self> {
        if size == 0 {
            None
        } else {
            Some(Self {
                start: 0,
                end: size - 1,
            })
        }
    }

    /// Number of bytes in the span
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for this span
    pub fn content_range(&self, total_size: u64) -> String {
        format!("bytes {}-{}/{total_size}", self.start, self.end)
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Satisfiable range, already normalized
    Valid(ByteRange),
    /// Start at or past EOF, or start after end - answered with 416
    NotSatisfiable,
    /// Not a single `bytes` range; the whole file is served instead
    Ignored,
}

/// Parse a `Range` header value against the file size
///
/// Supported formats:
/// - `bytes=start-end` - Specific range
/// - `bytes=start-` - From start to end
/// - `bytes=-suffix` - Last suffix bytes
///
/// # Examples
/// ```
/// use treeserve::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// assert_eq!(
///     parse_range_header("bytes=10-", 100),
///     RangeParseResult::Valid(ByteRange { start: 10, end: 99 })
/// );
/// assert_eq!(parse_range_header("bytes=100-", 100), RangeParseResult::NotSatisfiable);
/// ```
pub fn parse_range_header(header: &str, file_size: u64) -> RangeParseResult {
    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        return RangeParseResult::Ignored;
    };

    // Only support single range (not multi-range)
    if spec.contains(',') {
        return RangeParseResult::Ignored;
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return RangeParseResult::Ignored;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        return parse_suffix_range(end_str, file_size);
    }

    parse_standard_range(start_str, end_str, file_size)
}

/// Parse suffix range (e.g., "-500")
fn parse_suffix_range(suffix_str: &str, file_size: u64) -> RangeParseResult {
    let Ok(suffix) = suffix_str.parse::<u64>() else {
        return RangeParseResult::Ignored;
    };

    if suffix == 0 || file_size == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(ByteRange {
        start: file_size.saturating_sub(suffix),
        end: file_size - 1,
    })
}

/// Parse standard range (e.g., "0-99" or "100-")
fn parse_standard_range(start_str: &str, end_str: &str, file_size: u64) -> RangeParseResult {
    let Ok(start) = start_str.parse::<u64>() else {
        return RangeParseResult::Ignored;
    };

    let requested_end = if end_str.is_empty() {
        None
    } else {
        let Ok(e) = end_str.parse::<u64>() else {
            return RangeParseResult::Ignored;
        };
        Some(e)
    };

    if start >= file_size {
        return RangeParseResult::NotSatisfiable;
    }

    let last = file_size - 1;
    let end = match requested_end {
        Some(e) if e != 0 && e < file_size => e,
        _ => last,
    };

    if start > end {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(ByteRange { start, end })
}
