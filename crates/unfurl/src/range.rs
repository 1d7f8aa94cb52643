//! Page-range specifier parsing.
//!
//! A range specifier is a comma-separated list of tokens such as
//! `"1-3,5,7-"`. Each token is an optional start, an optional dash and
//! an optional end; tokens with neither a start nor an end are
//! dropped. The parsed ranges are normalized into a sorted, merged set
//! of closed intervals.

/// Sentinel upper bound for open-ended ranges such as `"5-"`
pub const PAGE_MAX: u32 = u32::MAX;

/// A closed interval of 1-based page positions, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Create a range, swapping the bounds if they arrive reversed
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Whether a 1-based page position falls inside this range
    pub fn contains(&self, page: u32) -> bool {
        self.start <= page && page <= self.end
    }

    /// Number of pages this range covers
    pub fn span(&self) -> u64 {
        u64::from(self.end - self.start) + 1
    }
}

/// Whether any range in the set covers the given page position
pub fn ranges_contain(ranges: &[PageRange], page: u32) -> bool {
    ranges.iter().any(|r| r.contains(page))
}

/// Total number of pages covered by a merged range set
pub fn ranges_span(ranges: &[PageRange]) -> u64 {
    ranges.iter().map(PageRange::span).sum()
}

/// Parse one token: optional start digits, optional dash, optional end
/// digits. Returns `None` for anything else, including an empty token
/// or a bare dash.
fn parse_token(token: &str) -> Option<PageRange> {
    let (start_str, dash, end_str) = match token.find('-') {
        Some(i) => (&token[..i], true, &token[i + 1..]),
        None => (token, false, ""),
    };

    if !start_str.bytes().all(|b| b.is_ascii_digit())
        || !end_str.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    if start_str.is_empty() && end_str.is_empty() {
        return None;
    }

    let start: u32 = if start_str.is_empty() {
        1
    } else {
        start_str.parse().ok()?
    };
    let end: u32 = if end_str.is_empty() {
        if dash {
            PAGE_MAX
        } else {
            start
        }
    } else {
        end_str.parse().ok()?
    };

    Some(PageRange::new(start, end))
}

/// Parse a full specifier into a sorted, merged set of ranges.
///
/// Invalid tokens are dropped. Overlapping and touching ranges are
/// coalesced, so the result is independent of token order. An empty or
/// entirely invalid specifier yields an empty set; callers substitute
/// their own default.
pub fn parse_ranges(input: &str) -> Vec<PageRange> {
    let mut ranges: Vec<PageRange> = input.split(',').filter_map(parse_token).collect();
    ranges.sort_by_key(|r| r.start);

    let mut merged: Vec<PageRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(prev) if range.start <= prev.end => {
                prev.end = prev.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}
