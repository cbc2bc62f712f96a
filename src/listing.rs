//! Page window arithmetic for directory listings.

/// A resolved page of a listing: which records to fetch and which
/// navigation buttons apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number after clamping.
    pub page: u32,
    /// Offset of the first record on this page.
    pub offset: u64,
    /// Total number of pages, at least 1.
    pub total_pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Resolve a requested page against the current record count.
///
/// Out-of-range requests are clamped rather than rejected: a stale
/// "Next" button pressed after deletions lands on the last page
/// instead of producing an empty screen.
pub fn page_window(requested: u32, page_size: u32, total: u64) -> PageWindow {
    let page_size = page_size.max(1);
    let total_pages = (total.div_ceil(page_size as u64)).max(1) as u32;
    let page = requested.clamp(1, total_pages);

    PageWindow {
        page,
        offset: (page as u64 - 1) * page_size as u64,
        total_pages,
        has_prev: page > 1,
        has_next: page < total_pages,
    }
}
