//! Fixed-size paging over an already filtered row set. Pages are 1-based.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginator {
    pub total_records: usize,
    pub page_size:     usize,
    pub total_pages:   usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub current_page:  usize,
    pub total_pages:   usize,
    pub page_size:     usize,
    pub total_records: usize,
    /// 1-based index of the first row shown; 0 when there are no rows.
    pub start_index:   usize,
    /// 1-based index of the last row shown; 0 when there are no rows.
    pub end_index:     usize,
    pub showing_count: usize,
}

impl Paginator {
    /// There is always at least one (possibly empty) page.
    pub fn new(total_records: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_records.div_ceil(page_size).max(1);
        Self { total_records, page_size, total_pages }
    }

    /// Clamp a requested page into `1..=total_pages`.
    pub fn clamp_page(&self, page: usize) -> usize {
        page.clamp(1, self.total_pages)
    }

    fn bounds(&self, page: usize) -> (usize, usize) {
        let page = self.clamp_page(page);
        let start = ((page - 1) * self.page_size).min(self.total_records);
        let end = (start + self.page_size).min(self.total_records);
        (start, end)
    }

    pub fn page<'a, T>(&self, rows: &'a [T], page: usize) -> &'a [T] {
        let (start, end) = self.bounds(page);
        let end = end.min(rows.len());
        &rows[start.min(end)..end]
    }

    pub fn page_info(&self, page: usize) -> PageInfo {
        let current_page = self.clamp_page(page);
        let (start, end) = self.bounds(current_page);
        let showing_count = end - start;
        PageInfo {
            current_page,
            total_pages:   self.total_pages,
            page_size:     self.page_size,
            total_records: self.total_records,
            start_index:   if showing_count == 0 { 0 } else { start + 1 },
            end_index:     end,
            showing_count,
        }
    }
}
