/// 照片列表分页参数，page_size 为 0 表示不分页
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhotoPage {
    pub page_size: u64,
    pub page_num: u64,
}

impl PhotoPage {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(page_size: u64, page_num: u64) -> Self {
        Self {
            page_size,
            page_num,
        }
    }

    pub fn is_paged(&self) -> bool {
        self.page_size > 0
    }

    /// Index range of this page within a fully ordered result.
    pub fn bounds(&self, total: usize) -> (usize, usize) {
        if !self.is_paged() {
            return (0, total);
        }
        let start = (self.page_size.saturating_mul(self.page_num) as usize).min(total);
        let end = start.saturating_add(self.page_size as usize).min(total);
        (start, end)
    }
}
