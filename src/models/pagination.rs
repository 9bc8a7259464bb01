use serde::{Deserialize, Serialize};

use crate::config::MAX_PAGE_SIZE;

/// 页码窗口中当前页两侧各显示的页数
const WINDOW_RADIUS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// 分页控件所需的状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub page_size: u32,
    pub total_count: u64,
}

impl Pagination {
    pub fn new(current_page: u32, page_size: u32, total_count: u64) -> Self {
        let page_size = clamp_page_size(page_size);
        let mut pagination = Self {
            current_page: 1,
            page_size,
            total_count,
        };
        pagination.current_page = current_page.clamp(1, pagination.total_pages().max(1));
        pagination
    }

    pub fn total_pages(&self) -> u32 {
        let pages = self.total_count.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// 首页与末页总是出现，当前页附近的页码连续显示，其余位置以省略号代替
    pub fn items(&self) -> Vec<PageItem> {
        let total = self.total_pages();
        if total == 0 {
            return Vec::new();
        }

        let start = self.current_page.saturating_sub(WINDOW_RADIUS).max(1);
        let end = self.current_page.saturating_add(WINDOW_RADIUS).min(total);

        let mut items = Vec::new();
        if start > 1 {
            items.push(PageItem::Page(1));
            if start > 2 {
                items.push(PageItem::Ellipsis);
            }
        }
        items.extend((start..=end).map(PageItem::Page));
        if end < total {
            if end < total - 1 {
                items.push(PageItem::Ellipsis);
            }
            items.push(PageItem::Page(total));
        }
        items
    }
}

pub fn clamp_page_size(page_size: u32) -> u32 {
    page_size.clamp(1, MAX_PAGE_SIZE)
}
