//! 分页相关的数据结构

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DrawRecordResponse, LedgerEntryResponse};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: Some(1),
            page_size: Some(DEFAULT_PAGE_SIZE),
        }
    }
}

impl PaginationParams {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.map(|p| p as i64),
            page_size: per_page.map(|p| p as i64),
        }
    }

    pub fn get_page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn get_offset(&self) -> i64 {
        (self.get_page() - 1) * self.get_limit()
    }

    pub fn get_limit(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(
    DrawRecordPage = PaginatedResponse<DrawRecordResponse>,
    LedgerEntryPage = PaginatedResponse<LedgerEntryResponse>
)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, params: &PaginationParams, total: i64) -> Self {
        let page_size = params.get_limit();
        let total_pages = (total + page_size - 1) / page_size;
        Self {
            data,
            page: params.get_page(),
            page_size,
            total,
            total_pages,
        }
    }
}
