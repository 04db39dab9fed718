use serde::Deserialize;

use classifieds_db::{Page, PageRequest};
use classifieds_types::api::ListResponse;

use crate::config::AppConfig;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Kept as raw text: anything that is not an integer selects page 1.
    pub page: Option<String>,
}

impl PageQuery {
    pub fn request(&self, config: &AppConfig) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), config.page_size)
    }
}

pub fn list_response<T, U, F>(page: Page<T>, f: F) -> ListResponse<U>
where
    F: FnMut(T) -> U,
{
    let page = page.map(f);
    ListResponse {
        items: page.items,
        num_pages: page.num_pages,
        total: page.total,
    }
}
