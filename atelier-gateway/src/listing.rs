//! Client-side filtering and pagination of fetched lists

use atelier_shared::{ContentVideo, Order, Product, ReturnRequest};
use serde::Serialize;

pub const DEFAULT_PER_PAGE: usize = 10;

/// Text and status a list row can be filtered on
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;

    fn status(&self) -> Option<&str> {
        None
    }
}

impl Searchable for Product {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.id.as_str(), self.name.as_str()];
        fields.extend(self.description.as_deref());
        fields.extend(self.category.as_deref());
        fields.extend(self.variants.iter().map(|v| v.sku.as_str()));
        fields
    }

    fn status(&self) -> Option<&str> {
        Some(Product::status(self))
    }
}

impl Searchable for Order {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.id.as_str()];
        fields.extend(self.order_number.as_deref());
        fields.extend(self.customer_name.as_deref());
        fields.extend(self.customer_email.as_deref());
        fields.extend(self.tracking_number.as_deref());
        fields
    }

    fn status(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
}

impl Searchable for ReturnRequest {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.id.as_str(), self.order_id.as_str()];
        fields.extend(self.reason.as_deref());
        fields
    }

    fn status(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
}

impl Searchable for ContentVideo {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    /// Case-insensitive substring over the searchable fields
    pub search: Option<String>,
    /// Exact (case-insensitive) status match
    pub status: Option<String>,
}

impl ListingQuery {
    fn matches<T: Searchable>(&self, item: &T) -> bool {
        if let Some(status) = self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if !item
                .status()
                .is_some_and(|item_status| item_status.eq_ignore_ascii_case(status))
            {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(needle) => {
                let needle = needle.to_lowercase();
                item.search_fields()
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }
}

pub fn filter_items<'a, T: Searchable>(items: &'a [T], query: &ListingQuery) -> Vec<&'a T> {
    items.iter().filter(|item| query.matches(*item)).collect()
}

/// One page of a list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// 1-based pagination; page 0 reads as page 1, pages past the end are empty
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let page = page.max(1);
    let per_page = if per_page == 0 { DEFAULT_PER_PAGE } else { per_page };
    let total = items.len();
    let total_pages = total.div_ceil(per_page);

    let start = (page - 1).saturating_mul(per_page).min(total);
    let end = start.saturating_add(per_page).min(total);

    Page {
        items: items[start..end].to_vec(),
        page,
        per_page,
        total,
        total_pages,
    }
}
