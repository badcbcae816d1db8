use serde::Serialize;

use crate::error::DataValidationError;

/// Requested page, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub index: i64,
    pub size: i64,
}

impl PageRequest {
    pub fn new(index: i64, size: i64) -> Result<Self, DataValidationError> {
        if index < 1 {
            return Err(DataValidationError::InvalidPage(format!(
                "page-index must be at least 1, got {}",
                index
            )));
        }
        if size < 1 {
            return Err(DataValidationError::InvalidPage(format!(
                "page-size must be at least 1, got {}",
                size
            )));
        }
        Ok(Self { index, size })
    }

    pub fn offset(&self) -> i64 {
        (self.index - 1).saturating_mul(self.size)
    }
}

/// Page envelope: page metadata plus the item slice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, total: i64, items: Vec<T>) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total - 1) / request.size + 1
        };

        Self {
            page: request.index,
            per_page: request.size,
            total,
            pages,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert_eq!(PageRequest::new(3, 10).unwrap().offset(), 20);
    }

    #[test]
    fn test_page_count() {
        let req = PageRequest::new(1, 5).unwrap();
        assert_eq!(Page::<()>::new(req, 15, vec![]).pages, 3);
        assert_eq!(Page::<()>::new(req, 16, vec![]).pages, 4);
        assert_eq!(Page::<()>::new(req, 0, vec![]).pages, 0);
    }

    #[test]
    fn test_page_count_with_huge_page_size() {
        let req = PageRequest::new(1, i64::MAX).unwrap();
        assert_eq!(req.offset(), 0);
        assert_eq!(Page::<()>::new(req, 2, vec![]).pages, 1);
        assert_eq!(Page::<()>::new(req, i64::MAX, vec![]).pages, 1);
    }
}
