use serde::{Deserialize, Serialize};

/// Anything rendered as a selectable row.
pub trait Identified {
    fn id(&self) -> &str;
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult<T> {
    pub results: Vec<T>,
    pub total: u64,
}

impl<T> ListResult<T> {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            total: 0,
        }
    }

    pub fn total_pages(&self, limit: u32) -> u64 {
        if limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(limit))
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<T: Identified> ListResult<T> {
    pub fn ids(&self) -> Vec<String> {
        self.results.iter().map(|item| item.id().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let list: ListResult<()> = ListResult {
            results: vec![],
            total: 41,
        };
        assert_eq!(list.total_pages(20), 3);
        assert_eq!(list.total_pages(0), 0);
        assert_eq!(ListResult::<()>::empty().total_pages(20), 0);
    }
}
