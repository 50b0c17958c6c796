use super::params::QueryPairs;
use crate::models::{DocumentStatus, JobStatus, JobType};
use std::fmt;
use std::str::FromStr;

/// One filter axis. `All` is the default and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Filter<T> {
    All,
    Only(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Filter::All
    }
}

impl<T> Filter<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Filter::All => None,
            Filter::Only(value) => Some(value),
        }
    }
}

impl<T: FromStr> Filter<T> {
    /// `None`, the empty string and `all` all mean "no filter".
    pub fn parse(raw: Option<&str>) -> Result<Self, T::Err> {
        match raw {
            None | Some("") | Some("all") => Ok(Filter::All),
            Some(value) => value.parse().map(Filter::Only),
        }
    }
}

impl<T: fmt::Display> Filter<T> {
    pub fn to_param(&self) -> Option<String> {
        self.value()
            .map(|value| value.to_string())
            .filter(|value| !value.is_empty() && value != "all")
    }
}

impl<T> From<Option<T>> for Filter<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Filter::All, Filter::Only)
    }
}

/// The set of filter axes a list view exposes.
pub trait ListFilters: Clone + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Query-string keys owned by this filter set, in canonical order.
    const KEYS: &'static [&'static str];

    /// Hydrate from URL pairs. Values that do not parse fall back to `All`.
    fn read(pairs: &QueryPairs) -> Self;

    /// Non-default axes as `(key, value)` pairs, in `KEYS` order.
    fn write(&self) -> Vec<(&'static str, String)>;

    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

fn read_filter<T>(pairs: &QueryPairs, key: &'static str) -> Filter<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match Filter::parse(pairs.get(key)) {
        Ok(filter) => filter,
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring invalid filter value in URL");
            Filter::All
        }
    }
}

fn push_filter<T: fmt::Display>(
    pairs: &mut Vec<(&'static str, String)>,
    key: &'static str,
    filter: &Filter<T>,
) {
    if let Some(value) = filter.to_param() {
        pairs.push((key, value));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilters {
    pub status: Filter<DocumentStatus>,
    pub mime_type: Filter<String>,
    pub project_id: Filter<String>,
}

impl ListFilters for DocumentFilters {
    const KEYS: &'static [&'static str] = &["status", "mime_type", "project_id"];

    fn read(pairs: &QueryPairs) -> Self {
        Self {
            status: read_filter(pairs, "status"),
            mime_type: read_filter(pairs, "mime_type"),
            project_id: read_filter(pairs, "project_id"),
        }
    }

    fn write(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_filter(&mut pairs, "status", &self.status);
        push_filter(&mut pairs, "mime_type", &self.mime_type);
        push_filter(&mut pairs, "project_id", &self.project_id);
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilters {
    pub status: Filter<JobStatus>,
    pub job_type: Filter<JobType>,
    pub project_id: Filter<String>,
}

impl ListFilters for JobFilters {
    const KEYS: &'static [&'static str] = &["status", "type", "project_id"];

    fn read(pairs: &QueryPairs) -> Self {
        Self {
            status: read_filter(pairs, "status"),
            job_type: read_filter(pairs, "type"),
            project_id: read_filter(pairs, "project_id"),
        }
    }

    fn write(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_filter(&mut pairs, "status", &self.status);
        push_filter(&mut pairs, "type", &self.job_type);
        push_filter(&mut pairs, "project_id", &self.project_id);
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_and_empty_parse_to_no_filter() {
        assert_eq!(Filter::<String>::parse(None), Ok(Filter::All));
        assert_eq!(Filter::<String>::parse(Some("")), Ok(Filter::All));
        assert_eq!(Filter::<String>::parse(Some("all")), Ok(Filter::All));
        assert_eq!(
            Filter::<String>::parse(Some("application/pdf")),
            Ok(Filter::Only("application/pdf".to_string()))
        );
    }

    #[test]
    fn empty_string_filter_is_not_written() {
        let filter = Filter::Only(String::new());
        assert_eq!(filter.to_param(), None);
    }

    #[test]
    fn default_document_filters_write_nothing() {
        assert!(DocumentFilters::default().write().is_empty());
        assert!(DocumentFilters::default().is_default());
    }

    #[test]
    fn document_filters_write_in_canonical_order() {
        let filters = DocumentFilters {
            status: Filter::Only(DocumentStatus::Failed),
            mime_type: Filter::All,
            project_id: Filter::Only("proj-7".into()),
        };
        assert_eq!(
            filters.write(),
            vec![("status", "failed".to_string()), ("project_id", "proj-7".to_string())]
        );
    }

    #[test]
    fn unknown_status_in_url_falls_back_to_all() {
        let pairs = QueryPairs::parse("status=archived&type=extract_text").unwrap();
        let filters = JobFilters::read(&pairs);
        assert!(filters.status.is_all());
        assert_eq!(filters.job_type, Filter::Only(JobType::ExtractText));
    }
}
