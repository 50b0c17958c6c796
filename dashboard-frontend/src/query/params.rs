use super::filter::ListFilters;
use serde::ser::{Serialize, SerializeMap, Serializer};

pub const SEARCH_KEY: &str = "search";
pub const PAGE_KEY: &str = "page";
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Decoded `application/x-www-form-urlencoded` pairs in their original
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPairs(Vec<(String, String)>);

impl QueryPairs {
    /// Accepts the query string with or without its leading `?`.
    pub fn parse(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        let query = query.strip_prefix('?').unwrap_or(query);
        serde_urlencoded::from_str::<Vec<(String, String)>>(query).map(Self)
    }

    /// First value for `key`, as `URLSearchParams.get` would return it.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Pairs whose key is not in `known`, order preserved.
    pub fn unknown(&self, known: &[&str]) -> Vec<(String, String)> {
        self.0
            .iter()
            .filter(|(k, _)| !known.contains(&k.as_str()))
            .cloned()
            .collect()
    }
}

pub(crate) fn encode_pairs<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> String {
    let borrowed: Vec<(&str, &str)> = pairs
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .collect();
    serde_urlencoded::to_string(borrowed).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to encode query string");
        String::new()
    })
}

/// The URL-facing state of a list view: what the user typed and picked.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<F> {
    pub search: String,
    pub filters: F,
    pub page: u32,
    /// Keys this view does not own, carried through untouched.
    pub extra: Vec<(String, String)>,
}

impl<F: ListFilters> Default for QueryState<F> {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: F::default(),
            page: 1,
            extra: Vec::new(),
        }
    }
}

impl<F: ListFilters> QueryState<F> {
    /// Hydrate from a (possibly shared) URL. Malformed input never fails;
    /// offending values fall back to their defaults.
    pub fn from_query_string(query: &str) -> Self {
        let pairs = match QueryPairs::parse(query) {
            Ok(pairs) => pairs,
            Err(e) => {
                tracing::warn!(query, error = %e, "Ignoring undecodable query string");
                return Self::default();
            }
        };

        let page = match pairs.get(PAGE_KEY) {
            None => 1,
            Some(raw) => match raw.parse::<u32>() {
                Ok(page) if page >= 1 => page,
                _ => {
                    tracing::warn!(page = raw, "Ignoring invalid page in URL");
                    1
                }
            },
        };

        let mut known = vec![SEARCH_KEY, PAGE_KEY];
        known.extend_from_slice(F::KEYS);

        Self {
            search: pairs.get(SEARCH_KEY).unwrap_or_default().to_string(),
            filters: F::read(&pairs),
            page,
            extra: pairs.unknown(&known),
        }
    }

    /// Canonical query string: `search`, the filter keys, `page`, then any
    /// foreign keys. Defaults are omitted, so the default state encodes to
    /// the empty string.
    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if !self.search.is_empty() {
            pairs.push((SEARCH_KEY, self.search.clone()));
        }
        pairs.extend(self.filters.write());
        if self.page > 1 {
            pairs.push((PAGE_KEY, self.page.to_string()));
        }
        for (key, value) in &self.extra {
            pairs.push((key.as_str(), value.clone()));
        }
        encode_pairs(&pairs)
    }

    /// Request parameters for this state. `search` is passed separately
    /// because the fetch side only sees the debounced term.
    pub fn to_params(&self, limit: u32, search: &str) -> QueryParams<F> {
        QueryParams {
            page: self.page,
            limit,
            search: Some(search.to_string()).filter(|s| !s.is_empty()),
            filters: self.filters.clone(),
        }
    }

    pub fn has_active_filters(&self) -> bool {
        !self.search.is_empty() || !self.filters.is_default()
    }
}

/// What the list endpoint is asked for. Equality is the memoisation key:
/// the fetch hook re-requests only when this value changes.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams<F> {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub filters: F,
}

impl<F: ListFilters> QueryParams<F> {
    pub fn first_page(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            search: None,
            filters: F::default(),
        }
    }

    /// `page` and `limit` are always present; everything else only when set.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            (PAGE_KEY, self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push((SEARCH_KEY, search.clone()));
        }
        pairs.extend(self.filters.write());
        pairs
    }

    pub fn to_query_string(&self) -> String {
        encode_pairs(&self.to_pairs())
    }
}

impl<F: ListFilters> Serialize for QueryParams<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let filters = self.filters.write();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(PAGE_KEY, &self.page)?;
        map.serialize_entry("limit", &self.limit)?;
        if let Some(search) = &self.search {
            map.serialize_entry(SEARCH_KEY, search)?;
        }
        for (key, value) in &filters {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
