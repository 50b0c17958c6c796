//! URL-synchronised list query state.
pub mod debounce;
pub mod filter;
pub mod params;
pub mod state;

pub use debounce::Debouncer;
pub use filter::{DocumentFilters, Filter, JobFilters, ListFilters};
pub use params::{QueryPairs, QueryParams, QueryState, DEFAULT_PAGE_SIZE};
pub use state::{ListQuery, Location, MemoryLocation};
