pub mod documents;
pub mod fetch;
pub mod job_watch;
pub mod jobs;
pub mod mutation;

pub use documents::DocumentMutations;
pub use fetch::{fetch_cached, FetchState, ListFetcher};
pub use job_watch::{fetch_job_cached, JobPolling, JobState, JobWatcher};
pub use jobs::JobMutations;
pub use mutation::{Confirm, Mutation, MutationError, MutationOutcome, PreConfirmed};
