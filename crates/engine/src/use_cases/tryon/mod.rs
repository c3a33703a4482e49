//! Interactive try-on use cases.
//!
//! One garment at a time: pick a tier, submit, keep up to three variants.

mod result_set;
mod retry_policy;
mod session;

pub use result_set::{PersistenceWarning, Removed, ResultSet, ResultSetError};
pub use retry_policy::{Attempt, PolicyError, RetryEscalationPolicy};
pub use session::{Generated, TryOnError, TryOnSession};
