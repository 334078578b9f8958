//! Value types shared by the trust engine and its consumers.

pub mod problem;
pub mod trust;
pub mod verdict;

pub use problem::{Problem, ProblemKind};
pub use trust::{TrustAction, TrustResult};
pub use verdict::Verdict;
