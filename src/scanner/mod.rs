//! Discovery of seeded media.
//!
//! This module provides:
//! - `Candidate` lists, either the fixed guess list or a real directory listing
//! - `ExistenceProbe` - async check that a candidate path is present
//! - `FsProbe` - probe against a local asset root

pub mod candidates;
pub mod probe;

pub use candidates::{directory_candidates, guess_candidates, Candidate};
pub use probe::{ExistenceProbe, FsProbe};
