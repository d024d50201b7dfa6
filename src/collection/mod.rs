//! Enumerating, reading and writing the ranklists of a collection directory.

pub mod exclude;
pub mod store;
pub mod tree;

pub use exclude::ExclusionSet;
pub use store::{load_ranklist, save_ranklist, RanklistFile};
pub use tree::{enumerate_collection, RanklistEntry};
