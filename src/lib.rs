pub mod audit;
pub mod collection;
pub mod config;
pub mod output;
pub mod ranklist;
