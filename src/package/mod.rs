//! Package requests, installed-set queries and batched apt transactions.

pub mod batch;
pub mod catalog;
pub mod query;

pub use batch::{BatchInstaller, BatchReport};
pub use catalog::{Catalog, Category, RequestSet};
pub use query::PackageQuery;
