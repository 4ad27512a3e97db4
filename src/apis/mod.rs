pub mod catalog;

pub use catalog::SearchApiClient;
