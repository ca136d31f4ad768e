pub mod dataset;
pub mod filter;
pub mod fragment;
pub mod linkify;
pub mod viewport;

pub use dataset::{Category, Dataset, DatasetError, Place};
pub use filter::CategoryFilter;
pub use fragment::{clean, FragmentStore, Subscription};
pub use linkify::{linkify, Span};
pub use viewport::Viewport;
