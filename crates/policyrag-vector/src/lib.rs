//! Vector store for policy chunks: a LanceDB table with cosine similarity
//! search, metadata filtering, per-source listing and deletion.

pub mod schema;
pub mod store;
pub mod table;

pub use store::PolicyStore;
