use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

/// Arrow schema of the policy collection.
///
/// `roles` holds a JSON-encoded list of role labels; `vector` is the chunk
/// embedding at the configured dimensionality.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("policy_type", DataType::Utf8, false),
        Field::new("version", DataType::Utf8, false),
        Field::new("jurisdiction", DataType::Utf8, false),
        Field::new("section", DataType::Utf8, false),
        Field::new("roles", DataType::Utf8, false),
        Field::new(
            "ingested_at",
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        ),
        Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
            true,
        ),
    ]))
}
