//! The policy vector store: idempotent upserts, filtered cosine search,
//! per-source listing and deletion.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use arrow_array::{
    FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
    TimestampMillisecondArray,
};
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType, Table};

use policyrag_core::types::{DocumentSummary, SearchResult, SourceRef, VectorRecord};
use policyrag_core::{Error, Result};

use crate::schema::build_arrow_schema;
use crate::table::{ensure_collection, open_db};

/// Single-quote escaping for values interpolated into store predicates.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn str_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::store(format!("result batch missing column '{name}'")))
}

/// Durable similarity index over policy chunks.
///
/// Constructed once per process and shared by reference between the
/// ingestion and query pipelines. The storage engine serializes conflicting
/// writes to the same record id; a search racing a delete on the same source
/// may transiently observe mid-delete state, which is acceptable.
pub struct PolicyStore {
    db: Connection,
    table_name: String,
    dim: usize,
}

impl PolicyStore {
    /// Connect and bootstrap the backing collection (idempotent).
    pub async fn open(db_uri: &str, table_name: &str, dim: usize) -> Result<Self> {
        let db = open_db(db_uri).await?;
        ensure_collection(&db, table_name, build_arrow_schema(dim as i32)).await?;
        Ok(Self {
            db,
            table_name: table_name.to_string(),
            dim,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    async fn table(&self) -> Result<Table> {
        self.db
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(Error::store)
    }

    /// Upsert records, idempotent by id: matched rows are overwritten, new
    /// rows inserted. The merge is acknowledged before this returns, so
    /// callers never observe a partially applied batch of their own write.
    pub async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        for (i, r) in records.iter().enumerate() {
            if r.id.is_empty() {
                return Err(Error::validation(format!("record {i} has an empty id")));
            }
            if r.payload.source.is_empty() {
                return Err(Error::validation(format!("record {i} has an empty source")));
            }
            if r.vector.len() != self.dim {
                return Err(Error::validation(format!(
                    "record {i} has vector dim {} (expected {})",
                    r.vector.len(),
                    self.dim
                )));
            }
        }
        let batch = self.records_to_batch(records)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let t = self.table().await?;
        let mut mi = t.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        let _ = mi.execute(reader).await.map_err(Error::store)?;
        tracing::info!(records = records.len(), collection = %self.table_name, "upserted records");
        Ok(())
    }

    fn records_to_batch(&self, records: &[VectorRecord]) -> Result<RecordBatch> {
        let schema = build_arrow_schema(self.dim as i32);
        let mut ids = Vec::new();
        let mut sources = Vec::new();
        let mut texts = Vec::new();
        let mut policy_types = Vec::new();
        let mut versions = Vec::new();
        let mut jurisdictions = Vec::new();
        let mut sections = Vec::new();
        let mut roles = Vec::new();
        let mut ingested_at = Vec::new();
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
        let now = Utc::now().timestamp_millis();
        for r in records {
            ids.push(r.id.clone());
            sources.push(r.payload.source.clone());
            texts.push(r.payload.text.clone());
            policy_types.push(r.payload.policy_type.clone());
            versions.push(r.payload.version.clone());
            jurisdictions.push(r.payload.jurisdiction.clone());
            sections.push(r.payload.section.clone());
            roles.push(serde_json::to_string(&r.payload.roles).map_err(Error::store)?);
            ingested_at.push(now);
            vectors.push(Some(r.vector.iter().map(|&x| Some(x)).collect()));
        }
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(sources)),
                Arc::new(StringArray::from(texts)),
                Arc::new(StringArray::from(policy_types)),
                Arc::new(StringArray::from(versions)),
                Arc::new(StringArray::from(jurisdictions)),
                Arc::new(StringArray::from(sections)),
                Arc::new(StringArray::from(roles)),
                Arc::new(TimestampMillisecondArray::from(ingested_at)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<
                    arrow_array::types::Float32Type,
                    _,
                    _,
                >(vectors.into_iter(), self.dim as i32)),
            ],
        )
        .map_err(Error::store)
    }

    /// Cosine similarity search over the collection.
    ///
    /// `allowed_sources`: `None` searches everything; `Some(&[])` is a
    /// contract to return an empty result without touching the store; a
    /// non-empty list is applied server-side as a `source IN (...)` filter.
    /// Rows scoring below `min_score` or carrying an empty `text` payload
    /// are discarded post-ranking. No survivors is a valid empty outcome.
    pub async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        min_score: f32,
        allowed_sources: Option<&[String]>,
    ) -> Result<SearchResult> {
        if let Some(allowed) = allowed_sources {
            if allowed.is_empty() {
                return Ok(SearchResult::default());
            }
        }
        let t = self.table().await?;
        let mut query = t
            .vector_search(query_vector.to_vec())
            .map_err(Error::store)?
            .distance_type(DistanceType::Cosine)
            .limit(top_k);
        if let Some(allowed) = allowed_sources {
            let list = allowed
                .iter()
                .map(|s| quote(s))
                .collect::<Vec<_>>()
                .join(",");
            query = query.only_if(format!("source IN ({list})"));
        }
        let mut stream = query.execute().await.map_err(Error::store)?;

        let mut contexts = Vec::new();
        let mut sources: Vec<SourceRef> = Vec::new();
        let mut roles: BTreeSet<String> = BTreeSet::new();
        while let Some(batch) = stream.try_next().await.map_err(Error::store)? {
            let text_col = str_column(&batch, "text")?;
            let source_col = str_column(&batch, "source")?;
            let section_col = str_column(&batch, "section")?;
            let policy_col = str_column(&batch, "policy_type")?;
            let version_col = str_column(&batch, "version")?;
            let juris_col = str_column(&batch, "jurisdiction")?;
            let roles_col = str_column(&batch, "roles")?;
            let dist_col = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| Error::store("search result missing _distance column"))?;
            for i in 0..batch.num_rows() {
                let score = 1.0 - dist_col.value(i);
                if score < min_score {
                    continue;
                }
                let text = text_col.value(i);
                if text.is_empty() {
                    tracing::warn!(source = source_col.value(i), "discarding record with empty text");
                    continue;
                }
                contexts.push(text.to_string());
                sources.push(SourceRef {
                    document: source_col.value(i).to_string(),
                    section: section_col.value(i).to_string(),
                    policy_type: policy_col.value(i).to_string(),
                    version: version_col.value(i).to_string(),
                    jurisdiction: juris_col.value(i).to_string(),
                });
                let tags: Vec<String> =
                    serde_json::from_str(roles_col.value(i)).unwrap_or_default();
                roles.extend(tags);
            }
        }

        if contexts.is_empty() || sources.is_empty() {
            return Ok(SearchResult::default());
        }

        // Dedup citations, keeping first-occurrence (rank) order.
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for s in sources {
            if seen.insert(s.dedup_key()) {
                unique.push(s);
            }
        }
        Ok(SearchResult {
            contexts,
            sources: unique,
            roles: roles.into_iter().collect(),
        })
    }

    /// Aggregate per-source summaries. The scan streams engine-paged record
    /// batches with a metadata-only projection, so memory stays bounded by
    /// batch granularity and vectors are never materialized.
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let t = self.table().await?;
        let mut stream = t
            .query()
            .select(Select::columns(&[
                "source",
                "policy_type",
                "version",
                "jurisdiction",
            ]))
            .execute()
            .await
            .map_err(Error::store)?;
        let mut by_source: BTreeMap<String, DocumentSummary> = BTreeMap::new();
        while let Some(batch) = stream.try_next().await.map_err(Error::store)? {
            let source_col = str_column(&batch, "source")?;
            let policy_col = str_column(&batch, "policy_type")?;
            let version_col = str_column(&batch, "version")?;
            let juris_col = str_column(&batch, "jurisdiction")?;
            for i in 0..batch.num_rows() {
                let entry = by_source
                    .entry(source_col.value(i).to_string())
                    .or_insert_with(|| DocumentSummary {
                        source_id: source_col.value(i).to_string(),
                        policy_type: policy_col.value(i).to_string(),
                        version: version_col.value(i).to_string(),
                        jurisdiction: juris_col.value(i).to_string(),
                        chunk_count: 0,
                    });
                entry.chunk_count += 1;
            }
        }
        Ok(by_source.into_values().collect())
    }

    /// Remove every record for `source_id`, returning a best-effort count of
    /// rows that matched just before the delete (the count can race
    /// concurrent writers). Unknown sources delete nothing and return 0.
    pub async fn delete_document(&self, source_id: &str) -> Result<usize> {
        let t = self.table().await?;
        let filter = format!("source = {}", quote(source_id));
        let matched = t
            .count_rows(Some(filter.clone()))
            .await
            .map_err(Error::store)?;
        if matched == 0 {
            return Ok(0);
        }
        t.delete(&filter).await.map_err(Error::store)?;
        tracing::info!(source = source_id, records = matched, "deleted document");
        Ok(matched)
    }
}
