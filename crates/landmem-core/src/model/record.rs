//! Plot records: the unit of storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::metadata::{describe, PlotMetadata};
use crate::{Error, Result};

/// Opaque, immutable record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| Error::invalid_data(format!("invalid record id '{s}': {e}")))
    }
}

/// A stored plot: description text, structured metadata, and embedding.
///
/// The text is always generated from the metadata; a record is never edited
/// after construction. Deserialization goes through [`PlotRecord::with_id`],
/// so a stored `text` is ignored and regenerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlotRecord")]
pub struct PlotRecord {
    id: RecordId,
    text: String,
    metadata: PlotMetadata,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct RawPlotRecord {
    id: RecordId,
    metadata: PlotMetadata,
    embedding: Vec<f32>,
}

impl TryFrom<RawPlotRecord> for PlotRecord {
    type Error = Error;

    fn try_from(raw: RawPlotRecord) -> Result<Self> {
        Self::with_id(raw.id, raw.metadata, raw.embedding)
    }
}

impl PlotRecord {
    /// Create a record with a fresh identifier.
    ///
    /// `embedding` must be the embedder's vector for [`describe`]`(&metadata)`;
    /// see [`PlotRecord::description_for`].
    ///
    /// # Errors
    ///
    /// Returns a validation error when the metadata is invalid or the
    /// embedding is empty.
    pub fn new(metadata: PlotMetadata, embedding: Vec<f32>) -> Result<Self> {
        Self::with_id(RecordId::new(), metadata, embedding)
    }

    /// Create a record with a caller-chosen identifier.
    ///
    /// # Errors
    ///
    /// Same as [`PlotRecord::new`].
    pub fn with_id(id: RecordId, metadata: PlotMetadata, embedding: Vec<f32>) -> Result<Self> {
        metadata.validate()?;
        if embedding.is_empty() {
            return Err(Error::validation(format!(
                "plot '{}' has an empty embedding",
                metadata.name
            )));
        }
        Ok(Self {
            id,
            text: describe(&metadata),
            metadata,
            embedding,
        })
    }

    /// The text a record built from `metadata` will carry (and that must be
    /// embedded).
    pub fn description_for(metadata: &PlotMetadata) -> String {
        describe(metadata)
    }

    /// Identifier.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Generated description.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Structured metadata.
    pub fn metadata(&self) -> &PlotMetadata {
        &self.metadata
    }

    /// Embedding vector.
    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    /// Embedding dimension.
    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::enums::PlotSize;

    fn metadata() -> PlotMetadata {
        PlotMetadata::builder("Harbor Lot", 42)
            .neighborhood("Harbor")
            .plot_size(PlotSize::Small)
            .ocean_meters(120.0)
            .bay_meters(800.0)
            .floors(2, 6)
            .height(8.0, 24.0)
            .plot_area(900.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_record_new_generates_text() {
        let meta = metadata();
        let record = PlotRecord::new(meta.clone(), vec![0.1, 0.2]).unwrap();
        assert_eq!(record.text(), describe(&meta));
        assert_eq!(record.text(), PlotRecord::description_for(&meta));
        assert_eq!(record.metadata(), &meta);
        assert_eq!(record.dimension(), 2);
    }

    #[test]
    fn test_record_ids_are_unique() {
        let a = PlotRecord::new(metadata(), vec![1.0]).unwrap();
        let b = PlotRecord::new(metadata(), vec![1.0]).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_record_rejects_empty_embedding() {
        let err = PlotRecord::new(metadata(), vec![]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_record_rejects_invalid_metadata() {
        let mut meta = metadata();
        meta.building.floors.min = 10;
        assert!(PlotRecord::new(meta, vec![1.0]).unwrap_err().is_validation());
    }

    #[test]
    fn test_record_id_parse_and_display() {
        let id = RecordId::new();
        let parsed: RecordId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_record_serde_round_trip() {
        let record = PlotRecord::new(metadata(), vec![0.5, 0.25]).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        let back: PlotRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_record_deserialize_rejects_inverted_floors() {
        let record = PlotRecord::new(metadata(), vec![0.5]).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        let inverted = json.replace(
            r#""floors":{"min":2,"max":6}"#,
            r#""floors":{"min":6,"max":2}"#,
        );
        assert_ne!(inverted, json);
        assert!(serde_json::from_str::<PlotRecord>(&inverted).is_err());
    }

    #[test]
    fn test_record_deserialize_regenerates_text() {
        let record = PlotRecord::new(metadata(), vec![0.5]).unwrap();
        let mut json = serde_json::to_value(&record).unwrap();
        json["text"] = "stale description".into();
        let back: PlotRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.text(), describe(record.metadata()));
        assert_eq!(back, record);
    }

    #[test]
    fn test_record_deserialize_rejects_empty_embedding() {
        let record = PlotRecord::new(metadata(), vec![0.5]).unwrap();
        let mut json = serde_json::to_value(&record).unwrap();
        json["embedding"] = serde_json::json!([]);
        assert!(serde_json::from_value::<PlotRecord>(json).is_err());
    }
}
