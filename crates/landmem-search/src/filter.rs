//! Metadata Filter Engine.
//!
//! Translates a sparse [`SearchFilter`] into a typed store [`Predicate`]
//! and returns every record in the collection that satisfies it. Every
//! populated field becomes one conjunctive constraint; absent fields and
//! empty membership lists are unconstrained, so an empty filter matches the
//! whole collection.

use std::sync::Arc;

use landmem_core::model::{Bounds, Constraint, DistanceFilter, NumericField, TextField};
use landmem_core::{PlotRecord, Predicate, Result, SearchFilter};
use landmem_vector::PlotStore;

/// Translate a filter specification into a store predicate.
///
/// Does not validate; see [`SearchFilter::validate`].
pub fn translate(filter: &SearchFilter) -> Predicate {
    let mut predicate = Predicate::all();

    one_of(&mut predicate, TextField::Neighborhood, filter.neighborhoods.as_deref());
    one_of(&mut predicate, TextField::Zoning, filter.zoning_types.as_deref());
    one_of(&mut predicate, TextField::PlotSize, filter.plot_sizes.as_deref());
    one_of(
        &mut predicate,
        TextField::BuildingType,
        filter.building_types.as_deref(),
    );

    if let Some(distances) = &filter.distances {
        distance(
            &mut predicate,
            distances.ocean.as_ref(),
            NumericField::OceanMeters,
            TextField::OceanCategory,
        );
        distance(
            &mut predicate,
            distances.bay.as_ref(),
            NumericField::BayMeters,
            TextField::BayCategory,
        );
    }

    if let Some(building) = &filter.building {
        if let Some(floors) = &building.floors {
            envelope(
                &mut predicate,
                floors.min.map(f64::from),
                floors.max.map(f64::from),
                NumericField::FloorsMin,
                NumericField::FloorsMax,
            );
        }
        if let Some(height) = &building.height {
            envelope(
                &mut predicate,
                height.min,
                height.max,
                NumericField::HeightMin,
                NumericField::HeightMax,
            );
        }
    }

    if let Some(range) = filter.rarity.as_ref().and_then(|r| r.rank_range.as_ref()) {
        let bounds = Bounds {
            min: range.min.map(f64::from),
            max: range.max.map(f64::from),
        };
        inclusive(&mut predicate, NumericField::Rank, &bounds);
    }

    if let Some(area) = &filter.plot_area {
        inclusive(&mut predicate, NumericField::PlotArea, area);
    }

    predicate
}

fn one_of<T: ToString>(predicate: &mut Predicate, field: TextField, values: Option<&[T]>) {
    // An empty list constrains nothing.
    if let Some(values) = values.filter(|v| !v.is_empty()) {
        predicate.push(Constraint::OneOf {
            field,
            values: values.iter().map(ToString::to_string).collect(),
        });
    }
}

fn distance(
    predicate: &mut Predicate,
    filter: Option<&DistanceFilter>,
    meters: NumericField,
    category: TextField,
) {
    let Some(filter) = filter else { return };
    if let Some(bound) = filter.max_meters {
        predicate.push(Constraint::AtMost {
            field: meters,
            bound,
        });
    }
    if let Some(value) = filter.category {
        predicate.push(Constraint::Equals {
            field: category,
            value: value.to_string(),
        });
    }
}

/// `min` bounds the record's own minimum from below; `max` bounds the
/// record's own maximum from above.
fn envelope(
    predicate: &mut Predicate,
    min: Option<f64>,
    max: Option<f64>,
    min_field: NumericField,
    max_field: NumericField,
) {
    if let Some(bound) = min {
        predicate.push(Constraint::AtLeast {
            field: min_field,
            bound,
        });
    }
    if let Some(bound) = max {
        predicate.push(Constraint::AtMost {
            field: max_field,
            bound,
        });
    }
}

fn inclusive(predicate: &mut Predicate, field: NumericField, bounds: &Bounds<f64>) {
    if let Some(bound) = bounds.min {
        predicate.push(Constraint::AtLeast { field, bound });
    }
    if let Some(bound) = bounds.max {
        predicate.push(Constraint::AtMost { field, bound });
    }
}

/// Serialize a filter for error contexts and logs.
pub(crate) fn describe_filter(filter: &SearchFilter) -> String {
    serde_json::to_string(filter).unwrap_or_else(|_| format!("{filter:?}"))
}

/// Runs filter specifications against one collection of a store.
#[derive(Clone)]
pub struct MetadataFilterEngine {
    store: Arc<dyn PlotStore>,
    collection: String,
}

impl MetadataFilterEngine {
    /// Create an engine over `collection` of `store`.
    pub fn new(store: Arc<dyn PlotStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// The collection this engine reads.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Every record satisfying `filter`, in store order.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an inconsistent filter (before any
    /// store call), or a query failure carrying the serialized filter when
    /// the store rejects the predicate.
    pub async fn filter_records(&self, filter: &SearchFilter) -> Result<Vec<PlotRecord>> {
        self.filter_records_limited(filter, None).await
    }

    /// [`filter_records`](Self::filter_records) truncated to `limit`.
    pub async fn filter_records_limited(
        &self,
        filter: &SearchFilter,
        limit: Option<usize>,
    ) -> Result<Vec<PlotRecord>> {
        filter.validate()?;
        let predicate = translate(filter);
        log::debug!("filter_records on {}: {}", self.collection, predicate);

        self.store
            .query_by_predicate(&self.collection, &predicate, limit)
            .await
            .map_err(|e| {
                let context = describe_filter(filter);
                log::error!("filter_records failed for {context}: {e}");
                e.into_query_failure("filter_records", context)
            })
    }
}

impl std::fmt::Debug for MetadataFilterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataFilterEngine")
            .field("store", &self.store.name())
            .field("collection", &self.collection)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
