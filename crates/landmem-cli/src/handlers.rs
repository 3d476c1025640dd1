//! Handlers for the plot commands.
//!
//! Each handler returns the text to print so it can be tested without
//! capturing stdout.

use std::path::Path;

use landmem_core::{Error, RecordId, Result, SearchFilter};
use landmem_search::LandMemorySystem;
use serde::Serialize;

use crate::cli::SearchArgs;
use crate::output;

/// `landmem ingest <csv>`
pub async fn handle_ingest(system: &LandMemorySystem, path: &Path) -> Result<String> {
    let report = system.ingest_csv_path(path).await?;
    system.flush().await?;
    Ok(output::render_ingest(&report))
}

/// `landmem search <query> ...`
pub async fn handle_search(system: &LandMemorySystem, args: &SearchArgs) -> Result<String> {
    let base = match &args.filter_json {
        Some(path) => read_filter(path)?,
        None => SearchFilter::new(),
    };
    let filter = args.filter.apply(base);
    log::debug!("search filter: {}", serde_json::to_string(&filter)?);

    let mut system = system.clone();
    if let Some(ordering) = &args.ordering {
        system = system.with_ordering(ordering.parse()?);
    }
    let threshold = args.threshold.unwrap_or(system.hybrid().threshold());

    let results = system
        .search_properties_with_threshold(&args.query, Some(&filter), threshold, args.limit)
        .await?;
    if args.json {
        to_json(&results)
    } else {
        Ok(output::render_scored(&results))
    }
}

/// `landmem rarity <min> <max>`
pub async fn handle_rarity(
    system: &LandMemorySystem,
    min: u32,
    max: u32,
    limit: Option<usize>,
    json: bool,
) -> Result<String> {
    let records = system.get_properties_by_rarity(min, max, limit).await?;
    if json {
        to_json(&records)
    } else {
        Ok(output::render_plots(&records))
    }
}

/// `landmem show <id>`
pub async fn handle_show(system: &LandMemorySystem, id: &str, json: bool) -> Result<String> {
    let record = system.get_plot(&id.parse::<RecordId>()?).await?;
    if json {
        to_json(&record)
    } else {
        Ok(output::render_plot(&record))
    }
}

/// `landmem stats`
pub async fn handle_stats(system: &LandMemorySystem, json: bool) -> Result<String> {
    let stats = system.stats().await?;
    if json {
        to_json(&stats)
    } else {
        Ok(output::render_stats(&stats))
    }
}

fn read_filter(path: &Path) -> Result<SearchFilter> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    serde_json::from_str(&content).map_err(|e| {
        Error::invalid_data(format!("invalid search filter in {}: {e}", path.display()))
    })
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::FilterArgs;
    use landmem_core::PlotRecord;
    use landmem_vector::{MemoryPlotStore, MockEmbeddingProvider, ScoredRecord};
    use std::sync::Arc;

    const CSV: &str = "Rank,Name,Neighborhood,Zoning Type,Plot Size,Building Size,\
Distance to Ocean,Distance to Ocean (m),Distance to Bay,Distance to Bay (m),\
Min # of Floors,Max # of Floors,Min Building Height (m),Max Building Height (m),Plot Area (m²)
50,Shore Giant,North Shore,Commercial,Large,Highrise,Close,120,Far,900,10,40,35,140,4000
300,Shore Cottage,North Shore,Residential,Small,Lowrise,Close,200,Far,1500,1,3,3,10,600
600,Bay Block,South Bay,Industrial,Large,Midrise,Far,1200,Close,80,4,10,12,40,3500
";

    async fn ingested() -> (tempfile::TempDir, LandMemorySystem) {
        let dir = tempfile::TempDir::new().unwrap();
        let csv = dir.path().join("plots.csv");
        std::fs::write(&csv, CSV).unwrap();

        let system = LandMemorySystem::new(
            Arc::new(MemoryPlotStore::open(dir.path().join("store"), 64).unwrap()),
            Arc::new(MockEmbeddingProvider::new(64)),
            "land_memories",
        )
        .unwrap()
        .with_threshold(0.0);
        let out = handle_ingest(&system, &csv).await.unwrap();
        assert!(out.starts_with("Created 3 plots, rejected 0 of 3 rows"));
        (dir, system)
    }

    fn search_args(query: &str, filter: FilterArgs) -> SearchArgs {
        SearchArgs {
            query: query.to_string(),
            filter,
            filter_json: None,
            threshold: None,
            limit: None,
            ordering: None,
            json: true,
        }
    }

    #[tokio::test]
    async fn test_ingest_persists_snapshot() {
        let (dir, _system) = ingested().await;
        let reopened = MemoryPlotStore::open(dir.path().join("store"), 64).unwrap();
        assert_eq!(
            landmem_vector::PlotStore::count(&reopened, "land_memories")
                .await
                .unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn test_search_with_filter_flags() {
        let (_dir, system) = ingested().await;
        let args = search_args(
            "large plot",
            FilterArgs {
                neighborhoods: vec!["North Shore".into()],
                plot_sizes: vec![landmem_core::PlotSize::Large],
                ..Default::default()
            },
        );

        let out = handle_search(&system, &args).await.unwrap();
        let hits: Vec<ScoredRecord> = serde_json::from_str(&out).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.metadata().name, "Shore Giant");
    }

    #[tokio::test]
    async fn test_search_with_filter_json() {
        let (dir, system) = ingested().await;
        let filter_path = dir.path().join("filter.json");
        std::fs::write(&filter_path, r#"{"rarity": {"rankRange": {"min": 100}}}"#).unwrap();

        let mut args = search_args("plot", FilterArgs::default());
        args.filter_json = Some(filter_path);
        let out = handle_search(&system, &args).await.unwrap();
        let hits: Vec<ScoredRecord> = serde_json::from_str(&out).unwrap();
        let mut names: Vec<_> = hits.iter().map(|h| h.record.metadata().name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["Bay Block", "Shore Cottage"]);
    }

    #[tokio::test]
    async fn test_search_with_bad_filter_json() {
        let (dir, system) = ingested().await;
        let filter_path = dir.path().join("filter.json");
        std::fs::write(&filter_path, "{not json").unwrap();

        let mut args = search_args("plot", FilterArgs::default());
        args.filter_json = Some(filter_path);
        assert!(handle_search(&system, &args).await.is_err());
    }

    #[tokio::test]
    async fn test_search_with_unknown_ordering() {
        let (_dir, system) = ingested().await;
        let mut args = search_args("plot", FilterArgs::default());
        args.ordering = Some("alphabetical".into());
        assert!(handle_search(&system, &args).await.is_err());
    }

    #[tokio::test]
    async fn test_rarity_and_show() {
        let (_dir, system) = ingested().await;
        let out = handle_rarity(&system, 100, 500, None, true).await.unwrap();
        let records: Vec<PlotRecord> = serde_json::from_str(&out).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metadata().name, "Shore Cottage");

        let id = records[0].id().to_string();
        let shown = handle_show(&system, &id, false).await.unwrap();
        assert!(shown.contains("Name: Shore Cottage"));
    }

    #[tokio::test]
    async fn test_show_rejects_bad_id() {
        let (_dir, system) = ingested().await;
        assert!(handle_show(&system, "not-a-uuid", false).await.is_err());
        let missing = RecordId::new().to_string();
        assert!(
            handle_show(&system, &missing, false)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_stats() {
        let (_dir, system) = ingested().await;
        let out = handle_stats(&system, false).await.unwrap();
        assert!(out.contains("Records: 3"));
        assert!(out.contains("Backend: memory"));
    }
}
