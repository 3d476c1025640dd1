//! Human-readable rendering of plots and search results.

use std::fmt::Write;

use landmem_core::PlotRecord;
use landmem_search::IngestReport;
use landmem_vector::{CollectionStats, ScoredRecord};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Render one plot as a text card.
pub fn render_plot(record: &PlotRecord) -> String {
    let m = record.metadata();
    let b = &m.building;
    let d = &m.distances;
    format!(
        "Land Plot Memory
{RULE}
ID: {id}
Name: {name}
Rank: {rank} ({rarity})
Location: {neighborhood}

Properties:
• Plot Size: {size}
• Zoning: {zoning}
• Building Type: {building}
• Plot Area: {area}m²

Building Details:
• Floors: {fmin}-{fmax}
• Height: {hmin}-{hmax}m

Distances:
• Ocean: {om}m ({oc})
• Bay: {bm}m ({bc})

Description:
{text}
{RULE}",
        id = record.id(),
        name = m.name,
        rank = m.rank(),
        rarity = m.rarity.category(),
        neighborhood = m.neighborhood,
        size = m.plot_size,
        zoning = m.zoning,
        building = m.building_type,
        area = m.plot_area,
        fmin = b.floors.min,
        fmax = b.floors.max,
        hmin = b.height.min,
        hmax = b.height.max,
        om = d.ocean.meters(),
        oc = d.ocean.category(),
        bm = d.bay.meters(),
        bc = d.bay.category(),
        text = record.text(),
    )
}

/// Render search hits, best first as given, each with its score.
pub fn render_scored(results: &[ScoredRecord]) -> String {
    if results.is_empty() {
        return "No matching plots.".to_string();
    }
    let mut out = String::new();
    for (i, hit) in results.iter().enumerate() {
        let _ = writeln!(out, "#{} similarity {:.3}", i + 1, hit.score);
        let _ = writeln!(out, "{}", render_plot(&hit.record));
    }
    out
}

/// Render plain records.
pub fn render_plots(records: &[PlotRecord]) -> String {
    if records.is_empty() {
        return "No matching plots.".to_string();
    }
    records
        .iter()
        .map(render_plot)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_stats(stats: &CollectionStats) -> String {
    format!(
        "Collection: {}\nRecords: {}\nDimension: {}\nBackend: {}",
        stats.collection, stats.count, stats.dimension, stats.backend
    )
}

pub fn render_ingest(report: &IngestReport) -> String {
    let mut out = format!(
        "Created {} plots, rejected {} of {} rows",
        report.created.len(),
        report.rejected.len(),
        report.total()
    );
    for rejected in &report.rejected {
        let _ = write!(out, "\n  line {}: {}", rejected.line, rejected.reason);
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
