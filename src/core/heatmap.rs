//! Heat map model: records grouped into category blocks of status tiles

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::annotation::{damaged_units, Status};
use crate::core::classify::{short_display_name, Category};
use crate::core::record::StockRecord;

/// One product cell of the heat map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub code: String,
    pub label: String,
    pub info: String,
    pub status: Status,
    /// `false` for products that were never recounted
    pub counted: bool,
}

impl Tile {
    pub fn from_record(record: &StockRecord) -> Self {
        Self {
            code: record.code.clone(),
            label: short_display_name(&record.product_name).to_string(),
            info: tile_info(record),
            status: record.status,
            counted: record.is_counted(),
        }
    }
}

/// Tiles of one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBlock {
    pub category: Category,
    pub total_system_quantity: i64,
    pub tiles: Vec<Tile>,
}

/// Quantity text shown under the product label
///
/// Damaged products show the system quantity with the damaged-unit count from
/// the note; shortages and surpluses show the physical quantity with the
/// gap (`F` falta, `S` sobra).
pub fn tile_info(record: &StockRecord) -> String {
    if record.status == Status::Damaged {
        return match damaged_units(&record.note) {
            Some(n) => format!("{} · AV:{}", record.system_quantity, n),
            None => format!("{} · AVARIA", record.system_quantity),
        };
    }
    match record.difference {
        0 => record.system_quantity.to_string(),
        d if d < 0 => format!("{} (F {})", record.physical_quantity, d.unsigned_abs()),
        d => format!("{} (S {})", record.physical_quantity, d),
    }
}

/// Group records into blocks, heaviest category first, tiles by name
pub fn build(records: &[StockRecord]) -> Vec<CategoryBlock> {
    let mut grouped: BTreeMap<Category, Vec<&StockRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.category).or_default().push(record);
    }

    let mut blocks: Vec<CategoryBlock> = grouped
        .into_iter()
        .map(|(category, mut members)| {
            members.sort_by(|a, b| a.product_name.cmp(&b.product_name));
            CategoryBlock {
                category,
                total_system_quantity: members.iter().map(|r| r.system_quantity).sum(),
                tiles: members.into_iter().map(Tile::from_record).collect(),
            }
        })
        .collect();

    // stable sort keeps category order on ties
    blocks.sort_by(|a, b| b.total_system_quantity.cmp(&a.total_system_quantity));
    blocks
}

/// Counters shown above the heat map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub ok: usize,
    pub short: usize,
    pub over: usize,
    pub damaged: usize,
    pub uncounted: usize,
}

impl Summary {
    pub fn from_records(records: &[StockRecord]) -> Self {
        let mut summary = Summary {
            total: records.len(),
            ..Summary::default()
        };
        for record in records {
            match record.status {
                Status::Ok => summary.ok += 1,
                Status::Short => summary.short += 1,
                Status::Over => summary.over += 1,
                Status::Damaged => summary.damaged += 1,
            }
            if !record.is_counted() {
                summary.uncounted += 1;
            }
        }
        summary
    }
}
