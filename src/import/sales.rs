//! Sales report layout
//!
//! Sales reports list products as `123 - NAME` under group rows. The group
//! cell is only filled on the first product of each group.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::classify::{classify, normalize_group};
use crate::core::record::{derive_code, ParsedRow};
use crate::core::text::is_placeholder;

use super::{
    cell, clean_note, describe_columns, find_header, header_cells, is_skipped_name,
    parse_quantity, Grid, ImportError, ImportReport, Layout,
};

static CODE_AND_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\s*-\s*(.+)$").expect("valid regex"));

fn is_header(cells: &[String]) -> bool {
    let text = cells.join(" ");
    cells.iter().any(|c| c == "PRODUTO") && (text.contains("QTDD") || text.contains("VENDIDA"))
}

#[derive(Debug, Default)]
struct Columns {
    group: Option<usize>,
    product: Option<usize>,
    sold: Option<usize>,
    stock: Option<usize>,
    note: Option<usize>,
}

impl Columns {
    fn map(header: &[String]) -> Self {
        let mut cols = Columns::default();
        for (idx, name) in header.iter().enumerate() {
            if name.contains("GRUPO") && cols.group.is_none() {
                cols.group = Some(idx);
            } else if name == "PRODUTO" && cols.product.is_none() {
                cols.product = Some(idx);
            } else if name.contains("VENDIDA") && cols.sold.is_none() {
                cols.sold = Some(idx);
            } else if name.contains("ESTOQUE") && cols.stock.is_none() {
                cols.stock = Some(idx);
            } else if ["OBS", "NOTA", "ANOTA"].iter().any(|k| name.contains(k))
                && cols.note.is_none()
            {
                cols.note = Some(idx);
            }
        }
        if cols.note.is_none() {
            cols.note = header.iter().position(|name| name.contains("CUSTO"));
        }
        cols
    }
}

/// Split `123 - NAME` into code and name, deriving a code otherwise
fn split_product(raw: &str) -> (String, String) {
    match CODE_AND_NAME.captures(raw) {
        Some(caps) => (caps[1].trim().to_string(), caps[2].trim().to_string()),
        None => (derive_code(raw), raw.to_string()),
    }
}

pub(super) fn parse(grid: &Grid) -> Result<ImportReport, ImportError> {
    let layout = Layout::Sales;
    let header_idx = find_header(grid, is_header).ok_or(ImportError::HeaderNotFound { layout })?;
    let columns = Columns::map(&header_cells(&grid[header_idx]));

    if columns.product.is_none() || (columns.stock.is_none() && columns.sold.is_none()) {
        return Err(ImportError::MissingColumn {
            layout,
            missing: if columns.product.is_none() {
                "product"
            } else {
                "quantity"
            },
            found: describe_columns(&grid[header_idx]),
        });
    }

    let mut rows = Vec::new();
    let mut skipped = 0;
    let mut current_group: Option<String> = None;

    for (offset, row) in grid[header_idx + 1..].iter().enumerate() {
        let line = header_idx + offset + 2;

        let group = cell(row, columns.group);
        if !is_placeholder(group) {
            current_group = Some(group.to_string());
        }

        let raw_product = cell(row, columns.product);
        if is_skipped_name(raw_product) {
            skipped += 1;
            continue;
        }
        let (code, name) = split_product(raw_product);

        let stock = parse_quantity(cell(row, columns.stock)).unwrap_or(0);
        let sold = parse_quantity(cell(row, columns.sold)).unwrap_or(0);
        let system_quantity = if stock <= 0 && sold > 0 { sold } else { stock };
        if system_quantity <= 0 {
            log::debug!("row {}: skipping '{}', no positive quantity", line, name);
            skipped += 1;
            continue;
        }

        let category = current_group
            .as_deref()
            .and_then(normalize_group)
            .unwrap_or_else(|| classify(&name));
        let note = clean_note(cell(row, columns.note));

        rows.push(
            ParsedRow::from_note(code, name, category, system_quantity, note)
                .with_quantity_sold(sold),
        );
    }

    if rows.is_empty() {
        return Err(ImportError::NoRows { layout });
    }
    Ok(ImportReport {
        layout,
        rows,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::annotation::Status;
    use crate::core::classify::Category;
    use crate::import::grid;

    fn sales_grid() -> Grid {
        grid(&[
            &["RELATORIO DE VENDAS POR GRUPO", "", "", "", ""],
            &["GRUPO DE PRODUTO", "PRODUTO", "QTDD - VENDIDA", "QTDD ESTOQUE", "OBS"],
            &["LUBRIFICANTES", "501 - OLEO MOTOR 15W40", "3", "9", ""],
            &["", "502 - GRAXA AZUL 1KG", "1", "0", "falta 1"],
            &["EPI", "LUVA NITRILICA", "4", "20", "120,00"],
            &["OUTROS", "777 - HERBICIDA ZAP", "2", "5", "avariado"],
            &["", "ROLLUP", "10", "34", ""],
            &["", "778 - SEM ESTOQUE", "0", "0", ""],
        ])
    }

    #[test]
    fn test_group_carries_forward() {
        let report = parse(&sales_grid()).unwrap();
        assert_eq!(report.layout, Layout::Sales);
        assert_eq!(report.rows.len(), 4);
        assert_eq!(report.skipped, 2);

        assert_eq!(report.rows[0].category, Category::Lubricants);
        assert_eq!(report.rows[1].category, Category::Lubricants);
        assert_eq!(report.rows[2].category, Category::SafetyEquipment);
    }

    #[test]
    fn test_unknown_group_falls_back_to_name() {
        let report = parse(&sales_grid()).unwrap();
        assert_eq!(report.rows[3].category, Category::Herbicides);
        assert_eq!(report.rows[3].status, Status::Damaged);
    }

    #[test]
    fn test_code_and_name_split() {
        let report = parse(&sales_grid()).unwrap();
        assert_eq!(report.rows[0].code, "501");
        assert_eq!(report.rows[0].product_name, "OLEO MOTOR 15W40");
        assert_eq!(report.rows[2].code, "AUTO_LUVANITRILICA");
        assert_eq!(report.rows[2].product_name, "LUVA NITRILICA");
    }

    #[test]
    fn test_quantities() {
        let report = parse(&sales_grid()).unwrap();
        let oil = &report.rows[0];
        assert_eq!(oil.system_quantity, 9);
        assert_eq!(oil.quantity_sold, Some(3));

        // no stock left, falls back to the sold quantity
        let grease = &report.rows[1];
        assert_eq!(grease.system_quantity, 1);
        assert_eq!(grease.physical_quantity, 0);
        assert_eq!(grease.status, Status::Short);

        // cost values in the note column are dropped
        assert_eq!(report.rows[2].note, "");
        assert_eq!(report.rows[2].status, Status::Ok);
    }

    #[test]
    fn test_header_requires_product_column() {
        let g = grid(&[&["GRUPO DE PRODUTO", "ITEM", "QTDD - VENDIDA"], &["EPI", "LUVA", "1"]]);
        assert!(matches!(
            parse(&g).unwrap_err(),
            ImportError::HeaderNotFound { .. }
        ));
    }

    #[test]
    fn test_cost_column_used_when_no_note_column() {
        let g = grid(&[
            &["PRODUTO", "QTDD ESTOQUE", "CUSTO MEDIO"],
            &["10 - ESPALHANTE ADESIVO", "8", "sobra 1"],
        ]);
        let report = parse(&g).unwrap();
        assert_eq!(report.rows[0].category, Category::Adjuvants);
        assert_eq!(report.rows[0].physical_quantity, 9);
        assert_eq!(report.rows[0].quantity_sold, Some(0));
    }
}
