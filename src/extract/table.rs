// src/extract/table.rs

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::resolver::{resolve, Resolution};
use crate::{
    dom::{ContentContext, ContentSource},
    schema::NormalizedRow,
};

/// Row selectors tried inside each table: body rows, then any row.
const ROW_SELECTORS: &[&str] = &["tbody tr", "tr"];

/// Trim every cell; `None` if the row has no cells or every cell is blank.
pub fn clean_row(cells: Vec<String>) -> Option<Vec<String>> {
    let row: Vec<String> = cells.iter().map(|c| c.trim().to_string()).collect();
    row.iter().any(|c| !c.is_empty()).then_some(row)
}

/// Read the composition table.
///
/// Tables are visited in document order and the first one that yields a
/// non-blank row is the answer; earlier empty tables are skipped, never
/// merged. An empty result is a valid "no data this run". Only failing to
/// enumerate the tables at all is an error.
pub async fn harvest_table(
    source: &dyn ContentSource,
    ctx: ContentContext,
) -> Result<Vec<NormalizedRow>> {
    let tables = source
        .count(ctx, "table")
        .await
        .context("counting tables")?;
    info!(tables, context = %ctx, "harvesting table");

    for table_index in 0..tables {
        let res = resolve(ROW_SELECTORS, |sel| async move {
            let rows = source.table_rows(ctx, table_index, sel).await?;
            Ok((!rows.is_empty()).then_some(rows))
        })
        .await;

        let (selector, rows) = match res {
            Resolution::Found {
                strategy, value, ..
            } => (*strategy, value),
            Resolution::NotFound => {
                debug!(table_index, "table has no rows");
                continue;
            }
        };

        let total = rows.len();
        let kept: Vec<Vec<String>> = rows.into_iter().filter_map(clean_row).collect();
        debug!(table_index, selector, total, kept = kept.len(), "rows read");
        if kept.is_empty() {
            continue;
        }

        info!(table_index, rows = kept.len(), "table harvested");
        return Ok(kept.into_iter().map(NormalizedRow::from_raw).collect());
    }

    info!("no table yielded data");
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dom::HtmlSnapshot, schema::COLUMN_COUNT};

    fn strs(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_clean_row() {
        assert_eq!(
            clean_row(strs(&[" PETR4 ", "", "\n"])),
            Some(strs(&["PETR4", "", ""]))
        );
        assert_eq!(clean_row(strs(&["  ", "\t"])), None);
        assert_eq!(clean_row(Vec::new()), None);
    }

    const ONE_TABLE: &str = r#"<body><table>
        <thead><tr><th>Setor</th><th>Código</th></tr></thead>
        <tbody>
            <tr><td>Financeiro</td><td>ITUB4</td><td>ITAUUNIBANCO</td><td>PN N1</td>
                <td>4.801.565.137</td><td>8,123</td><td>8,123</td></tr>
            <tr><td> </td><td></td><td></td></tr>
            <tr><td>Petróleo</td><td>PETR4</td><td>PETROBRAS</td><td>PN N2</td>
                <td>4.566.442.248</td><td>7,456</td><td>15,579</td></tr>
        </tbody>
    </table></body>"#;

    #[tokio::test]
    async fn test_blank_row_dropped_and_rows_normalized() {
        let snap = HtmlSnapshot::parse(ONE_TABLE);
        let rows = harvest_table(&snap, ContentContext::MainDocument)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.cells().len() == COLUMN_COUNT));
        assert_eq!(rows[1].cells()[1], "PETR4");
        assert_eq!(rows[1].cells()[6], "15,579");
    }

    #[tokio::test]
    async fn test_first_table_with_data_wins() {
        let snap = HtmlSnapshot::parse(
            r#"<body>
                <table><tr><td></td></tr></table>
                <table><tbody></tbody></table>
                <table><tr><td>A</td><td>B</td></tr></table>
                <table><tr><td>C</td></tr></table>
            </body>"#,
        );
        let rows = harvest_table(&snap, ContentContext::MainDocument)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells()[0], "A");
        assert_eq!(rows[0].cells()[1], "B");
        assert_eq!(rows[0].cells()[2], "");
    }

    #[tokio::test]
    async fn test_no_tables_is_empty_not_error() {
        let snap = HtmlSnapshot::parse("<body><p>Sem dados</p></body>");
        let rows = harvest_table(&snap, ContentContext::MainDocument)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_context_is_error() {
        let snap = HtmlSnapshot::parse(ONE_TABLE);
        assert!(harvest_table(&snap, ContentContext::Iframe(0)).await.is_err());
    }

    #[tokio::test]
    async fn test_harvest_is_repeatable() {
        let snap = HtmlSnapshot::parse(ONE_TABLE);
        let first = harvest_table(&snap, ContentContext::MainDocument)
            .await
            .unwrap();
        let second = harvest_table(&snap, ContentContext::MainDocument)
            .await
            .unwrap();
        assert_eq!(first, second);
    }
}
