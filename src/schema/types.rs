// src/schema/types.rs

use serde::Serialize;
use tracing::warn;

/// Number of columns in the IBOV composition table.
pub const COLUMN_COUNT: usize = 7;

/// Header of the column appended at write time carrying the extracted date.
pub const DAY_COLUMN: &str = "Dia";

/// One column of the composition table, in page order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Column {
    Sector,
    Code,
    Asset,
    Type,
    TheoreticalQuantity,
    Participation,
    CumulativeParticipation,
}

impl Column {
    /// Every column in the order the portal renders them.
    pub const ALL: [Column; COLUMN_COUNT] = [
        Column::Sector,
        Column::Code,
        Column::Asset,
        Column::Type,
        Column::TheoreticalQuantity,
        Column::Participation,
        Column::CumulativeParticipation,
    ];

    /// Header text as printed by the portal; used as the output column name.
    pub fn header(self) -> &'static str {
        match self {
            Column::Sector => "Setor",
            Column::Code => "Código",
            Column::Asset => "Ação",
            Column::Type => "Tipo",
            Column::TheoreticalQuantity => "Qtde. Teórica",
            Column::Participation => "Part. (%)",
            Column::CumulativeParticipation => "Part. (%)Acum.",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Headers of the fixed column schema, in order.
pub fn column_headers() -> [&'static str; COLUMN_COUNT] {
    Column::ALL.map(Column::header)
}

/// A harvested row coerced to exactly [`COLUMN_COUNT`] cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRow([String; COLUMN_COUNT]);

impl NormalizedRow {
    /// Truncate or right-pad `raw` to the schema width.
    ///
    /// Extra trailing cells are dropped. If the page ever inserts a column
    /// in the middle of the table this silently shifts data, so truncation
    /// is logged with the original width.
    pub fn from_raw(raw: Vec<String>) -> Self {
        if raw.len() > COLUMN_COUNT {
            warn!(
                width = raw.len(),
                expected = COLUMN_COUNT,
                "row wider than column schema; dropping trailing cells"
            );
        }
        let mut cells = raw.into_iter();
        NormalizedRow(std::array::from_fn(|_| cells.next().unwrap_or_default()))
    }

    pub fn get(&self, column: Column) -> &str {
        &self.0[column.index()]
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }
}
