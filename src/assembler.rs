use crate::error::{CusteioError, Result};
use crate::fetcher::{ArchiveFetcher, ArchiveTransport, MonthlyExtract};
use crate::schema::{ExpenseRecord, OUTPUT_COLUMNS, SOURCE_COLUMNS};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use serde::Serialize;

/// A record together with its row identity in the assembled dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Row<'a> {
    pub id: usize,
    #[serde(flatten)]
    pub record: &'a ExpenseRecord,
}

/// Every record of one year, months stacked in order. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    year: i32,
    records: Vec<ExpenseRecord>,
}

impl Dataset {
    pub fn from_records(year: i32, records: Vec<ExpenseRecord>) -> Self {
        Self { year, records }
    }

    /// Parses every extract and concatenates them in the given order.
    /// Row order within a month is preserved; nothing is deduplicated.
    pub fn assemble(year: i32, extracts: &[MonthlyExtract]) -> Result<Self> {
        let mut records = Vec::new();
        for extract in extracts {
            let month_records = parse_month(extract)?;
            debug!(
                "Month {:02}: {} records from {}",
                extract.month,
                month_records.len(),
                extract.file_name
            );
            records.extend(month_records);
        }
        Ok(Self { year, records })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn rows(&self) -> Vec<Row<'_>> {
        self.records
            .iter()
            .enumerate()
            .map(|(id, record)| Row { id, record })
            .collect()
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &OUTPUT_COLUMNS
    }
}

/// Positions of the required source columns within a header row.
fn resolve_columns(headers: &StringRecord, month: u32) -> Result<[usize; 8]> {
    let mut indices = [0usize; 8];
    for (slot, column) in indices.iter_mut().zip(SOURCE_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim() == column)
            .ok_or_else(|| CusteioError::MissingColumn {
                month,
                column: column.to_string(),
            })?;
    }
    Ok(indices)
}

/// Parses one month's CSV into typed records, checking the header first.
pub fn parse_month(extract: &MonthlyExtract) -> Result<Vec<ExpenseRecord>> {
    let month = extract.month;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(extract.bytes.as_slice());

    let headers = reader
        .headers()
        .map_err(|source| CusteioError::Csv { month, source })?
        .clone();
    let idx = resolve_columns(&headers, month)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|source| CusteioError::Csv { month, source })?;
        let cell = |i: usize| row.get(idx[i]).unwrap_or("").trim().to_string();

        let raw_value = cell(7);
        let value = raw_value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CusteioError::InvalidValue {
                month,
                line: row.position().map(|p| p.line()).unwrap_or(0),
                value: raw_value.clone(),
            })?;

        records.push(ExpenseRecord {
            period: cell(0),
            parent_org_name: cell(1),
            parent_org_code: cell(2),
            org_name: cell(3),
            org_code: cell(4),
            expense_item: cell(5),
            expense_nature: cell(6),
            value,
        });
    }

    Ok(records)
}

/// Fetches and assembles one year of data.
pub async fn load_dataset<T: ArchiveTransport>(
    fetcher: &ArchiveFetcher<T>,
    year: i32,
) -> Result<Dataset> {
    let extracts = fetcher.fetch_year(year).await?;
    let dataset = Dataset::assemble(year, &extracts)?;
    info!(
        "Assembled dataset for {}: {} records from {} monthly files",
        year,
        dataset.len(),
        extracts.len()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,ano_mes_referencia,orgao_superior_nome,orgao_superior_sigla,orgao_nome,orgao_sigla,nome_item,nome_natureza_despesa_detalhada,valor,extra";

    fn extract(month: u32, rows: &[&str]) -> MonthlyExtract {
        let mut csv = String::from(HEADER);
        for row in rows {
            csv.push('\n');
            csv.push_str(row);
        }
        MonthlyExtract {
            month,
            file_name: format!("raiox-2021-{:02}.zip", month),
            bytes: csv.into_bytes(),
        }
    }

    #[test]
    fn test_parse_month_projects_and_renames() {
        let records = parse_month(&extract(
            1,
            &["9,202101,Ministério A,MA,Secretaria X,SX,Água,Serviços de água,-10.5,z"],
        ))
        .unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.period, "202101");
        assert_eq!(r.parent_org_name, "Ministério A");
        assert_eq!(r.parent_org_code, "MA");
        assert_eq!(r.org_name, "Secretaria X");
        assert_eq!(r.org_code, "SX");
        assert_eq!(r.expense_item, "Água");
        assert_eq!(r.expense_nature, "Serviços de água");
        assert_eq!(r.value, -10.5);
    }

    #[test]
    fn test_missing_column_names_month_and_column() {
        let bad = MonthlyExtract {
            month: 4,
            file_name: "raiox-2021-04.zip".to_string(),
            bytes: b"ano_mes_referencia,orgao_superior_nome,valor\n202104,A,1\n".to_vec(),
        };
        match parse_month(&bad).unwrap_err() {
            CusteioError::MissingColumn { month, column } => {
                assert_eq!(month, 4);
                assert_eq!(column, "orgao_superior_sigla");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_value_is_fatal() {
        let err = parse_month(&extract(
            2,
            &[
                "1,202102,A,A,B,B,I,N,5,",
                "2,202102,A,A,B,B,I,N,abc,",
            ],
        ))
        .unwrap_err();
        match err {
            CusteioError::InvalidValue { month, line, value } => {
                assert_eq!(month, 2);
                assert_eq!(line, 3);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_value_is_fatal() {
        for raw in ["NaN", "inf", "-infinity", "+inf"] {
            let row = format!("2,202103,A,A,B,B,I,N,{},", raw);
            let err = parse_month(&extract(3, &["1,202103,A,A,B,B,I,N,10,", &row])).unwrap_err();
            match err {
                CusteioError::InvalidValue { month, line, value } => {
                    assert_eq!(month, 3);
                    assert_eq!(line, 3);
                    assert_eq!(value, raw);
                }
                other => panic!("unexpected error for {}: {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_header_bom_is_ignored() {
        let csv = "\u{feff}ano_mes_referencia,orgao_superior_nome,orgao_superior_sigla,orgao_nome,orgao_sigla,nome_item,nome_natureza_despesa_detalhada,valor\n202101,A,A,B,B,I,N,1\n";
        let ex = MonthlyExtract {
            month: 1,
            file_name: "x".to_string(),
            bytes: csv.as_bytes().to_vec(),
        };
        assert_eq!(parse_month(&ex).unwrap().len(), 1);
    }

    #[test]
    fn test_assemble_keeps_month_and_row_order() {
        let extracts = vec![
            extract(1, &["1,202101,A,A,B,B,I,N,1,", "2,202101,A,A,B,B,I,N,2,"]),
            extract(2, &["1,202102,A,A,B,B,I,N,3,"]),
            extract(3, &[]),
            extract(4, &["1,202104,A,A,B,B,I,N,4,", "1,202104,A,A,B,B,I,N,4,"]),
        ];

        let dataset = Dataset::assemble(2021, &extracts).unwrap();
        let values: Vec<f64> = dataset.records().iter().map(|r| r.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 4.0]);

        let ids: Vec<usize> = dataset.rows().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);

        let again = Dataset::assemble(2021, &extracts).unwrap();
        assert_eq!(dataset, again);
        assert_eq!(dataset.columns(), &OUTPUT_COLUMNS);
    }

    #[test]
    fn test_row_serializes_flat() {
        let dataset = Dataset::assemble(2021, &[extract(1, &["1,202101,A,AS,B,BS,I,N,7,"])])
            .unwrap();
        let json = serde_json::to_value(dataset.rows()[0]).unwrap();
        assert_eq!(json["id"], 0);
        assert_eq!(json["orgao_sigla"], "BS");
        assert_eq!(json["valor"], 7.0);
    }
}
