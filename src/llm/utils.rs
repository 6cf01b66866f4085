use crate::assembler::Row;
use crate::schema::OUTPUT_COLUMNS;

/// Above this many rows only the head and tail are written.
pub const MAX_DUMP_ROWS: usize = 60;
const HEAD_TAIL_ROWS: usize = 5;

/// Renders rows as a fixed-width text table (index column plus every output
/// column), the way a dataframe prints. Long tables are truncated with `...`.
pub fn dump_rows(rows: &[Row<'_>]) -> String {
    if rows.is_empty() {
        return format!(
            "Empty DataFrame\nColumns: [{}]\nIndex: []",
            OUTPUT_COLUMNS.join(", ")
        );
    }

    let truncated = rows.len() > MAX_DUMP_ROWS;
    let mut lines: Vec<Vec<String>> = Vec::new();

    let mut header = vec![String::new()];
    header.extend(OUTPUT_COLUMNS.iter().map(|c| c.to_string()));
    lines.push(header);

    let to_line = |row: &Row<'_>| {
        let mut line = vec![row.id.to_string()];
        line.extend(row.record.cells());
        line
    };

    if truncated {
        lines.extend(rows[..HEAD_TAIL_ROWS].iter().map(to_line));
        lines.push(vec!["...".to_string(); OUTPUT_COLUMNS.len() + 1]);
        lines.extend(rows[rows.len() - HEAD_TAIL_ROWS..].iter().map(to_line));
    } else {
        lines.extend(rows.iter().map(to_line));
    }

    let mut widths = vec![0usize; OUTPUT_COLUMNS.len() + 1];
    for line in &lines {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = lines
        .iter()
        .map(|line| {
            let mut text = format!("{:<w$}", line[0], w = widths[0]);
            for (cell, width) in line.iter().zip(&widths).skip(1) {
                text.push_str(&format!("  {:>w$}", cell, w = *width));
            }
            text.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n");

    if truncated {
        out.push_str(&format!(
            "\n\n[{} rows x {} columns]",
            rows.len(),
            OUTPUT_COLUMNS.len()
        ));
    }

    out
}
