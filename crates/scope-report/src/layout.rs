//! Column alignment and line output shared by every report view.

use std::io::Write;

use scope_core::Result;
use unicode_width::UnicodeWidthStr;

/// A header line and data lines, already padded and tab-separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
    pub header: String,
    pub rows: Vec<String>,
}

/// Display width of each column: the widest of its header and its cells.
pub fn column_widths(headers: &[&str], cells: &[Vec<String>]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            cells
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.width())
                .chain(std::iter::once(header.width()))
                .max()
                .unwrap_or(0)
        })
        .collect()
}

/// Left-align every cell to its column width and join with tabs.
pub fn align(headers: &[&str], cells: Vec<Vec<String>>) -> RenderedTable {
    let widths = column_widths(headers, &cells);
    let header = join_padded(headers.iter().copied(), &widths);
    let rows = cells
        .iter()
        .map(|row| join_padded(row.iter().map(String::as_str), &widths))
        .collect();
    RenderedTable { header, rows }
}

/// Case-insensitive substring match; no pattern matches everything.
pub fn grep_matches(line: &str, pattern: Option<&str>) -> bool {
    match pattern {
        Some(p) => line.to_lowercase().contains(&p.to_lowercase()),
        None => true,
    }
}

/// Write the header and the rows that pass `grep`, one per line.
pub fn write_table<W: Write>(
    out: &mut W,
    table: &RenderedTable,
    grep: Option<&str>,
) -> Result<()> {
    writeln!(out, "{}", table.header)?;
    for row in table.rows.iter().filter(|r| grep_matches(r, grep)) {
        writeln!(out, "{row}")?;
    }
    out.flush()?;
    Ok(())
}

fn join_padded<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| pad(cell, width))
        .collect::<Vec<_>>()
        .join("\t")
}

fn pad(cell: &str, width: usize) -> String {
    let fill = width.saturating_sub(cell.width());
    let mut padded = String::with_capacity(cell.len() + fill);
    padded.push_str(cell);
    padded.extend(std::iter::repeat(' ').take(fill));
    padded
}
