///
/// Text rendering for the shell: result tables, update counts, column
/// descriptions, plus splitting a script into statements.
///

use std::fmt::Write;

use mdbe::{Cursor, ResultMetadata, UpdateCount};

const NULL_TEXT: &str = "NULL";

fn border(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for w in widths {
        line.push_str(&"-".repeat(w + 2));
        line.push('+');
    }
    line
}

fn row_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, w) in cells.iter().zip(widths) {
        let _ = write!(line, " {:<width$} |", cell, width = w);
    }
    line
}

/// Draws every remaining row of `cursor` as a boxed table.
pub fn table(cursor: &mut Cursor<'_>) -> mdbe::Result<String> {
    let meta = cursor.metadata()?;
    let headers = (1..=meta.column_count())
        .map(|i| meta.column_label(i).map(str::to_string))
        .collect::<mdbe::Result<Vec<_>>>()?;

    let mut rows = Vec::new();
    while cursor.next()? {
        let row = (1..=headers.len())
            .map(|i| Ok(cursor.get_string(i)?.unwrap_or_else(|| NULL_TEXT.to_string())))
            .collect::<mdbe::Result<Vec<_>>>()?;
        rows.push(row);
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let rule = border(&widths);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{}", row_line(&headers, &widths));
    let _ = writeln!(out, "{}", rule);
    for row in &rows {
        let _ = writeln!(out, "{}", row_line(row, &widths));
    }
    if !rows.is_empty() {
        let _ = writeln!(out, "{}", rule);
    }
    let _ = write!(
        out,
        "{} row{}",
        rows.len(),
        if rows.len() == 1 { "" } else { "s" }
    );
    Ok(out)
}

pub fn update(count: UpdateCount) -> String {
    match count {
        UpdateCount::Rows(1) => "1 row affected".to_string(),
        UpdateCount::Rows(n) => format!("{} rows affected", n),
        UpdateCount::Unknown => "ok".to_string(),
    }
}

/// One line per column: label, relational type, engine type, precision,
/// scale and host class.
pub fn describe(meta: &ResultMetadata) -> mdbe::Result<String> {
    let mut out = String::new();
    for i in 1..=meta.column_count() {
        let scale = meta.scale(i)?;
        let ty = if scale > 0 {
            format!("{}({},{})", meta.column_type_name(i)?, meta.precision(i)?, scale)
        } else {
            meta.column_type_name(i)?.to_string()
        };
        let _ = writeln!(
            out,
            "{}. {:<16} {:<16} {:<22} {}",
            i,
            meta.column_label(i)?,
            ty,
            meta.engine_type_name(i)?,
            meta.column_class_name(i)?
        );
    }
    Ok(out.trim_end().to_string())
}

/// Splits a script on `;`, ignoring semicolons inside quotes and `--`
/// comments. Empty statements are dropped.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = script.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '-' if chars.peek() == Some(&'-') => {
                    for skipped in chars.by_ref() {
                        if skipped == '\n' {
                            current.push('\n');
                            break;
                        }
                    }
                }
                ';' => statements.push(std::mem::take(&mut current)),
                _ => current.push(c),
            },
        }
    }
    statements.push(current);

    statements
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
