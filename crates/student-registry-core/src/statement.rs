// crates/student-registry-core/src/statement.rs
// ============================================================================
// Module: Insert Statement Builder
// Description: Parameterized multi-row insert statements for record batches.
// Purpose: Keep placeholder numbering and argument order in lockstep.
// Dependencies: crate::record
// ============================================================================

//! ## Overview
//! [`build_insert_statement`] turns one batch of records into a single
//! multi-row `INSERT ... RETURNING id` statement. Placeholders are generated
//! positionally, three per record, starting after `start_offset`, and the
//! parameter list is appended in exactly the same order. Table and column
//! names are compile-time constants; record values only ever travel as
//! parameters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::record::NewStudent;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Table holding student records.
pub const STUDENTS_TABLE: &str = "students";
/// Columns written per record, in parameter order.
pub const STUDENT_COLUMNS: [&str; 3] = ["name", "age", "class"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Placeholder syntax understood by the target store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// `$1, $2, ...` (PostgreSQL style).
    #[default]
    Dollar,
    /// `?1, ?2, ...` (`SQLite` numbered style).
    Numbered,
}

impl PlaceholderStyle {
    /// Renders the placeholder for a 1-based parameter index.
    #[must_use]
    pub fn render(self, index: usize) -> String {
        match self {
            Self::Dollar => format!("${index}"),
            Self::Numbered => format!("?{index}"),
        }
    }
}

/// Bound statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    /// Text value.
    Text(String),
    /// Integer value.
    Integer(i64),
}

/// Multi-row insert statement with its positional parameters.
///
/// # Invariants
/// - `params.len() == rows * STUDENT_COLUMNS.len()`.
/// - The placeholder at parameter position `i` is numbered `start_offset + i + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    /// Statement text.
    pub text: String,
    /// Parameters in placeholder order.
    pub params: Vec<SqlParam>,
    /// Number of rows inserted by the statement.
    pub rows: usize,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds a multi-row insert for `batch`, numbering placeholders from
/// `start_offset + 1`.
///
/// An empty batch yields a statement with `rows == 0`; stores treat it as a
/// no-op rather than executing it.
#[must_use]
pub fn build_insert_statement(
    table: &str,
    batch: &[NewStudent],
    start_offset: usize,
    style: PlaceholderStyle,
) -> InsertStatement {
    let mut text = format!("INSERT INTO {table} ({}) VALUES ", STUDENT_COLUMNS.join(", "));
    let mut params = Vec::with_capacity(batch.len() * STUDENT_COLUMNS.len());
    let mut next_index = start_offset;
    for (position, student) in batch.iter().enumerate() {
        if position > 0 {
            text.push_str(", ");
        }
        let placeholders: Vec<String> = (0 .. STUDENT_COLUMNS.len())
            .map(|_| {
                next_index += 1;
                style.render(next_index)
            })
            .collect();
        text.push('(');
        text.push_str(&placeholders.join(", "));
        text.push(')');
        params.push(SqlParam::Text(student.name.clone()));
        params.push(SqlParam::Integer(student.age));
        params.push(SqlParam::Integer(student.class));
    }
    text.push_str(" RETURNING id");
    InsertStatement {
        text,
        params,
        rows: batch.len(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::PlaceholderStyle;
    use super::SqlParam;
    use super::build_insert_statement;
    use crate::record::NewStudent;

    #[test]
    fn two_rows_use_six_dollar_placeholders() {
        let batch = [NewStudent::new("A", 10, 1), NewStudent::new("B", 11, 2)];
        let statement = build_insert_statement("students", &batch, 0, PlaceholderStyle::Dollar);
        assert_eq!(
            statement.text,
            "INSERT INTO students (name, age, class) VALUES ($1, $2, $3), ($4, $5, $6) RETURNING id"
        );
        assert_eq!(statement.rows, 2);
        assert_eq!(
            statement.params,
            vec![
                SqlParam::Text("A".to_string()),
                SqlParam::Integer(10),
                SqlParam::Integer(1),
                SqlParam::Text("B".to_string()),
                SqlParam::Integer(11),
                SqlParam::Integer(2),
            ]
        );
    }

    #[test]
    fn start_offset_shifts_numbering() {
        let batch = [NewStudent::new("C", 12, 3)];
        let statement = build_insert_statement("students", &batch, 6, PlaceholderStyle::Numbered);
        assert_eq!(
            statement.text,
            "INSERT INTO students (name, age, class) VALUES (?7, ?8, ?9) RETURNING id"
        );
    }
}
