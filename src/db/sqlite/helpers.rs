//! Shared helper functions for SQLite repositories.

use crate::db::{PageSort, SortOrder};

/// Validate and map a sort field to the actual column name.
/// Returns None for invalid fields (falls back to default).
pub fn validate_sort_field(field: &str, allowed: &[&str]) -> Option<&'static str> {
    if !allowed.contains(&field) {
        return None;
    }
    // Return static str so user input never reaches the SQL text
    match field {
        "id" => Some("id"),
        "name" => Some("name"),
        "status" => Some("status"),
        "priority" => Some("priority"),
        "due_date" => Some("due_date"),
        "username" => Some("username"),
        _ => None,
    }
}

/// Build ORDER BY clause from PageSort parameters.
///
/// `id` is always appended as a tie-breaker so pages are stable.
pub fn build_order_clause(page: &PageSort, allowed_fields: &[&str], default_field: &str) -> String {
    let sort_field = page
        .sort_by
        .as_deref()
        .and_then(|f| validate_sort_field(f, allowed_fields))
        .unwrap_or(default_field);

    let order = match page.sort_order.unwrap_or(SortOrder::Asc) {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };

    if sort_field == "id" {
        format!("ORDER BY id {}", order)
    } else {
        format!("ORDER BY {} {}, id ASC", sort_field, order)
    }
}

/// Build LIMIT/OFFSET clause from PageSort parameters.
/// Note: SQL requires LIMIT when using OFFSET. If offset is provided without limit,
/// we use LIMIT -1 (SQLite's "no limit" value).
pub fn build_limit_offset_clause(page: &PageSort) -> String {
    let mut clause = String::new();

    let offset = page.offset.filter(|o| *o > 0);

    if let Some(limit) = page.limit {
        clause.push_str(&format!(" LIMIT {}", limit));
    } else if offset.is_some() {
        clause.push_str(" LIMIT -1");
    }

    if let Some(offset) = offset {
        clause.push_str(&format!(" OFFSET {}", offset));
    }

    clause
}

/// `?, ?, ?` with one placeholder per element.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
