//! SQL identifier quoting helpers
//!
//! Raw table columns mirror the CSV header verbatim (`"SMOKING "`,
//! `"D.O.A"`, `"MRD No."`), so every identifier interpolated into generated
//! SQL goes through these functions.

/// Quote a single SQL identifier, doubling embedded double quotes.
///
/// # Examples
/// ```
/// use wf_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("D.O.A"), r#""D.O.A""#);
/// assert_eq!(quote_ident(r#"say "hi""#), r#""say ""hi""""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a possibly schema-qualified relation name component by component.
///
/// # Examples
/// ```
/// use wf_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("hdhi_raw"), r#""hdhi_raw""#);
/// assert_eq!(quote_qualified("analytics.hdhi_clean"), r#""analytics"."hdhi_clean""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Split `schema.table` on the last dot; unqualified names live in `main`.
pub fn split_qualified_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("main", name),
    }
}

/// Escape a value for use inside a single-quoted SQL string literal.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}
