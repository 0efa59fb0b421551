/// Which template marker replaces an upstream table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// `{{ ref('<table>') }}`
    Model,
    /// `{{ source('<source name>', '<table>') }}`
    Source(&'a str),
}

impl Reference<'_> {
    pub fn marker(&self, table: &str) -> String {
        match self {
            Reference::Model => format!("{{{{ ref('{}') }}}}", table),
            Reference::Source(source_name) => {
                format!("{{{{ source('{}', '{}') }}}}", source_name, table)
            }
        }
    }
}

/// Replaces every occurrence of the given table names in compiled SQL with
/// template markers.
///
/// A single left-to-right pass; at each position the longest matching name
/// wins, and inserted markers are never scanned again.
pub fn replace_table_names(sql: &str, tables: &[String], reference: Reference<'_>) -> String {
    let mut names: Vec<&str> = tables
        .iter()
        .map(String::as_str)
        .filter(|t| !t.is_empty())
        .collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    names.dedup();

    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;
    while let Some(c) = rest.chars().next() {
        match names.iter().find(|name| rest.starts_with(**name)) {
            Some(name) => {
                out.push_str(&reference.marker(name));
                rest = &rest[name.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}
