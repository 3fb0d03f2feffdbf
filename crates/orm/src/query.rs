use crate::DataType;

/// A generated statement: SQL text with positional `?` placeholders and the
/// parameters bound to them, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// SQL text.
    pub sql: String,

    /// Positional parameters.
    pub params: Vec<DataType>,
}

/// Comma separated placeholders, one per parameter.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}
