use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Target SQL dialect. Decides identifier quoting and type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    DuckDb,
    Postgres,
    Snowflake,
}

const COMMON_RESERVED: &[&str] = &[
    "all", "and", "any", "as", "asc", "between", "both", "case", "cast", "check", "column",
    "constraint", "create", "cross", "current_date", "current_time", "current_timestamp",
    "current_user", "default", "desc", "distinct", "else", "end", "except", "false", "fetch",
    "for", "foreign", "from", "full", "grant", "group", "having", "in", "inner", "intersect",
    "into", "is", "join", "lateral", "leading", "left", "like", "limit", "natural", "not",
    "null", "offset", "on", "or", "order", "outer", "primary", "references", "right", "select",
    "table", "then", "to", "trailing", "true", "union", "unique", "user", "using", "when",
    "where", "with",
];

const POSTGRES_RESERVED: &[&str] = &[
    "analyse", "analyze", "array", "asymmetric", "collate", "deferrable", "do", "initially",
    "localtime", "localtimestamp", "only", "placing", "returning", "session_user", "some",
    "symmetric", "variadic", "window",
];

const DUCKDB_RESERVED: &[&str] = &["pivot", "qualify", "unpivot", "window"];

const SNOWFLAKE_RESERVED: &[&str] = &[
    "account", "connection", "database", "gscluster", "ilike", "increment", "issue",
    "localtime", "localtimestamp", "minus", "organization", "qualify", "regexp", "revoke",
    "rlike", "row", "rows", "sample", "schema", "some", "start", "tablesample", "trigger",
    "try_cast", "values", "view",
];

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::DuckDb => "duckdb",
            Dialect::Postgres => "postgre",
            Dialect::Snowflake => "snowflake",
        }
    }

    fn is_reserved(&self, lowered: &str) -> bool {
        let extra = match self {
            Dialect::DuckDb => DUCKDB_RESERVED,
            Dialect::Postgres => POSTGRES_RESERVED,
            Dialect::Snowflake => SNOWFLAKE_RESERVED,
        };
        COMMON_RESERVED.contains(&lowered) || extra.contains(&lowered)
    }

    /// Quotes an identifier unless it is a plain lowercase, non-reserved name.
    pub fn quote_identifier(&self, name: &str) -> String {
        let plain = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$');
        if plain && !self.is_reserved(name) {
            name.to_string()
        } else {
            format!("\"{}\"", name.replace('"', "\"\""))
        }
    }

    /// Maps a flow data type to the dialect's type name. Unknown names pass through.
    pub fn type_name(&self, flow_type: &str) -> String {
        let mapped = match (flow_type.to_ascii_lowercase().as_str(), self) {
            ("string", _) => "VARCHAR",
            ("integer", _) => "INTEGER",
            ("real", Dialect::Snowflake) => "FLOAT",
            ("real", Dialect::Postgres) => "DOUBLE PRECISION",
            ("real", Dialect::DuckDb) => "DOUBLE",
            ("bool" | "boolean", _) => "BOOLEAN",
            ("date", _) => "DATE",
            ("datetime", Dialect::Snowflake) => "TIMESTAMP_NTZ",
            ("datetime", _) => "TIMESTAMP",
            _ => return flow_type.to_string(),
        };
        mapped.to_string()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Dialect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "duckdb" => Ok(Dialect::DuckDb),
            "postgre" | "postgres" => Ok(Dialect::Postgres),
            "snowflake" => Ok(Dialect::Snowflake),
            other => Err(ConfigError::InvalidDialect(other.to_string())),
        }
    }
}
