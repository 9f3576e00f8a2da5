//! Field tables describing how feed columns are decoded and merged.
//!
//! Every column the pipeline keeps is described by a [`FieldDef`]: its name,
//! its declared type and the [`MergePolicy`] applied when two feeds report the
//! same server. The decoder and the merge engine both consult the same table,
//! so a record is always aligned with the schema that produced it.

use std::borrow::Cow;
use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DecodeError;

/// Column holding the group (proxy) name.
pub const GROUP_FIELD: &str = "pxname";

/// Column holding the server name.
pub const SERVER_FIELD: &str = "svname";

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int,
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" | "str" | "text" => Ok(FieldType::String),
            "int" | "integer" => Ok(FieldType::Int),
            other => Err(other.to_string()),
        }
    }
}

/// How duplicate observations of a field are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// First observation wins.
    Identity,
    /// Integers are added.
    Sum,
    /// Integer text is always added and re-encoded as text; anything else is joined with `,`.
    Counter,
    /// Equal text is kept, integer text is summed, anything else is joined with `,`.
    Reconcile,
}

/// One column of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: Cow<'static, str>,
    pub kind: FieldType,
    pub policy: MergePolicy,
}

impl FieldDef {
    const fn identity(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind: FieldType::String,
            policy: MergePolicy::Identity,
        }
    }

    const fn text(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind: FieldType::String,
            policy: MergePolicy::Reconcile,
        }
    }

    const fn int(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind: FieldType::Int,
            policy: MergePolicy::Sum,
        }
    }

    /// A numeric column whose values stay text but are summed.
    const fn counter(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind: FieldType::Int,
            policy: MergePolicy::Counter,
        }
    }
}

/// HAProxy 1.5/1.6 `;csv` column layout, including the empty column left by
/// the trailing comma on every line.
static HAPROXY_COLUMNS: &[FieldDef] = &[
    FieldDef::identity("pxname"),
    FieldDef::identity("svname"),
    FieldDef::text("qcur"),
    FieldDef::text("qmax"),
    FieldDef::int("scur"),
    FieldDef::int("smax"),
    FieldDef::text("slim"),
    FieldDef::int("stot"),
    FieldDef::int("bin"),
    FieldDef::int("bout"),
    FieldDef::text("dreq"),
    FieldDef::int("dresp"),
    FieldDef::text("ereq"),
    FieldDef::text("econ"),
    FieldDef::text("eresp"),
    FieldDef::text("wretr"),
    FieldDef::text("wredis"),
    FieldDef::text("status"),
    FieldDef::text("weight"),
    FieldDef::text("act"),
    FieldDef::text("bck"),
    FieldDef::text("chkfail"),
    FieldDef::text("chkdown"),
    // seconds since the last status change; summing it is meaningless
    FieldDef::identity("lastchg"),
    FieldDef::text("downtime"),
    FieldDef::text("qlimit"),
    FieldDef::int("pid"),
    FieldDef::int("iid"),
    FieldDef::int("sid"),
    FieldDef::text("throttle"),
    FieldDef::text("lbtot"),
    FieldDef::text("tracked"),
    FieldDef::int("type"),
    FieldDef::int("rate"),
    FieldDef::text("rate_lim"),
    FieldDef::int("rate_max"),
    FieldDef::text("check_status"),
    FieldDef::text("check_code"),
    FieldDef::text("check_duration"),
    FieldDef::int("hrsp_1xx"),
    FieldDef::int("hrsp_2xx"),
    FieldDef::int("hrsp_3xx"),
    FieldDef::int("hrsp_4xx"),
    FieldDef::int("hrsp_5xx"),
    FieldDef::int("hrsp_other"),
    FieldDef::text("hanafail"),
    FieldDef::text("req_rate"),
    FieldDef::text("req_rate_max"),
    FieldDef::text("req_tot"),
    FieldDef::text("cli_abrt"),
    FieldDef::text("srv_abrt"),
    FieldDef::text("comp_in"),
    FieldDef::text("comp_out"),
    FieldDef::text("comp_byp"),
    FieldDef::text("comp_rsp"),
    FieldDef::text("lastsess"),
    FieldDef::text("last_chk"),
    FieldDef::text("last_agt"),
    FieldDef::text("qtime"),
    FieldDef::text("ctime"),
    FieldDef::text("rtime"),
    FieldDef::text("ttime"),
    FieldDef::text("trailing"),
];

/// Columns extracted by name in header-driven mode.
static TOLERANT_FIELDS: &[FieldDef] = &[
    FieldDef::identity("pxname"),
    FieldDef::identity("svname"),
    FieldDef::counter("scur"),
    FieldDef::counter("rate"),
    FieldDef::text("status"),
    FieldDef::text("tracked"),
    FieldDef::identity("lastchg"),
];

/// Decoding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaMode {
    /// Headerless rows with a fixed column count and order.
    Strict,
    /// A header row names the columns; only known fields are extracted.
    #[default]
    Tolerant,
}

/// A column of a user-defined strict schema, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type", default = "default_column_type")]
    pub type_name: String,
    /// Exclude the column from merging; `pxname` and `svname` always are.
    #[serde(default)]
    pub identity: bool,
}

fn default_column_type() -> String {
    "string".to_string()
}

/// A decoding strategy together with its field table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    mode: SchemaMode,
    fields: Cow<'static, [FieldDef]>,
    group_index: usize,
    server_index: usize,
}

impl Schema {
    /// Strict decoding of the built-in HAProxy column layout.
    pub fn strict() -> Self {
        Self {
            mode: SchemaMode::Strict,
            fields: Cow::Borrowed(HAPROXY_COLUMNS),
            group_index: 0,
            server_index: 1,
        }
    }

    /// Header-driven decoding of the monitored field whitelist.
    pub fn tolerant() -> Self {
        Self {
            mode: SchemaMode::Tolerant,
            fields: Cow::Borrowed(TOLERANT_FIELDS),
            group_index: 0,
            server_index: 1,
        }
    }

    /// The built-in schema for a mode.
    pub fn for_mode(mode: SchemaMode) -> Self {
        match mode {
            SchemaMode::Strict => Self::strict(),
            SchemaMode::Tolerant => Self::tolerant(),
        }
    }

    /// Build a strict schema from configured columns.
    ///
    /// Type names are checked here so a bad schema is rejected before any
    /// feed is fetched.
    pub fn custom_strict(columns: &[ColumnSpec]) -> Result<Self, DecodeError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(columns.len());

        for column in columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DecodeError::DuplicateColumn(column.name.clone()));
            }
            let kind: FieldType =
                column
                    .type_name
                    .parse()
                    .map_err(|type_name| DecodeError::UnsupportedFieldType {
                        field: column.name.clone(),
                        type_name,
                    })?;
            let is_key = column.name == GROUP_FIELD || column.name == SERVER_FIELD;
            let policy = match kind {
                _ if column.identity || is_key => MergePolicy::Identity,
                FieldType::Int => MergePolicy::Sum,
                FieldType::String => MergePolicy::Reconcile,
            };
            fields.push(FieldDef {
                name: Cow::Owned(column.name.clone()),
                kind,
                policy,
            });
        }

        let position = |name: &str| {
            fields
                .iter()
                .position(|f| f.name == name)
                .ok_or_else(|| DecodeError::MissingColumn(name.to_string()))
        };
        let group_index = position(GROUP_FIELD)?;
        let server_index = position(SERVER_FIELD)?;

        Ok(Self {
            mode: SchemaMode::Strict,
            fields: Cow::Owned(fields),
            group_index,
            server_index,
        })
    }

    pub fn mode(&self) -> SchemaMode {
        self.mode
    }

    /// The field table records of this schema are aligned with.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Position of the group name in a record.
    pub fn group_index(&self) -> usize {
        self.group_index
    }

    /// Position of the server name in a record.
    pub fn server_index(&self) -> usize {
        self.server_index
    }

    /// Look up a field definition by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}
