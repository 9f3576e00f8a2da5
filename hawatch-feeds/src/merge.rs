//! Folding decoded records into a [`ClusterView`].
//!
//! Several load-balancer nodes of one cluster report the same
//! `(group, server)` rows. The merge engine reduces them to one
//! [`MergedRecord`] per key, field by field, following each field's
//! [`MergePolicy`]:
//!
//! | policy      | first observation | later observation                              |
//! |-------------|-------------------|------------------------------------------------|
//! | `Identity`  | stored            | ignored                                        |
//! | `Sum`       | stored            | added to the stored integer                    |
//! | `Counter`   | stored            | both integers: summed as text; else `a,b`      |
//! | `Reconcile` | stored            | equal: kept; both integers: summed; else `a,b` |
//!
//! Integer sums do not depend on the order feeds arrive in. The `a,b`
//! concatenation does: it records readings in arrival order.

use serde::{Deserialize, Serialize};
use tracing::trace;

use hawatch_types::{ClusterView, FieldValue, MergedRecord};

use crate::decode::RawRecord;
use crate::schema::{FieldDef, MergePolicy, Schema, SchemaMode};

/// When a stored field counts as a prior observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateDetection {
    /// Any stored value is a prior observation.
    Presence,
    /// Only a non-empty stored value is; an empty one is simply overwritten.
    NonEmpty,
}

impl DuplicateDetection {
    /// The predicate historically paired with a schema mode.
    pub fn for_mode(mode: SchemaMode) -> Self {
        match mode {
            SchemaMode::Strict => DuplicateDetection::Presence,
            SchemaMode::Tolerant => DuplicateDetection::NonEmpty,
        }
    }

    fn has_prior(self, stored: &FieldValue) -> bool {
        match self {
            DuplicateDetection::Presence => true,
            DuplicateDetection::NonEmpty => !stored.is_empty(),
        }
    }
}

/// Applies one schema's merge policies to a [`ClusterView`].
#[derive(Debug, Clone, Copy)]
pub struct Merger<'a> {
    schema: &'a Schema,
    detection: DuplicateDetection,
}

impl<'a> Merger<'a> {
    pub fn new(schema: &'a Schema, detection: DuplicateDetection) -> Self {
        Self { schema, detection }
    }

    /// Fold one record into the view under `cluster`.
    pub fn fold(&self, view: &mut ClusterView, cluster: &str, record: RawRecord) {
        let RawRecord {
            group,
            server,
            values,
        } = record;
        let servers = view.group_mut(cluster, &group);
        let fields = self.schema.fields().iter().zip(values);

        match servers.get_mut(&server) {
            Some(existing) => {
                trace!(cluster, %group, %server, "merging duplicate row");
                for (field, value) in fields {
                    self.merge_field(existing, field, value);
                }
            }
            None => {
                let merged: MergedRecord = fields
                    .map(|(field, value)| (field.name.to_string(), value))
                    .collect();
                servers.insert(server, merged);
            }
        }
    }

    fn merge_field(&self, existing: &mut MergedRecord, field: &FieldDef, raw: FieldValue) {
        if field.policy == MergePolicy::Identity {
            return;
        }
        match existing.get_mut(&field.name) {
            Some(stored) if self.detection.has_prior(stored) => {
                merge_value(field.policy, stored, raw);
            }
            _ => existing.insert(field.name.to_string(), raw),
        }
    }
}

/// Reconcile a stored value with a new observation of the same field.
pub fn merge_value(policy: MergePolicy, stored: &mut FieldValue, raw: FieldValue) {
    match (policy, &*stored, &raw) {
        (MergePolicy::Identity, _, _) => {}
        (MergePolicy::Sum, FieldValue::Int(a), FieldValue::Int(b)) => {
            *stored = FieldValue::Int(a.wrapping_add(*b));
        }
        (MergePolicy::Counter, _, _) => *stored = sum_or_join(stored, &raw),
        _ if *stored == raw => {}
        _ => *stored = sum_or_join(stored, &raw),
    }
}

fn sum_or_join(stored: &FieldValue, raw: &FieldValue) -> FieldValue {
    match (stored.as_int(), raw.as_int()) {
        (Some(a), Some(b)) => FieldValue::Text(a.wrapping_add(b).to_string()),
        _ => FieldValue::Text(format!("{},{}", stored, raw)),
    }
}
