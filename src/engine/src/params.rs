//! Parameter and FOREACH materialiser: resolves `%scalar`,
//! `#set` and `@array` parameters against a store's lexicon and produces
//! the flat list of per-tuple bindings the groupby engine iterates over.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use trck_store::{EventStore, FieldId, ValueId, EMPTY_VALUE, MISSING_FIELD_ID, UNRESOLVED_VALUE};

use crate::error::EngineError;
use crate::matcher::{FreeVar, VarKind};

/// One resolved parameter value, ready to hand to the matcher.
#[derive(Clone, Debug)]
pub enum ParamValue {
    Scalar { value_id: ValueId, raw: String },
    Set { entries: Vec<(ValueId, String)> },
}

/// Bindings for every free variable, in the matcher's declared order.
pub type ParamBindings = Vec<(String, ParamValue)>;

pub struct ParamTuple {
    pub bindings: ParamBindings,
}

/// The `--params` file contents. `foreach` holds an explicit
/// tuple list when the caller wants one; when absent for a variable that
/// appears in `free_vars` but not in `scalars`/`sets`, the materialiser
/// derives an implicit one-variable FOREACH from that variable's full
/// store lexicon. Value id 0, the canonical empty string, is included at
/// index 0, matching the store's own lexicon ordering convention.
#[derive(Deserialize, Default)]
pub struct RawParams {
    #[serde(default)]
    pub scalars: HashMap<String, String>,
    #[serde(default)]
    pub sets: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub foreach: Option<Vec<HashMap<String, Value>>>,
    /// Overrides the matcher's compile-time `merge_results` constant when
    /// present; absent means "use whatever the matcher declares".
    #[serde(default)]
    pub merge_results: Option<bool>,
    #[serde(default)]
    pub threads: Option<usize>,
}

impl RawParams {
    pub fn from_json(s: &str) -> Result<Self, EngineError> {
        serde_json::from_str(s).map_err(EngineError::BadParamsJson)
    }
}

fn resolve_scalar_value(
    store: &impl EventStore,
    field_id: FieldId,
    value: &str,
) -> ParamValue {
    ParamValue::Scalar {
        value_id: store.resolve_scalar(field_id, value),
        raw: value.to_string(),
    }
}

/// Resolves each member against the store's lexicon, dropping any that
/// don't resolve (a soft miss): the set itself never fails, it just ends
/// up missing the member that wasn't found.
fn resolve_set_value(store: &impl EventStore, field_id: FieldId, values: &[String]) -> ParamValue {
    let entries = values
        .iter()
        .map(|v| (store.resolve_scalar(field_id, v), v.clone()))
        .filter(|(value_id, _)| *value_id != UNRESOLVED_VALUE)
        .collect();
    ParamValue::Set { entries }
}

fn json_to_strings(v: &Value) -> Vec<String> {
    match v {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|i| i.as_str().map(str::to_string))
            .collect(),
        other => vec![other.to_string()],
    }
}

/// Resolves `free_vars` declarations against `store`'s schema. A variable
/// whose declared field name doesn't exist in this store is a soft miss,
/// not a fatal error: it resolves to [`MISSING_FIELD_ID`], which
/// `resolve_scalar`/`resolve_set_value` then turn into `UNRESOLVED_VALUE`
/// (or a dropped set member) the same way an unknown lexicon value does.
fn field_for(store: &impl EventStore, var: &FreeVar) -> FieldId {
    store.field_id(&var.field).unwrap_or(MISSING_FIELD_ID)
}

/// Enforces the naming rule every free variable's declared name must
/// satisfy: `%` for a scalar, `#` for a set. A matcher that declares a
/// mismatched prefix (or none at all) is a configuration error, not
/// something the materialiser can paper over.
fn validate_var_name(var: &FreeVar) -> Result<(), EngineError> {
    let expected = match var.kind {
        VarKind::Scalar => '%',
        VarKind::Set => '#',
    };
    if var.name.starts_with(expected) {
        Ok(())
    } else {
        Err(EngineError::BadParamName(var.name.clone()))
    }
}

/// Builds the tuple list the groupby engine iterates over.
///
/// A variable bound in `params.scalars`/`params.sets` is fixed for every
/// tuple. A variable listed in `free_vars` but not given a fixed binding
/// is the groupby dimension: if `params.foreach` supplies explicit rows
/// for it, those are used (validated for arity); otherwise its values are
/// derived from the store's lexicon for that field, one tuple per value,
/// with the canonical empty value at index 0.
pub fn materialize_tuples(
    store: &impl EventStore,
    free_vars: &[FreeVar],
    params: &RawParams,
) -> Result<Vec<ParamTuple>, EngineError> {
    for var in free_vars {
        validate_var_name(var)?;
    }

    let fixed: Vec<&FreeVar> = free_vars
        .iter()
        .filter(|v| params.scalars.contains_key(&v.name) || params.sets.contains_key(&v.name))
        .collect();
    let groupby: Vec<&FreeVar> = free_vars
        .iter()
        .filter(|v| !params.scalars.contains_key(&v.name) && !params.sets.contains_key(&v.name))
        .collect();

    let mut fixed_bindings: ParamBindings = Vec::with_capacity(fixed.len());
    for var in &fixed {
        let field_id = field_for(store, var);
        let binding = match var.kind {
            VarKind::Scalar => {
                let raw = params.scalars.get(&var.name).ok_or_else(|| {
                    EngineError::UnboundParameter(var.name.clone())
                })?;
                resolve_scalar_value(store, field_id, raw)
            }
            VarKind::Set => {
                let raw = params.sets.get(&var.name).ok_or_else(|| {
                    EngineError::UnboundParameter(var.name.clone())
                })?;
                resolve_set_value(store, field_id, raw)
            }
        };
        fixed_bindings.push((var.name.clone(), binding));
    }

    if groupby.is_empty() {
        return Ok(vec![ParamTuple {
            bindings: fixed_bindings,
        }]);
    }

    if let Some(rows) = &params.foreach {
        let mut tuples = Vec::with_capacity(rows.len());
        for row in rows {
            if row.len() != groupby.len() {
                return Err(EngineError::BadTupleArity(
                    tuples.len(),
                    groupby.len(),
                    row.len(),
                ));
            }
            let mut bindings = fixed_bindings.clone();
            for var in &groupby {
                let field_id = field_for(store, var);
                let value = row.get(&var.name).ok_or_else(|| {
                    EngineError::UnboundParameter(var.name.clone())
                })?;
                let binding = match var.kind {
                    VarKind::Scalar => {
                        let raw = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
                        resolve_scalar_value(store, field_id, &raw)
                    }
                    VarKind::Set => resolve_set_value(store, field_id, &json_to_strings(value)),
                };
                bindings.push((var.name.clone(), binding));
            }
            tuples.push(ParamTuple { bindings });
        }
        return Ok(tuples);
    }

    // Implicit FOREACH: only supported for a single groupby variable,
    // derived from the field's full store lexicon plus the canonical
    // empty value.
    if groupby.len() != 1 {
        return Err(EngineError::UnboundParameter(
            groupby
                .iter()
                .map(|v| v.name.clone())
                .collect::<Vec<_>>()
                .join(", "),
        ));
    }
    let var = groupby[0];
    let field_id = field_for(store, var);
    let mut lexicon = store.lexicon(field_id);
    lexicon.sort_by_key(|(id, _)| *id);

    let mut tuples = Vec::with_capacity(lexicon.len() + 1);
    tuples.push(ParamTuple {
        bindings: {
            let mut b = fixed_bindings.clone();
            b.push((
                var.name.clone(),
                ParamValue::Scalar {
                    value_id: EMPTY_VALUE,
                    raw: String::new(),
                },
            ));
            b
        },
    });
    for (value_id, raw) in lexicon {
        let mut bindings = fixed_bindings.clone();
        bindings.push((var.name.clone(), ParamValue::Scalar { value_id, raw }));
        tuples.push(ParamTuple { bindings });
    }
    Ok(tuples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trck_store::mem::MemStoreBuilder;

    fn scalar_var(name: &str, field: &str) -> FreeVar {
        FreeVar {
            name: name.to_string(),
            field: field.to_string(),
            kind: VarKind::Scalar,
        }
    }

    #[test]
    fn fixed_scalar_produces_single_tuple() {
        let mut b = MemStoreBuilder::new();
        let f = b.field("action");
        let uuid = b.uuid(1);
        b.event(uuid, 1, &[(f, "click")]);
        let store = b.build();

        let vars = vec![scalar_var("%action", "action")];
        let mut params = RawParams::default();
        params.scalars.insert("%action".to_string(), "click".to_string());

        let tuples = materialize_tuples(&store, &vars, &params).unwrap();
        assert_eq!(tuples.len(), 1);
    }

    #[test]
    fn implicit_foreach_derives_one_tuple_per_lexicon_value_plus_empty() {
        let mut b = MemStoreBuilder::new();
        let f = b.field("action");
        let uuid = b.uuid(1);
        b.event(uuid, 1, &[(f, "click")]);
        b.event(uuid, 2, &[(f, "view")]);
        let store = b.build();

        let vars = vec![scalar_var("%action", "action")];
        let params = RawParams::default();

        let tuples = materialize_tuples(&store, &vars, &params).unwrap();
        assert_eq!(tuples.len(), 3);
        let first = &tuples[0].bindings[0].1;
        match first {
            ParamValue::Scalar { value_id, .. } => assert_eq!(*value_id, EMPTY_VALUE),
            _ => panic!("expected scalar"),
        }
    }

    #[test]
    fn scalar_var_without_percent_prefix_is_rejected() {
        let mut b = MemStoreBuilder::new();
        let f = b.field("action");
        let uuid = b.uuid(1);
        b.event(uuid, 1, &[(f, "click")]);
        let store = b.build();

        let vars = vec![scalar_var("action", "action")];
        let params = RawParams::default();
        assert!(matches!(
            materialize_tuples(&store, &vars, &params),
            Err(EngineError::BadParamName(_))
        ));
    }

    #[test]
    fn explicit_foreach_tuple_with_wrong_arity_is_rejected() {
        let mut b = MemStoreBuilder::new();
        let f = b.field("action");
        let uuid = b.uuid(1);
        b.event(uuid, 1, &[(f, "click")]);
        let store = b.build();

        let vars = vec![scalar_var("%action", "action"), scalar_var("%other", "action")];
        let mut params = RawParams::default();
        let mut row = HashMap::new();
        row.insert("%action".to_string(), Value::String("click".to_string()));
        params.foreach = Some(vec![row]);

        assert!(materialize_tuples(&store, &vars, &params).is_err());
    }

    #[test]
    fn scalar_bound_to_a_field_absent_from_the_store_is_a_soft_miss() {
        let mut b = MemStoreBuilder::new();
        let f = b.field("action");
        let uuid = b.uuid(1);
        b.event(uuid, 1, &[(f, "click")]);
        let store = b.build();

        let vars = vec![scalar_var("%nope", "does_not_exist")];
        let mut params = RawParams::default();
        params.scalars.insert("%nope".to_string(), "anything".to_string());

        let tuples = materialize_tuples(&store, &vars, &params).unwrap();
        assert_eq!(tuples.len(), 1);
        match &tuples[0].bindings[0].1 {
            ParamValue::Scalar { value_id, .. } => assert_eq!(*value_id, trck_store::UNRESOLVED_VALUE),
            _ => panic!("expected scalar"),
        }
    }

    #[test]
    fn set_members_that_do_not_resolve_are_dropped_not_fatal() {
        let mut b = MemStoreBuilder::new();
        let f = b.field("action");
        let uuid = b.uuid(1);
        b.event(uuid, 1, &[(f, "click")]);
        let store = b.build();

        let vars = vec![FreeVar {
            name: "#actions".to_string(),
            field: "action".to_string(),
            kind: VarKind::Set,
        }];
        let mut params = RawParams::default();
        params.sets.insert(
            "#actions".to_string(),
            vec!["click".to_string(), "never-seen".to_string()],
        );

        let tuples = materialize_tuples(&store, &vars, &params).unwrap();
        match &tuples[0].bindings[0].1 {
            ParamValue::Set { entries } => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].1, "click");
            }
            _ => panic!("expected set"),
        }
    }
}
