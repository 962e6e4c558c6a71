//! Option coercion against an agent's declared schema.

use serde_json::Value;

use agent_gateway_core::{
    types::{AgentDescriptor, OptionDef, OptionKind, Options},
    Error, Result,
};

/// Resolve the options of a request against a descriptor.
///
/// Declared options are coerced to their kind, or take the declared default
/// when absent or null. Undeclared options are passed through unchanged.
pub fn resolve_options(descriptor: &AgentDescriptor, supplied: &Options) -> Result<Options> {
    let mut resolved = Options::new();

    for def in &descriptor.options {
        let value = match supplied.get(&def.name) {
            Some(value) if !value.is_null() => Some(coerce_value(def, value)?),
            _ => def
                .default
                .as_ref()
                .map(|default| coerce_value(def, default))
                .transpose()?,
        };
        if let Some(value) = value {
            resolved.insert(def.name.clone(), value);
        }
    }

    for (name, value) in supplied {
        if descriptor.option(name).is_none() {
            resolved.insert(name.clone(), value.clone());
        }
    }

    Ok(resolved)
}

/// Coerce a single value to the kind declared by `def`.
pub fn coerce_value(def: &OptionDef, value: &Value) -> Result<Value> {
    match def.kind {
        OptionKind::Number => coerce_number(def, value),
        OptionKind::Select => coerce_select(def, value),
        OptionKind::Text => coerce_text(def, value),
    }
}

fn coerce_number(def: &OptionDef, value: &Value) -> Result<Value> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed
        .map(Value::from)
        .ok_or_else(|| Error::invalid_option(&def.name, format!("expected an integer, got {}", value)))
}

fn coerce_select(def: &OptionDef, value: &Value) -> Result<Value> {
    let candidate = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => {
            return Err(Error::invalid_option(
                &def.name,
                format!("expected one of the allowed values, got {}", value),
            ))
        }
    };

    let allowed = def.allowed_values.as_deref().unwrap_or_default();
    if allowed.iter().any(|v| *v == candidate) {
        Ok(Value::String(candidate))
    } else {
        Err(Error::invalid_option(
            &def.name,
            format!("'{}' is not one of [{}]", candidate, allowed.join(", ")),
        ))
    }
}

fn coerce_text(def: &OptionDef, value: &Value) -> Result<Value> {
    match value {
        Value::String(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        _ => Err(Error::invalid_option(
            &def.name,
            format!("expected text, got {}", value),
        )),
    }
}
