use std::{io::Write, path::Path};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use color_eyre::{eyre::bail, Result};
use defaults::{try_remove_all, StoreHandle, StoredValue};
use defaults_storage::FileStore;

use crate::cli::ValueKind;

/// Print a single value, or every visible entry of the suite.
pub fn read(store: &StoreHandle, key: Option<&str>, out: &mut impl Write) -> Result<()> {
    match key {
        Some(key) => match store.object(key)? {
            Some(value) => writeln!(out, "{value}")?,
            None => bail!("key {key:?} does not exist in suite {:?}", store.suite()),
        },
        None => {
            let entries = store.dictionary_representation()?;
            if entries.is_empty() {
                writeln!(out, "Suite {:?} is empty.", store.suite())?;
                return Ok(());
            }
            for (key, value) in entries {
                writeln!(out, "{key} ({}) = {value}", value.kind())?;
            }
        }
    }
    Ok(())
}

pub fn write(store: &StoreHandle, key: &str, value: StoredValue) -> Result<()> {
    store.set_object(key, value)?;
    Ok(())
}

/// Remove one key, or everything explicitly stored in the suite.
pub fn delete(store: &StoreHandle, key: Option<&str>) -> Result<()> {
    match key {
        Some(key) => store.remove_object(key)?,
        None => try_remove_all(store)?,
    }
    Ok(())
}

pub fn domains(root: &Path, out: &mut impl Write) -> Result<()> {
    let suites = FileStore::list_suites(root)?;
    if suites.is_empty() {
        writeln!(out, "No suites in {}.", root.display())?;
        return Ok(());
    }
    for suite in suites {
        writeln!(out, "{suite}")?;
    }
    Ok(())
}

/// Interpret a command-line argument as a stored value of the given kind.
pub fn parse_value(kind: ValueKind, raw: &str) -> Result<StoredValue> {
    let value = match kind {
        ValueKind::String => StoredValue::String(raw.to_string()),
        ValueKind::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => StoredValue::Bool(true),
            "false" | "no" | "0" => StoredValue::Bool(false),
            _ => bail!("expected a boolean, got {raw:?}"),
        },
        ValueKind::Int => StoredValue::Integer(raw.parse()?),
        ValueKind::Float => {
            let value: f64 = raw.parse()?;
            if !value.is_finite() {
                bail!("expected a finite number, got {raw:?}");
            }
            StoredValue::Float(value)
        }
        ValueKind::Date => {
            StoredValue::Date(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
        }
        ValueKind::Data => StoredValue::Data(STANDARD.decode(raw)?),
    };
    Ok(value)
}
