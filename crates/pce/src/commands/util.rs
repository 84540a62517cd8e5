//! Shared helpers for command handlers.

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use pce_api::{Href, ObjectKind};

use crate::error::CliError;

/// Parse an object kind name; `ip-lists` and `ip_lists` both work.
pub fn parse_kind(raw: &str) -> Result<ObjectKind, CliError> {
    ObjectKind::from_str(&raw.trim().replace('-', "_")).map_err(|_| CliError::Validation {
        field: "kind".into(),
        reason: format!("unknown object kind '{raw}' (see `pce kinds`)"),
    })
}

pub fn parse_href(raw: &str) -> Result<Href, CliError> {
    Ok(Href::parse(raw.trim())?)
}

/// The object kind an href addresses.
pub fn kind_of(href: &Href) -> Result<ObjectKind, CliError> {
    ObjectKind::from_href(href).ok_or_else(|| CliError::Validation {
        field: "href".into(),
        reason: format!("{href} does not address a known object kind"),
    })
}

/// Split a `key=value` query parameter.
pub fn parse_param(raw: &str) -> Result<(String, String), CliError> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .ok_or_else(|| CliError::Validation {
            field: "param".into(),
            reason: format!("expected KEY=VALUE, got '{raw}'"),
        })
}

/// Read and parse a JSON file; `-` reads stdin.
pub fn read_json_file(path: &Path) -> Result<serde_json::Value, CliError> {
    let contents = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Read a JSON file that must hold an array.
pub fn read_json_array(path: &Path) -> Result<Vec<serde_json::Value>, CliError> {
    match read_json_file(path)? {
        serde_json::Value::Array(items) => Ok(items),
        _ => Err(CliError::Validation {
            field: "file".into(),
            reason: "expected a JSON array".into(),
        }),
    }
}
