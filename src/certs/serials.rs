//! Serial-number marker files: `<alias>.serial-number` holding one decimal serial.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{read_value_file, write_value_file};
use crate::error::{Error, IoContext, Result};

pub const SERIAL_FILE_EXTENSION: &str = "serial-number";

/// Read every marker in `dir` into a serial -> alias map.
///
/// The alias is the file name up to its first `.`; any extension is
/// accepted. Empty files and non-decimal content are rejected. When two
/// files name the same alias with different serials, the first in file-name
/// order is kept and the other is reported.
pub fn read_serials_dir(dir: &Path) -> Result<BTreeMap<String, String>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .io_context(|| format!("Failed to read certificate directory {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()
        .io_context(|| format!("Failed to list {}", dir.display()))?;
    entries.sort();

    let mut serials = BTreeMap::new();
    let mut serial_by_alias: BTreeMap<String, String> = BTreeMap::new();
    for path in entries.into_iter().filter(|p| p.is_file()) {
        let Some(alias) = alias_for(&path) else {
            continue;
        };
        let serial = read_value_file(&path)?.unwrap_or_default();
        if !is_decimal(&serial) {
            return Err(Error::InvalidSerial { path, serial });
        }
        match serial_by_alias.get(&alias) {
            Some(kept) if *kept == serial => continue,
            Some(kept) => {
                tracing::warn!(
                    "alias '{alias}' already has serial {kept}; ignoring serial {serial} from {}",
                    path.display()
                );
                continue;
            }
            None => {}
        }
        serial_by_alias.insert(alias.clone(), serial.clone());
        if let Some(previous) = serials.insert(serial.clone(), alias.clone()) {
            tracing::warn!(
                "serial {serial} is listed for both '{previous}' and '{alias}'; using '{alias}'"
            );
        }
    }
    Ok(serials)
}

/// Write `<dir>/<alias>.serial-number`, creating `dir` if needed.
pub fn write_serial_file(dir: &Path, alias: &str, serial: &str) -> Result<PathBuf> {
    if !is_decimal(serial) {
        return Err(Error::InvalidSerial {
            path: dir.join(alias),
            serial: serial.to_string(),
        });
    }
    fs::create_dir_all(dir).io_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(format!("{alias}.{SERIAL_FILE_EXTENSION}"));
    write_value_file(&path, serial)?;
    Ok(path)
}

fn alias_for(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    if name.starts_with('.') {
        return None;
    }
    let alias = name.split_once('.').map_or(name, |(alias, _)| alias);
    Some(alias.to_string())
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
