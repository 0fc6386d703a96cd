//! Classification of changed files into commit message lines
//!
//! Files are recognized only through the registry's reverse map, keyed by
//! basename. Anything else in the working tree belongs to someone else and
//! is neither staged nor mentioned.

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

use crate::app::ResourceKind;
use crate::error::Result;
use crate::registry::Registry;

/// Verb for files git reports as untracked
pub const ADDED: &str = "Added";
/// Verb for files git reports as modified
pub const UPDATED: &str = "Updated";

/// Classify `files`, staging every recognized one through `stage`.
///
/// Returns one message per resource kind present, in [`ResourceKind`]
/// order, e.g. `"Updated SecondarySchema files for: Dota 2, Portal 2"`.
/// Names keep the order their files were encountered in.
pub fn classify<I, S, F>(registry: &Registry, files: I, verb: &str, mut stage: F) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&str) -> Result<()>,
{
    let mut updates: BTreeMap<ResourceKind, Vec<&str>> = BTreeMap::new();

    for file in files {
        let file = file.as_ref();
        let Some(file_name) = Path::new(file).file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((app, kind)) = registry.classify(file_name) else {
            debug!("Ignoring unrelated file {}", file);
            continue;
        };

        let names = updates.entry(kind).or_default();
        if !names.contains(&app.name.as_str()) {
            names.push(app.name.as_str());
        }
        stage(file)?;
    }

    Ok(updates
        .into_iter()
        .map(|(kind, names)| format!("{} {} files for: {}", verb, kind, names.join(", ")))
        .collect())
}
