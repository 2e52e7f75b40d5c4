use std::collections::BTreeSet;

use buildpulse_core::error::Result;
use buildpulse_core::model::point::Point;
use buildpulse_core::model::report::ChangeLog;

use super::RunContext;

pub const CHANGELOG_MEASUREMENT: &str = "changelog_data";

pub(super) fn generate(run: &RunContext<'_>, log: &ChangeLog) -> Result<Vec<Point>> {
    let messages: Vec<&str> = log
        .change_sets
        .iter()
        .filter_map(|c| c.message.lines().next())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .collect();
    let culprits: BTreeSet<&str> = log
        .change_sets
        .iter()
        .map(|c| c.author.trim())
        .filter(|a| !a.is_empty())
        .collect();
    let paths: BTreeSet<&str> = log
        .change_sets
        .iter()
        .flat_map(|c| c.affected_paths.iter().map(String::as_str))
        .collect();

    let point = run
        .point(CHANGELOG_MEASUREMENT)
        .field("commit_count", log.change_sets.len() as u64)
        .field("commit_messages", messages.join("; "))
        .field("culprits", join(&culprits, ", "))
        .field("affected_paths", join(&paths, ", "))
        .field("affected_path_count", paths.len() as u64)
        .build()?;
    Ok(vec![point])
}

fn join(items: &BTreeSet<&str>, sep: &str) -> String {
    items.iter().copied().collect::<Vec<_>>().join(sep)
}
