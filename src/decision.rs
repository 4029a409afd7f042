//! Applying a selection to the installer catalogs.
//!
//! An entry is kept (or enabled) exactly when its name matches at least one
//! line of the corresponding selection section, compared case-insensitively
//! and in full. Everything else is flagged for removal.

use std::collections::HashSet;
use std::fmt;

use crate::catalog::InstallerCatalogs;
use crate::selection::{Section, SelectionDocument};

/// Case-insensitive, whole-string name comparison.
///
/// Both sides are folded one character at a time with Unicode lowercase, so
/// KELVIN SIGN matches `k`, while a character whose lowercase form is longer
/// (`İ` becomes `i̇`) does not match its single-letter look-alike.
pub fn names_match(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

fn fold(name: &str) -> String {
    name.chars().flat_map(char::to_lowercase).collect()
}

/// Selected/total counts for one artifact kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindSummary {
    pub selected: usize,
    pub total: usize,
}

/// Outcome of [`apply_selection`], per artifact kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionSummary {
    pub packages: KindSummary,
    pub scheduled_tasks: KindSummary,
    pub display_components: KindSummary,
}

impl fmt::Display for DecisionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "packages kept {}/{}, scheduled tasks enabled {}/{}, display components kept {}/{}",
            self.packages.selected,
            self.packages.total,
            self.scheduled_tasks.selected,
            self.scheduled_tasks.total,
            self.display_components.selected,
            self.display_components.total,
        )
    }
}

/// Set every entry's flag from `selection`.
///
/// `name_of` reads the identifying field and `set_flag` writes the decision.
/// Each entry is judged on its own, so duplicate names on either side are
/// fine and the order of `selection` is irrelevant.
pub fn apply_decisions<T>(
    entries: &mut [T],
    name_of: impl Fn(&T) -> &str,
    set_flag: impl Fn(&mut T, bool),
    selection: &[String],
) -> KindSummary {
    let wanted: HashSet<String> = selection.iter().map(|s| fold(s)).collect();

    let mut summary = KindSummary {
        selected: 0,
        total: entries.len(),
    };
    for entry in entries.iter_mut() {
        let selected = wanted.contains(&fold(name_of(&*entry)));
        set_flag(entry, selected);
        if selected {
            summary.selected += 1;
        }
    }
    summary
}

/// Flag all three catalogs from a parsed selection document.
pub fn apply_selection(
    document: &SelectionDocument,
    catalogs: &mut InstallerCatalogs,
) -> DecisionSummary {
    DecisionSummary {
        packages: apply_decisions(
            &mut catalogs.packages,
            |p| p.product_name.as_str(),
            |p, keep| p.keep = keep,
            document.get(Section::Packages),
        ),
        scheduled_tasks: apply_decisions(
            &mut catalogs.scheduled_tasks,
            |t| t.description.as_str(),
            |t, enabled| t.enabled = enabled,
            document.get(Section::ScheduledTasks),
        ),
        display_components: apply_decisions(
            &mut catalogs.display_components,
            |c| c.description.as_str(),
            |c, keep| c.keep = keep,
            document.get(Section::DisplayComponents),
        ),
    }
}
