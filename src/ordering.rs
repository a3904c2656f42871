//! Foreign-key dependency ordering for the aggregate table file.
//!
//! Tables are sorted so that a table comes after every table its foreign keys
//! reference. Ties are broken by name so the output is stable. Tables caught
//! in a reference cycle cannot be ordered; they are appended in name order
//! once everything orderable has been emitted.

use crate::descriptor::TableDescriptor;
use std::collections::{BTreeSet, HashMap};

/// Result of ordering a set of tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyOrder {
    /// Table names, dependencies first.
    pub order: Vec<String>,
    /// Tables that sit on (or behind) a reference cycle, in name order.
    pub cyclic: Vec<String>,
}

/// Topologically sort tables by their foreign-key references.
///
/// References to tables outside `tables` (another schema, or a table the
/// export could not read) are ignored.
pub fn topological_sort(tables: &[TableDescriptor]) -> DependencyOrder {
    let known: BTreeSet<&str> = tables.iter().map(|t| t.name.as_str()).collect();

    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for table in tables {
        in_degree.entry(table.name.as_str()).or_insert(0);
        for dep in table.referenced_tables() {
            let Some(&dep) = known.get(dep.as_str()) else {
                continue;
            };
            *in_degree.entry(table.name.as_str()).or_insert(0) += 1;
            dependents.entry(dep).or_default().push(table.name.as_str());
        }
    }

    // BTreeSet keeps the ready queue in name order.
    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();

    let mut order = Vec::with_capacity(tables.len());
    while let Some(current) = ready.pop_first() {
        order.push(current.to_string());

        if let Some(children) = dependents.get(current) {
            for child in children {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(*child);
                    }
                }
            }
        }
    }

    let mut cyclic: Vec<String> = in_degree
        .iter()
        .filter(|(_, degree)| **degree > 0)
        .map(|(name, _)| name.to_string())
        .collect();
    cyclic.sort();

    DependencyOrder { order, cyclic }
}

/// Reorder tables by dependency; cyclic tables go last, in name order.
pub fn order_by_dependency(tables: &[TableDescriptor]) -> Vec<&TableDescriptor> {
    let sorted = topological_sort(tables);
    if !sorted.cyclic.is_empty() {
        log::warn!(
            "Circular foreign key references between: {} (appended in name order)",
            sorted.cyclic.join(", ")
        );
    }

    let by_name: HashMap<&str, &TableDescriptor> =
        tables.iter().map(|t| (t.name.as_str(), t)).collect();

    sorted
        .order
        .iter()
        .chain(sorted.cyclic.iter())
        .filter_map(|name| by_name.get(name.as_str()).copied())
        .collect()
}
