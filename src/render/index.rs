//! Master index (`complete_schema/README.sql`).

/// Sections in recommended apply order: (heading, aggregate file, description).
pub const APPLY_ORDER: [(&str, &str, &str); 5] = [
    ("TABLES", "all_tables.sql", "table definitions"),
    ("FUNCTIONS", "all_functions.sql", "function definitions"),
    ("VIEWS", "all_views.sql", "view definitions"),
    ("TRIGGERS", "all_triggers.sql", "trigger definitions"),
    ("RLS POLICIES", "all_rls_policies.sql", "RLS policy definitions"),
];

const RULE: &str = "-- ============================================================";

/// Render the master index. `include_data` appends the optional data step.
pub fn render_master_index(generated_at: &str, database: &str, include_data: bool) -> String {
    let mut sql = format!(
        "-- Complete Database Export\n\
         -- Generated: {}\n\
         -- Database: {}\n\
         \n\
         -- This file contains all database objects in the correct order for recreation\n\
         \n",
        generated_at, database
    );

    for (heading, file, what) in APPLY_ORDER {
        sql.push_str(&format!(
            "{rule}\n-- {heading}\n{rule}\n\n-- See: complete_schema/{file} for {what}\n\n",
            rule = RULE,
        ));
    }

    sql.push_str(&format!(
        "{rule}\n-- Import Order (for restoring the database):\n{rule}\n",
        rule = RULE
    ));
    for (i, (_, file, _)) in APPLY_ORDER.iter().enumerate() {
        sql.push_str(&format!("-- {}. {}\n", i + 1, file));
    }
    if include_data {
        sql.push_str(&format!(
            "-- {}. data/complete/all_data.sql (optional, sample rows)\n",
            APPLY_ORDER.len() + 1
        ));
    }
    sql
}
