//! Output tree.
//!
//! ```text
//! <output_dir>/
//! ├── schemas/          one file per table
//! ├── rls_policies/     one file per table with policies
//! ├── triggers/         one file per table with triggers
//! ├── functions/        one file per function name
//! ├── views/            one file per view
//! ├── data/             sample rows per table (optional)
//! │   └── complete/
//! └── complete_schema/  aggregate files + README.sql
//! ```
//!
//! Files are overwritten in place. There is no temp-file-then-rename and no
//! locking; a crash mid-write can leave a truncated file.

use crate::render::sanitize_file_stem;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Failed to write {}: {source}", .path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Object category, each with its own folder and aggregate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Tables,
    Policies,
    Triggers,
    Functions,
    Views,
    Data,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Tables,
        Category::Policies,
        Category::Triggers,
        Category::Functions,
        Category::Views,
        Category::Data,
    ];

    /// Folder holding the per-object files.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Tables => "schemas",
            Category::Policies => "rls_policies",
            Category::Triggers => "triggers",
            Category::Functions => "functions",
            Category::Views => "views",
            Category::Data => "data",
        }
    }

    pub fn aggregate_file(&self) -> &'static str {
        match self {
            Category::Tables => "all_tables.sql",
            Category::Policies => "all_rls_policies.sql",
            Category::Triggers => "all_triggers.sql",
            Category::Functions => "all_functions.sql",
            Category::Views => "all_views.sql",
            Category::Data => "all_data.sql",
        }
    }

    /// Title line of the aggregate file.
    pub fn aggregate_title(&self) -> &'static str {
        match self {
            Category::Tables => "Complete Database Schema",
            Category::Policies => "Complete RLS Policies",
            Category::Triggers => "Complete Triggers",
            Category::Functions => "Complete Functions",
            Category::Views => "Complete Views",
            Category::Data => "Complete Data",
        }
    }

    /// Plural noun used in progress messages.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Tables => "table schemas",
            Category::Policies => "RLS policies",
            Category::Triggers => "triggers",
            Category::Functions => "functions",
            Category::Views => "views",
            Category::Data => "table data",
        }
    }
}

pub const COMPLETE_DIR: &str = "complete_schema";
pub const MASTER_INDEX_FILE: &str = "README.sql";

/// Writes SQL files under one output directory.
#[derive(Debug, Clone)]
pub struct SqlWriter {
    root: PathBuf,
}

impl SqlWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Aggregates live in `complete_schema/`, except data which keeps its own `data/complete/`.
    pub fn aggregate_path(&self, category: Category) -> PathBuf {
        match category {
            Category::Data => self
                .category_dir(Category::Data)
                .join("complete")
                .join(category.aggregate_file()),
            _ => self.root.join(COMPLETE_DIR).join(category.aggregate_file()),
        }
    }

    pub fn object_path(&self, category: Category, object_name: &str) -> PathBuf {
        self.category_dir(category)
            .join(format!("{}.sql", sanitize_file_stem(object_name)))
    }

    /// Create every category folder up front.
    pub fn prepare(&self) -> Result<(), WriteError> {
        for category in Category::ALL {
            create_dir(&self.category_dir(category))?;
        }
        create_dir(&self.category_dir(Category::Data).join("complete"))?;
        create_dir(&self.root.join(COMPLETE_DIR))
    }

    /// Write one object's file, e.g. `schemas/users.sql`.
    pub fn write_object(
        &self,
        category: Category,
        object_name: &str,
        content: &str,
    ) -> Result<PathBuf, WriteError> {
        let path = self.object_path(category, object_name);
        self.save(&path, content)?;
        Ok(path)
    }

    pub fn write_aggregate(&self, category: Category, content: &str) -> Result<PathBuf, WriteError> {
        let path = self.aggregate_path(category);
        self.save(&path, content)?;
        Ok(path)
    }

    pub fn write_master_index(&self, content: &str) -> Result<PathBuf, WriteError> {
        let path = self.root.join(COMPLETE_DIR).join(MASTER_INDEX_FILE);
        self.save(&path, content)?;
        Ok(path)
    }

    /// Create parent directories as needed and overwrite `path`.
    pub fn save(&self, path: &Path, content: &str) -> Result<(), WriteError> {
        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }
        fs::write(path, content).map_err(|source| WriteError {
            path: path.to_path_buf(),
            source,
        })?;

        let shown = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        log::info!("✓ Saved: {}", shown);
        Ok(())
    }
}

fn create_dir(dir: &Path) -> Result<(), WriteError> {
    fs::create_dir_all(dir).map_err(|source| WriteError {
        path: dir.to_path_buf(),
        source,
    })
}
