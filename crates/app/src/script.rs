//! Scripted corrections applied between upload and commit.
//!
//! A script is a JSON array of steps:
//!
//! ```json
//! [
//!   {"op": "edit", "row": 7, "edit": {"field": "amount", "value": "-15.00"}},
//!   {"op": "new_category", "row": 7, "name": "Groceries"},
//!   {"op": "delete", "row": 9}
//! ]
//! ```

use serde::Deserialize;
use staging::{EditOutcome, FieldEdit, ImportBackend, ImportSession, RowId};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Edit { row: RowId, edit: FieldEdit },
    Delete { row: RowId },
    NewCategory { row: RowId, name: String },
}

pub fn parse(raw: &str) -> Result<Vec<Step>> {
    Ok(serde_json::from_str(raw)?)
}

/// Runs every step in order. Steps aimed at rows that are not staged are
/// skipped with a warning; a failed category creation stops the script.
pub async fn apply<B: ImportBackend>(
    session: &mut ImportSession,
    backend: &B,
    steps: Vec<Step>,
) -> Result<()> {
    for step in steps {
        match step {
            Step::Edit { row, edit } => {
                if session.update_field(row, edit) == EditOutcome::Ignored {
                    tracing::warn!("row {row} is not staged, edit skipped");
                }
            }
            Step::Delete { row } => {
                if session.delete(row).is_none() {
                    tracing::warn!("row {row} is not staged, delete skipped");
                }
            }
            Step::NewCategory { row, name } => {
                session.begin_new_category(row)?;
                session.set_new_category_name(row, &name)?;
                match session.submit_new_category(backend, row).await {
                    Ok(Some(category)) => {
                        println!("Created category \"{}\" for row {row}", category.category_name);
                    }
                    Ok(None) => {
                        tracing::warn!("empty category name for row {row}, skipped");
                        session.cancel_new_category(row);
                    }
                    Err(err) => {
                        session.cancel_new_category(row);
                        return Err(err.into());
                    }
                }
            }
        }
    }
    Ok(())
}
