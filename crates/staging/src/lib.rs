//! CSV import staging.
//!
//! Takes the confidence-scored candidates returned by the CSV upload endpoint
//! and holds them in memory while the user corrects them, then commits each
//! partition to the ledger in one bulk call. Parsing, category storage and the
//! ledger itself are remote collaborators reached through [`ImportBackend`].
//!
//! The flow, with a backend `api`:
//!
//! ```ignore
//! let mut session = ImportSession::load(&api).await?;
//! session.select_account(3);
//! session.upload(&api, "statement.csv", bytes).await?;
//! session.update_field(RowId::new(7), FieldEdit::Amount("15.00".into()));
//! session.commit(&api, Partition::Uncertain).await?;
//! ```

mod backend;
mod batch;
mod candidate;
mod categories;
mod commit;
mod directory;
mod editor;
mod error;
mod money;
mod report;
mod session;

pub use backend::{CsvUpload, ImportBackend};
pub use batch::{Batch, Partition};
pub use candidate::{AmountEntry, Candidate, RowId};
pub use categories::CategoryBook;
pub use commit::{CommitRequest, CommitTicket, RowIssue};
pub use directory::Directory;
pub use editor::{EditOutcome, FieldEdit};
pub use error::{Result, StagingError};
pub use money::Amount;
pub use report::{ErrorReport, newest_first, summary};
pub use session::ImportSession;
