pub mod chunks;
pub mod frontmatter;
pub mod hash;
pub mod ignore;
pub mod images;
pub mod pull;
pub mod reconcile;

pub use pull::{PullSync, PullSyncReport};
pub use reconcile::{Outcome, Reconciler};

/// The per-repository ignore file, read from the repository root.
pub const IGNORE_FILE: &str = ".lumioignore";
