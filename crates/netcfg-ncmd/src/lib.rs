//! ncmd - configuration applier
//!
//! Turns a list of xpath edits into running configuration:
//!
//! 1. [`edits`]: load the edits and build the config trees
//! 2. [`applier`]: walk the trees through the emitters and build a
//!    transactional command sequence
//! 3. [`applier::execute`]: run Do, then End; a failed Do is rolled back
//!
//! [`config`] holds the managed file paths and executor settings.

pub mod applier;
pub mod config;
pub mod edits;
pub mod error;

pub use applier::{backup_plans, execute, executor, Applier, RenderTarget};
pub use config::{AutoRestart, ExecutorMode, NcmdConfig, DEFAULT_CONFIG_PATH};
pub use edits::{load_edits, parse_edits, ConfigTrees, Edit};
pub use error::{NcmdError, NcmdResult};
