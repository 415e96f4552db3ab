pub mod diff;
pub mod error;
pub mod export;
pub mod file_info;
pub mod fs_entry;
pub mod hasher;
pub mod notifier;
pub mod scanner;
pub mod tar_entry;

// Re-exports for easy access
pub use diff::{classify, DiffType};
pub use error::{ExtractError, ExtractResult};
pub use export::{AbsNodeData, LayerExport};
pub use file_info::{EntryKind, FileInfo};
pub use notifier::Notifier;
pub use scanner::{compare_snapshots, ErrorPolicy, LayerScanner, LayerSnapshot};
