pub mod monitor;
pub mod snapshot;
pub mod workspace;

pub use monitor::{Monitor, MonitorError, MonitorSet};
pub use snapshot::Snapshot;
pub use workspace::{Window, Workspace, WorkspaceError, WorkspaceSet};
