/// Workflow editor core
///
/// The graph model and its helpers are pure and synchronous. The controller and
/// dashboard add the remote lifecycle on top through the gateway.

pub mod controller;
pub mod dashboard;
pub mod dirty;
pub mod export;
pub mod graph;
pub mod ids;
pub mod import;
pub mod log;
pub mod shortcuts;

pub use controller::{EditorController, Phase, Route};
pub use dashboard::Dashboard;
pub use export::ExportFile;
pub use graph::{EdgeChange, GraphModel, NodeChange, Selection};
pub use log::{ExecutionLog, RunStatus};
pub use shortcuts::{FocusTarget, Key, KeyEvent, ShortcutAction};
