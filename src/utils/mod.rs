// Shared utilities module
pub mod config_loader;
pub mod diagnostics;
pub mod errors;
pub mod incremental;
pub mod logging;
pub mod paths;
pub mod ui;

pub use config_loader::*;
pub use diagnostics::*;
pub use errors::*;
pub use incremental::*;
pub use logging::*;
pub use ui::*;
