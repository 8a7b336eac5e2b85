// Infrastructure layer
pub mod build_context;
pub mod file_system;
pub mod path_matcher;
pub mod processors;

pub use build_context::*;
pub use path_matcher::*;
pub use processors::*;
