pub mod install;
pub mod list;
pub mod registry;
pub mod remove;
pub mod resolve;
pub mod run;

pub use install::InstallHandler;
pub use list::ListHandler;
pub use registry::RegistryHandler;
pub use remove::RemoveHandler;
pub use resolve::ResolveHandler;
pub use run::RunHandler;
