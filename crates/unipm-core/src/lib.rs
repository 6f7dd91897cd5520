pub mod cache;
pub mod catalog;
pub mod factory;
pub mod manager;

pub use cache::VersionCache;
pub use catalog::Catalog;
pub use factory::{FactoryOptions, PackageManagerFactory, detect};
pub use manager::{AddOptions, PackageManager};
