pub mod discovery;
pub mod io;
pub mod package_json;

pub use discovery::{discover_manifests, primary_manifest, project_root};
pub use io::{read_package_json, read_package_json_file, write_package_json_file};
pub use package_json::{DependencyKind, PackageJson};
