use std::fmt;

/// The uniform handled error crossing the facade boundary. Calling CLIs
/// get one consistent failure path regardless of which backend failed;
/// the diagnostic detail has already been logged by the time one of these
/// is constructed.
#[derive(Debug)]
pub enum PackageManagerError {
    /// No package manager could be confirmed usable for the project.
    DetectionFailed(String),
    /// Registry lookup failed and no pinned fallback version exists.
    VersionResolutionFailed(String, String),
    /// An install/add invocation exited non-zero.
    InstallFailed(String),
    /// A remove operation could not be completed.
    RemoveFailed(String),
    /// A script invocation exited non-zero.
    ScriptFailed(String, i32),
    /// Reading or writing a package.json failed.
    ManifestError(String),
    /// The backend executable could not be resolved at all.
    ExecutableNotFound(String),
    /// A subprocess failed in a way none of the other variants cover.
    CommandFailed(String, String),
    IoError(String),
}

impl fmt::Display for PackageManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DetectionFailed(detail) => {
                write!(f, "Could not detect a usable package manager: {detail}")
            }
            Self::VersionResolutionFailed(name, detail) => {
                write!(f, "Failed to resolve a version for '{name}': {detail}")
            }
            Self::InstallFailed(detail) => {
                write!(f, "Dependency installation failed: {detail}")
            }
            Self::RemoveFailed(detail) => {
                write!(f, "Dependency removal failed: {detail}")
            }
            Self::ScriptFailed(script, code) => {
                write!(f, "Script '{script}' failed with exit code {code}")
            }
            Self::ManifestError(detail) => {
                write!(f, "package.json error: {detail}")
            }
            Self::ExecutableNotFound(command) => {
                write!(f, "Executable '{command}' was not found on this system")
            }
            Self::CommandFailed(command, detail) => {
                write!(f, "Command '{command}' failed: {detail}")
            }
            Self::IoError(detail) => {
                write!(f, "IO error: {detail}")
            }
        }
    }
}

impl std::error::Error for PackageManagerError {}

impl From<anyhow::Error> for PackageManagerError {
    fn from(err: anyhow::Error) -> Self {
        Self::ManifestError(err.to_string())
    }
}

impl From<std::io::Error> for PackageManagerError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PackageManagerError>;
