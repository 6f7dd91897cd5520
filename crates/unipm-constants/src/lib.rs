pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str =
    "One interface over npm, pnpm, Yarn Classic, Yarn Berry and Bun";
pub const BIN_NAME: &str = "unipm";

/// Environment variable set by npm-family launchers to identify themselves,
/// e.g. `yarn/3.6.4 npm/? node/v18.17.0 darwin arm64`.
pub const USER_AGENT_ENV: &str = "npm_config_user_agent";

/// Overrides project-root discovery when set.
pub const PROJECT_ROOT_ENV: &str = "UNIPM_PROJECT_ROOT";

/// Set by virtually every CI provider.
pub const CI_ENV: &str = "CI";

/// Injected into every child process so the orchestrated tools behave the
/// same regardless of the user's ambient environment: no corepack pinning,
/// no strict-mode aborts, no update notifier noise.
pub const CHILD_PROCESS_ENV: &[(&str, &str)] = &[
    ("COREPACK_ENABLE_STRICT", "0"),
    ("COREPACK_ENABLE_AUTO_PIN", "0"),
    ("NPM_CONFIG_UPDATE_NOTIFIER", "false"),
    ("NO_UPDATE_NOTIFIER", "1"),
];

pub const NPM_LOCKFILE: &str = "package-lock.json";
pub const PNPM_LOCKFILE: &str = "pnpm-lock.yaml";
pub const YARN_LOCKFILE: &str = "yarn.lock";
pub const BUN_BINARY_LOCKFILE: &str = "bun.lockb";
pub const BUN_TEXT_LOCKFILE: &str = "bun.lock";

/// Most-specific tools first; `package-lock.json` last since npm writes it
/// even in repositories managed by another tool.
pub const LOCKFILES: &[&str] = &[
    BUN_BINARY_LOCKFILE,
    BUN_TEXT_LOCKFILE,
    PNPM_LOCKFILE,
    YARN_LOCKFILE,
    NPM_LOCKFILE,
];

pub const MANIFEST_FILE: &str = "package.json";
pub const PNPM_WORKSPACE_FILE: &str = "pnpm-workspace.yaml";
pub const YARN_BERRY_RC_FILE: &str = ".yarnrc.yml";
pub const PNP_LOADER_FILE: &str = ".pnp.cjs";

/// Shim extensions tried in order on Windows before the bare name.
pub const WINDOWS_SHIM_EXTENSIONS: &[&str] = &[".cmd", ".bat", ".exe", ""];

/// Depth used for the first (deep) dependency-tree query.
pub const DEFAULT_TREE_DEPTH: u32 = 99;
