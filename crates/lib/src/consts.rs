//! Fixed names shared across the engine.

/// Project description file looked up in the project root.
pub const PROJECT_FILE: &str = "smk.toml";

/// Compile database written to the project root on request.
pub const COMPILE_DB_FILE: &str = "compile_commands.json";

/// Default build-directory root, relative to the project root.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Default compiler driver when the project file does not name one.
pub const DEFAULT_COMPILER: &str = "cc";

/// Extension of the link-hash marker, `.<app>.linkhash`, next to the executable.
pub const LINK_HASH_SUFFIX: &str = "linkhash";

/// Upper bound on concurrently running compiler processes.
pub const MAX_JOBS: usize = 32;
