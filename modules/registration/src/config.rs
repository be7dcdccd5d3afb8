use serde::{Deserialize, Serialize};

/// Configuration for the registration module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationConfig {
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,
    /// Argon2 time cost (passes over memory).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
    /// Argon2 lanes.
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

fn default_argon2_memory_kib() -> u32 {
    argon2::Params::DEFAULT_M_COST
}

fn default_argon2_iterations() -> u32 {
    argon2::Params::DEFAULT_T_COST
}

fn default_argon2_parallelism() -> u32 {
    argon2::Params::DEFAULT_P_COST
}
