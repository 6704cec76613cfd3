pub mod config_presets;
pub mod local_resolver;
pub mod policy_engine;

pub use config_presets::ConfigPresets;
pub use local_resolver::{FastPath, LocalResolver, LocalResult};
pub use policy_engine::{
    allows_system_fallback, build_stage_sequence, effective_query_types,
    prioritize_local_lookups, resolution_key, DnsSettings, ManagerState, StageSequence,
};
