use super::PlatformExtensions;

const SYSTEM_PROFILER_ARGS: &[&str] = &["SPMemoryDataType"];

pub struct Platform;

impl PlatformExtensions for Platform {
    fn memory_inventory_command() -> Option<(&'static str, &'static [&'static str])> {
        Some(("system_profiler", SYSTEM_PROFILER_ARGS))
    }
}
