use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn memory_inventory_command() -> Option<(&'static str, &'static [&'static str])> {
        None
    }
}
