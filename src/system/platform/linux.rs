use super::PlatformExtensions;

const DMIDECODE_ARGS: &[&str] = &["-t", "17"];

pub struct Platform;

impl PlatformExtensions for Platform {
    fn memory_inventory_command() -> Option<(&'static str, &'static [&'static str])> {
        // SMBIOS type 17 is "Memory Device"; reading it needs root.
        Some(("dmidecode", DMIDECODE_ARGS))
    }
}
