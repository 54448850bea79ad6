use serde::Serialize;

use super::process::ProcessSample;

/// Memory type reported when the inventory probe could not run.
pub const MEMORY_TYPE_UNAVAILABLE: &str = "Unknown (root required)";
/// Memory type reported when the probe ran but found nothing usable.
pub const MEMORY_TYPE_UNKNOWN: &str = "Unknown";

/// One complete sampling cycle. Built once, never mutated after publish.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub cpu_usage_percent: f64,
    pub cpu_model: String,
    pub cpu_physical_cores: usize,
    pub cpu_logical_threads: usize,
    pub memory_total_bytes: u64,
    pub memory_used_bytes: u64,
    pub memory_usage_percent: f64,
    pub memory_type: String,
    pub disk_total_bytes: u64,
    pub disk_used_bytes: u64,
    pub disk_usage_percent: f64,
    pub disk_filesystem_type: String,
    pub network_in_rate_bytes_per_sec: u64,
    pub network_out_rate_bytes_per_sec: u64,
    pub processes: Vec<ProcessSample>,
}

impl SystemSnapshot {
    pub fn percentages(&self) -> impl Iterator<Item = f64> + '_ {
        [
            self.cpu_usage_percent,
            self.memory_usage_percent,
            self.disk_usage_percent,
        ]
        .into_iter()
        .chain(
            self.processes
                .iter()
                .flat_map(|p| [p.cpu_percent, p.memory_percent]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn serialized_field_names() {
        let snapshot = SystemSnapshot {
            cpu_usage_percent: 12.5,
            cpu_model: "Test CPU".to_string(),
            cpu_physical_cores: 4,
            cpu_logical_threads: 8,
            memory_total_bytes: 1000,
            memory_used_bytes: 250,
            memory_usage_percent: 25.0,
            memory_type: "DDR4".to_string(),
            disk_total_bytes: 2000,
            disk_used_bytes: 500,
            disk_usage_percent: 25.0,
            disk_filesystem_type: "ext4".to_string(),
            network_in_rate_bytes_per_sec: 1000,
            network_out_rate_bytes_per_sec: 10,
            processes: vec![ProcessSample {
                pid: 42,
                name: "nginx".to_string(),
                cpu_percent: 1.5,
                memory_percent: 0.25,
                memory_resident_bytes: 4096,
            }],
        };

        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        assert_snapshot!(json, @r#"
        {
          "cpu_usage_percent": 12.5,
          "cpu_model": "Test CPU",
          "cpu_physical_cores": 4,
          "cpu_logical_threads": 8,
          "memory_total_bytes": 1000,
          "memory_used_bytes": 250,
          "memory_usage_percent": 25.0,
          "memory_type": "DDR4",
          "disk_total_bytes": 2000,
          "disk_used_bytes": 500,
          "disk_usage_percent": 25.0,
          "disk_filesystem_type": "ext4",
          "network_in_rate_bytes_per_sec": 1000,
          "network_out_rate_bytes_per_sec": 10,
          "processes": [
            {
              "pid": 42,
              "name": "nginx",
              "cpu_percent": 1.5,
              "memory_percent": 0.25,
              "memory_resident_bytes": 4096
            }
          ]
        }
        "#);
    }

    #[test]
    fn percentages_cover_processes() {
        let snapshot = SystemSnapshot {
            cpu_usage_percent: 1.0,
            processes: vec![ProcessSample {
                pid: 1,
                name: "a".into(),
                cpu_percent: 2.0,
                memory_percent: 3.0,
                memory_resident_bytes: 0,
            }],
            ..Default::default()
        };
        let all: Vec<f64> = snapshot.percentages().collect();
        assert_eq!(all, vec![1.0, 0.0, 0.0, 2.0, 3.0]);
    }
}
