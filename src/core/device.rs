//! Target device of the backend.

use std::fmt;
use std::str::FromStr;

/// Backend device variant. Capability predicates of the op builders are a
/// pure function of this tag and static operator metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceType {
    #[default]
    Cpu,
    Gpu,
    Npu,
}

impl DeviceType {
    pub const ALL: [DeviceType; 3] = [DeviceType::Cpu, DeviceType::Gpu, DeviceType::Npu];

    pub const fn name(self) -> &'static str {
        match self {
            DeviceType::Cpu => "cpu",
            DeviceType::Gpu => "gpu",
            DeviceType::Npu => "npu",
        }
    }

    pub const fn is_cpu(self) -> bool {
        matches!(self, DeviceType::Cpu)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceType::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown device type '{s}' (expected cpu, gpu or npu)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_type() {
        assert_eq!("cpu".parse::<DeviceType>(), Ok(DeviceType::Cpu));
        assert_eq!("GPU".parse::<DeviceType>(), Ok(DeviceType::Gpu));
        assert_eq!("npu".parse::<DeviceType>(), Ok(DeviceType::Npu));
        assert!("tpu".parse::<DeviceType>().is_err());
    }

    #[test]
    fn test_default_is_cpu() {
        assert!(DeviceType::default().is_cpu());
        assert!(!DeviceType::Gpu.is_cpu());
    }
}
