//! Detectors for the facts shown on the installer's first page.

use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::memory::{detect_ram_gb, suggested_swap_gb};
use crate::prelude::*;
use crate::probe::Probe;

/// Kind of the primary storage device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Nvme,
    Ssd,
    Hdd,
}

/// TPM generation exposed by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TpmVersion {
    #[serde(rename = "2.0")]
    V2_0,
    #[serde(rename = "1.2")]
    V1_2,
    #[serde(rename = "none")]
    Absent,
}

/// Wi-Fi chipset vendors that need extra firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WifiChipset {
    Broadcom,
    Intel,
    Realtek,
    Atheros,
    #[serde(rename = "")]
    Unknown,
}

/// Everything the frontend needs to know about the machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Facts {
    pub hostname: String,
    pub has_efi: bool,
    pub has_nvidia: bool,
    pub has_amd_gpu: bool,
    pub wifi_chipset: WifiChipset,
    pub storage_type: StorageType,
    pub tpm_version: TpmVersion,
    pub ram_gb: u64,
    pub suggested_swap_gb: u64,
}

/// Run every detector.
pub fn detect(probe: &dyn Probe) -> Facts {
    let ram_gb = detect_ram_gb(probe);
    Facts {
        hostname: detect_hostname(probe),
        has_efi: detect_efi(probe),
        has_nvidia: detect_nvidia(probe),
        has_amd_gpu: detect_amd_gpu(probe),
        wifi_chipset: detect_wifi_chipset(probe),
        storage_type: detect_storage_type(probe),
        tpm_version: detect_tpm_version(probe),
        ram_gb,
        suggested_swap_gb: suggested_swap_gb(ram_gb),
    }
}

/// Raw JSON of `lsblk -OJ`.
pub fn block_devices(probe: &dyn Probe) -> Result<Vec<u8>> {
    probe.run("lsblk", &["-OJ"])
}

pub fn detect_hostname(probe: &dyn Probe) -> String {
    probe.hostname().unwrap_or_else(|err| {
        warn!("Failed to detect hostname - {err}");
        String::new()
    })
}

pub fn detect_efi(probe: &dyn Probe) -> bool {
    probe.exists(Path::new("/sys/firmware/efi"))
}

pub fn detect_nvidia(probe: &dyn Probe) -> bool {
    let Some(out) = command_output(probe, "nvidia-detect", &[]) else {
        warn!("Failed to run nvidia-detect, assuming no nvidia");
        return false;
    };
    !out.contains("No NVIDIA GPU detected") && out.contains("nvidia-driver")
}

pub fn detect_amd_gpu(probe: &dyn Probe) -> bool {
    let Some(out) = command_output(probe, "lspci", &[]) else {
        warn!("Failed to run lspci, assuming no AMD GPU");
        return false;
    };
    out.contains("AMD") && (out.contains("VGA") || out.contains("Display"))
}

pub fn detect_wifi_chipset(probe: &dyn Probe) -> WifiChipset {
    let Some(out) = command_output(probe, "lspci", &[]) else {
        warn!("Failed to run lspci for Wi-Fi detection");
        return WifiChipset::Unknown;
    };
    if !out.contains("Wireless") {
        return WifiChipset::Unknown;
    }
    [
        ("Broadcom", WifiChipset::Broadcom),
        ("Intel", WifiChipset::Intel),
        ("Realtek", WifiChipset::Realtek),
        ("Atheros", WifiChipset::Atheros),
    ]
    .into_iter()
    .find(|(vendor, _)| out.contains(vendor))
    .map_or(WifiChipset::Unknown, |(_, chipset)| chipset)
}

pub fn detect_storage_type(probe: &dyn Probe) -> StorageType {
    if probe.exists(Path::new("/dev/nvme0n1")) {
        return StorageType::Nvme;
    }
    match command_output(probe, "lsblk", &["-d", "-o", "name,rota"]) {
        Some(out) if out.contains('0') => StorageType::Ssd,
        _ => StorageType::Hdd,
    }
}

pub fn detect_tpm_version(probe: &dyn Probe) -> TpmVersion {
    if probe.exists(Path::new("/dev/tpmrm0")) {
        TpmVersion::V2_0
    } else if probe.exists(Path::new("/dev/tpm0")) {
        TpmVersion::V1_2
    } else {
        TpmVersion::Absent
    }
}

fn command_output(probe: &dyn Probe, program: &str, args: &[&str]) -> Option<String> {
    match probe.run(program, args) {
        Ok(out) => Some(String::from_utf8_lossy(&out).into_owned()),
        Err(err) => {
            warn!("{program} failed - {err}");
            None
        }
    }
}
