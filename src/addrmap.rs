//! Registry of the address-mapped regions a run may target.
//!
//! A map is built once, either from a table in code or from a JSON file of
//! `{ "base", "size", "id", "path" }` objects, and is read-only afterwards.

use std::fmt;
use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRegion {
    pub base: u32,
    pub size: u32,
    pub id: u32,
    pub path: String,
}

impl AddressRegion {
    pub fn new(base: u32, size: u32, id: u32, path: impl Into<String>) -> Self {
        Self {
            base,
            size,
            id,
            path: path.into(),
        }
    }

    /// One past the last byte, widened so a region ending at 4 GiB is representable.
    pub fn end(&self) -> u64 {
        u64::from(self.base) + u64::from(self.size)
    }

    pub fn contains(&self, address: u32) -> bool {
        u64::from(address) >= u64::from(self.base) && u64::from(address) < self.end()
    }

    /// True when a whole 32-bit word starting at `address` lies inside the region.
    pub fn contains_word(&self, address: u32) -> bool {
        u64::from(address) >= u64::from(self.base) && u64::from(address) + 4 <= self.end()
    }

    pub fn overlaps(&self, other: &AddressRegion) -> bool {
        u64::from(self.base) < other.end() && u64::from(other.base) < self.end()
    }
}

impl fmt::Display for AddressRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:#x} - {:#x}) size {:#x} id {}",
            self.path,
            self.base,
            self.end(),
            self.size,
            self.id
        )
    }
}

/// Ordered, immutable collection of [`AddressRegion`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressMap {
    regions: Vec<AddressRegion>,
}

impl AddressMap {
    /// Validates each entry; insertion order is kept.
    ///
    /// Overlap between regions is not rejected here, see [`AddressMap::find_overlap`].
    pub fn new(regions: Vec<AddressRegion>) -> Result<Self> {
        if regions.is_empty() {
            return Err(HarnessError::Configuration(
                "address map has no regions".to_string(),
            ));
        }

        for (index, region) in regions.iter().enumerate() {
            if region.path.trim().is_empty() {
                return Err(HarnessError::Configuration(format!(
                    "region #{} at {:#x} has no path",
                    index, region.base
                )));
            }
            if region.size == 0 {
                return Err(HarnessError::Configuration(format!(
                    "region {} has zero size",
                    region.path
                )));
            }
            if region.end() > 1 << 32 {
                return Err(HarnessError::Configuration(format!(
                    "region {} runs past the end of the 32-bit address space",
                    region.path
                )));
            }
        }

        Ok(Self { regions })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let regions: Vec<AddressRegion> = serde_json::from_str(json)
            .map_err(|e| HarnessError::Configuration(format!("malformed entry: {}", e)))?;
        Self::new(regions)
    }

    pub fn load(path: &Utf8Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn regions(&self) -> &[AddressRegion] {
        &self.regions
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn region_containing(&self, address: u32) -> Option<&AddressRegion> {
        self.regions.iter().find(|region| region.contains(address))
    }

    /// First pair of regions whose byte ranges intersect, in map order.
    pub fn find_overlap(&self) -> Option<(&AddressRegion, &AddressRegion)> {
        self.regions.iter().enumerate().find_map(|(i, a)| {
            self.regions[i + 1..]
                .iter()
                .find(|b| a.overlaps(b))
                .map(|b| (a, b))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periph(base: u32, size: u32, id: u32, path: &str) -> AddressRegion {
        AddressRegion::new(base, size, id, path)
    }

    #[test]
    fn test_keeps_insertion_order() {
        let map = AddressMap::new(vec![
            periph(0x2000, 0x100, 2, "periphB"),
            periph(0x1000, 0x100, 1, "periphA"),
        ])
        .unwrap();

        assert_eq!(map.region_count(), 2);
        assert_eq!(map.regions()[0].path, "periphB");
        assert_eq!(map.regions()[1].path, "periphA");
    }

    #[test]
    fn test_empty_map_is_rejected() {
        let err = AddressMap::new(Vec::new()).unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(_)));
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let err = AddressMap::new(vec![periph(0x1000, 0, 1, "periphA")]).unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(_)));
    }

    #[test]
    fn test_missing_path_is_rejected() {
        let err = AddressMap::new(vec![periph(0x1000, 0x10, 1, "  ")]).unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(_)));
    }

    #[test]
    fn test_region_past_address_space_is_rejected() {
        let err = AddressMap::new(vec![periph(0xFFFF_FF00, 0x200, 1, "top")]).unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(_)));

        // Ending exactly at 4 GiB is fine.
        assert!(AddressMap::new(vec![periph(0xFFFF_FF00, 0x100, 1, "top")]).is_ok());
    }

    #[test]
    fn test_containment() {
        let region = periph(0x1000, 0x100, 1, "periphA");

        assert!(region.contains(0x1000));
        assert!(region.contains(0x10FF));
        assert!(!region.contains(0x1100));
        assert!(!region.contains(0x0FFF));

        assert!(region.contains_word(0x10FC));
        assert!(!region.contains_word(0x10FD));
    }

    #[test]
    fn test_region_containing() {
        let map = AddressMap::new(vec![
            periph(0x1000, 0x100, 1, "periphA"),
            periph(0x2000, 0x100, 2, "periphB"),
        ])
        .unwrap();

        assert_eq!(map.region_containing(0x2010).map(|r| r.id), Some(2));
        assert!(map.region_containing(0x1800).is_none());
    }

    #[test]
    fn test_find_overlap() {
        let disjoint = AddressMap::new(vec![
            periph(0x1000, 0x100, 1, "periphA"),
            periph(0x1100, 0x100, 2, "periphB"),
        ])
        .unwrap();
        assert!(disjoint.find_overlap().is_none());

        let overlapping = AddressMap::new(vec![
            periph(0x1000, 0x100, 1, "periphA"),
            periph(0x3000, 0x100, 3, "periphC"),
            periph(0x10F0, 0x100, 2, "periphB"),
        ])
        .unwrap();
        let (a, b) = overlapping.find_overlap().unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[test]
    fn test_from_json() {
        let map = AddressMap::from_json_str(
            r#"[
                { "base": 4096, "size": 256, "id": 1, "path": "nmi_system.periphA.mem" },
                { "base": 8192, "size": 4, "id": 2, "path": "nmi_system.periphB.mem" }
            ]"#,
        )
        .unwrap();

        assert_eq!(map.region_count(), 2);
        assert_eq!(map.regions()[1], periph(0x2000, 4, 2, "nmi_system.periphB.mem"));
    }

    #[test]
    fn test_json_missing_path_is_a_configuration_error() {
        let err = AddressMap::from_json_str(r#"[{ "base": 4096, "size": 256, "id": 1 }]"#)
            .unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(_)));
    }

    #[test]
    fn test_json_wrong_type_is_a_configuration_error() {
        let err = AddressMap::from_json_str(
            r#"[{ "base": "0x1000", "size": 256, "id": 1, "path": "periphA" }]"#,
        )
        .unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(_)));
    }

    #[test]
    fn test_unreadable_file_is_an_io_error() {
        let err = AddressMap::load(Utf8Path::new("maps/does_not_exist.json")).unwrap_err();
        assert!(matches!(err, HarnessError::Io(_)));
    }
}
