//! Compiled-in table of known AT32 parts
//!
//! Entries are kept in the order the vendor data lists them. Several part
//! numbers share an identifier (package and temperature-grade aliases), so
//! lookups must walk the table front to back and stop at the first match.

use super::types::DeviceRecord;

/// Known devices, searched in order
pub static KNOWN_DEVICES: &[DeviceRecord] = &[
    DeviceRecord::new(0xF005_0340, 1024, 2048, "AR8F403CGT6-A"),
    DeviceRecord::new(0xF005_0340, 1024, 2048, "AR8F403CGT6"),
    DeviceRecord::new(0x7005_0242, 256, 2048, "AT32F403ACCT7"),
    DeviceRecord::new(0x7005_0243, 256, 2048, "AT32F403ACCU7"),
    DeviceRecord::new(0x7005_02CF, 512, 2048, "AT32F403ACET7"),
    DeviceRecord::new(0x7005_02D0, 512, 2048, "AT32F403ACEU7"),
    DeviceRecord::new(0x7005_0346, 1024, 2048, "AT32F403ACGT7"),
    DeviceRecord::new(0x7005_0347, 1024, 2048, "AT32F403ACGU7"),
    DeviceRecord::new(0x7005_0241, 256, 2048, "AT32F403ARCT7"),
    DeviceRecord::new(0x7005_02CE, 512, 2048, "AT32F403ARET7"),
    DeviceRecord::new(0x7005_0345, 1024, 2048, "AT32F403ARGT7"),
    DeviceRecord::new(0x7005_0240, 256, 2048, "AT32F403AVCT7"),
    DeviceRecord::new(0x7005_02CD, 512, 2048, "AT32F403AVET7"),
    DeviceRecord::new(0x7005_0344, 1024, 2048, "AT32F403AVGT7"),
    DeviceRecord::new(0xF005_0355, 1024, 2048, "AT32F403AVGW"),
    DeviceRecord::new(0x7003_01CF, 128, 1024, "AT32F403CBT6"),
    DeviceRecord::new(0x7005_0243, 256, 2048, "AT32F403CCT6"),
    DeviceRecord::new(0x7005_024E, 256, 2048, "AT32F403CCU6"),
    DeviceRecord::new(0x7005_02CB, 512, 2048, "AT32F403CET6"),
    DeviceRecord::new(0x7005_02CD, 512, 2048, "AT32F403CEU6"),
    DeviceRecord::new(0x7005_0347, 1024, 2048, "AT32F403CGT6"),
    DeviceRecord::new(0x7005_034C, 1024, 2048, "AT32F403CGU6"),
    DeviceRecord::new(0x7005_0242, 256, 2048, "AT32F403RCT6"),
    DeviceRecord::new(0x7005_02CA, 512, 2048, "AT32F403RET6"),
    DeviceRecord::new(0x7005_0346, 1024, 2048, "AT32F403RGT6"),
    DeviceRecord::new(0x7005_0241, 256, 2048, "AT32F403VCT6"),
    DeviceRecord::new(0x7005_02C9, 512, 2048, "AT32F403VET6"),
    DeviceRecord::new(0x7005_0345, 1024, 2048, "AT32F403VGT6"),
    DeviceRecord::new(0x7005_0240, 256, 2048, "AT32F403ZCT6"),
    DeviceRecord::new(0x7005_02C8, 512, 2048, "AT32F403ZET6"),
    DeviceRecord::new(0x7005_0344, 1024, 2048, "AT32F403ZGT6"),
    DeviceRecord::new(0x7005_0254, 256, 2048, "AT32F407AVCT7"),
    DeviceRecord::new(0x7005_0353, 1024, 2048, "AT32F407AVGT7"),
    DeviceRecord::new(0x7005_024A, 256, 2048, "AT32F407RCT7"),
    DeviceRecord::new(0x7005_02D2, 512, 2048, "AT32F407RET7"),
    DeviceRecord::new(0x7005_034C, 1024, 2048, "AT32F407RGT7"),
    DeviceRecord::new(0x7005_0249, 256, 2048, "AT32F407VCT7"),
    DeviceRecord::new(0x7005_02D1, 512, 2048, "AT32F407VET7"),
    DeviceRecord::new(0x7005_034B, 1024, 2048, "AT32F407VGT7"),
    DeviceRecord::new(0x7003_0106, 64, 1024, "AT32F413C8T7"),
    DeviceRecord::new(0x7003_01C3, 128, 1024, "AT32F413CBT7"),
    DeviceRecord::new(0x7003_01CA, 128, 1024, "AT32F413CBU7"),
    DeviceRecord::new(0x7003_0242, 256, 2048, "AT32F413CCT7"),
    DeviceRecord::new(0x7003_0247, 256, 2048, "AT32F413CCU7"),
    DeviceRecord::new(0x7003_01C5, 128, 1024, "AT32F413KBU7-4"),
    DeviceRecord::new(0x7003_0244, 256, 2048, "AT32F413KCU7-4"),
    DeviceRecord::new(0x7003_01C1, 128, 1024, "AT32F413RBT7"),
    DeviceRecord::new(0x7003_0240, 256, 2048, "AT32F413RCT7"),
    DeviceRecord::new(0x7003_01CB, 128, 1024, "AT32F413TBU7"),
    DeviceRecord::new(0x7003_0109, 64, 1024, "AT32F415C8T7"),
    DeviceRecord::new(0x7003_01C5, 128, 1024, "AT32F415CBT7"),
    DeviceRecord::new(0x7003_01CD, 128, 1024, "AT32F415CBU7"),
    DeviceRecord::new(0x7003_0241, 256, 2048, "AT32F415CCT7"),
    DeviceRecord::new(0x7003_024C, 256, 2048, "AT32F415CCU7"),
    DeviceRecord::new(0x7003_010A, 64, 1024, "AT32F415K8U7-4"),
    DeviceRecord::new(0x7003_01C6, 128, 1024, "AT32F415KBU7-4"),
    DeviceRecord::new(0x7003_0242, 256, 2048, "AT32F415KCU7-4"),
    DeviceRecord::new(0x7003_010B, 64, 1024, "AT32F415R8T7-7"),
    DeviceRecord::new(0x7003_0108, 64, 1024, "AT32F415R8T7"),
    DeviceRecord::new(0x7003_01C7, 128, 1024, "AT32F415RBT7-7"),
    DeviceRecord::new(0x7003_01C4, 128, 1024, "AT32F415RBT7"),
    DeviceRecord::new(0x7003_01CF, 128, 1024, "AT32F415RBW"),
    DeviceRecord::new(0x7003_0243, 256, 2048, "AT32F415RCT7-7"),
    DeviceRecord::new(0x7003_0240, 256, 2048, "AT32F415RCT7"),
    DeviceRecord::new(0x7003_024E, 256, 2048, "AT32F415RCW"),
    DeviceRecord::new(0x5001_000C, 16, 1024, "AT32F421C4T7"),
    DeviceRecord::new(0x5002_0086, 32, 1024, "AT32F421C6T7"),
    DeviceRecord::new(0x5002_0100, 64, 1024, "AT32F421C8T7"),
    DeviceRecord::new(0xD002_0100, 64, 1024, "AT32F421C8W-YY"),
    DeviceRecord::new(0x5002_0117, 64, 1024, "AT32F421C8W"),
    DeviceRecord::new(0x5001_0011, 16, 1024, "AT32F421F4P7"),
    DeviceRecord::new(0x5001_0010, 16, 1024, "AT32F421F4U7"),
    DeviceRecord::new(0x5002_008B, 32, 1024, "AT32F421F6P7"),
    DeviceRecord::new(0x5002_008A, 32, 1024, "AT32F421F6U7"),
    DeviceRecord::new(0x5002_0105, 64, 1024, "AT32F421F8P7"),
    DeviceRecord::new(0x5002_0104, 64, 1024, "AT32F421F8U7"),
    DeviceRecord::new(0x5001_0014, 16, 1024, "AT32F421G4U7"),
    DeviceRecord::new(0x5002_0093, 32, 1024, "AT32F421G6U7"),
    DeviceRecord::new(0x5002_0112, 64, 1024, "AT32F421G8U7"),
    DeviceRecord::new(0x5001_000D, 16, 1024, "AT32F421K4T7"),
    DeviceRecord::new(0x5001_000F, 16, 1024, "AT32F421K4U7-4"),
    DeviceRecord::new(0x5001_000E, 16, 1024, "AT32F421K4U7"),
    DeviceRecord::new(0x5002_0087, 32, 1024, "AT32F421K6T7"),
    DeviceRecord::new(0x5002_0089, 32, 1024, "AT32F421K6U7-4"),
    DeviceRecord::new(0x5002_0088, 32, 1024, "AT32F421K6U7"),
    DeviceRecord::new(0x5002_0101, 64, 1024, "AT32F421K8T7"),
    DeviceRecord::new(0x5002_0103, 64, 1024, "AT32F421K8U7-4"),
    DeviceRecord::new(0x5002_0102, 64, 1024, "AT32F421K8U7"),
    DeviceRecord::new(0x5001_0016, 16, 1024, "AT32F421PF4P7"),
    DeviceRecord::new(0x5002_0115, 64, 1024, "AT32F421PF8P7"),
    DeviceRecord::new(0x7003_210B, 64, 1024, "AT32F423C8T7"),
    DeviceRecord::new(0x7003_210E, 64, 1024, "AT32F423C8U7"),
    DeviceRecord::new(0x700A_21CA, 128, 1024, "AT32F423CBT7"),
    DeviceRecord::new(0x700A_21CD, 128, 1024, "AT32F423CBU7"),
    DeviceRecord::new(0x700A_3249, 256, 2048, "AT32F423CCT7"),
    DeviceRecord::new(0x700A_324C, 256, 2048, "AT32F423CCU7"),
    DeviceRecord::new(0x7003_2115, 64, 1024, "AT32F423K8U7-4"),
    DeviceRecord::new(0x700A_21D4, 128, 1024, "AT32F423KBU7-4"),
    DeviceRecord::new(0x700A_3253, 256, 2048, "AT32F423KCU7-4"),
    DeviceRecord::new(0x7003_2108, 64, 1024, "AT32F423R8T7-7"),
    DeviceRecord::new(0x7003_2105, 64, 1024, "AT32F423R8T7"),
    DeviceRecord::new(0x700A_21C7, 128, 1024, "AT32F423RBT7-7"),
    DeviceRecord::new(0x700A_21C4, 128, 1024, "AT32F423RBT7"),
    DeviceRecord::new(0x700A_3246, 256, 2048, "AT32F423RCT7-7"),
    DeviceRecord::new(0x700A_3243, 256, 2048, "AT32F423RCT7"),
    DeviceRecord::new(0x7003_2112, 64, 1024, "AT32F423T8U7"),
    DeviceRecord::new(0x700A_21D1, 128, 1024, "AT32F423TBU7"),
    DeviceRecord::new(0x700A_3250, 256, 2048, "AT32F423TCU7"),
    DeviceRecord::new(0x7003_2102, 64, 1024, "AT32F423V8T7"),
    DeviceRecord::new(0x700A_21C1, 128, 1024, "AT32F423VBT7"),
    DeviceRecord::new(0x700A_3240, 256, 2048, "AT32F423VCT7"),
    DeviceRecord::new(0x5009_2087, 32, 1024, "AT32F425C6T7"),
    DeviceRecord::new(0x5009_208A, 32, 1024, "AT32F425C6U7"),
    DeviceRecord::new(0x5009_2106, 64, 1024, "AT32F425C8T7"),
    DeviceRecord::new(0x5009_2109, 64, 1024, "AT32F425C8U7"),
    DeviceRecord::new(0x5009_2093, 32, 1024, "AT32F425F6P7"),
    DeviceRecord::new(0x5009_2112, 64, 1024, "AT32F425F8P7"),
    DeviceRecord::new(0x5009_2096, 32, 1024, "AT32F425G6U7"),
    DeviceRecord::new(0x5009_2115, 64, 1024, "AT32F425G8U7"),
    DeviceRecord::new(0x5009_208D, 32, 1024, "AT32F425K6T7"),
    DeviceRecord::new(0x5009_2090, 32, 1024, "AT32F425K6U7-4"),
    DeviceRecord::new(0x5009_210C, 64, 1024, "AT32F425K8T7"),
    DeviceRecord::new(0x5009_210F, 64, 1024, "AT32F425K8U7-4"),
    DeviceRecord::new(0x5009_2084, 32, 1024, "AT32F425R6T7-7"),
    DeviceRecord::new(0x5009_2081, 32, 1024, "AT32F425R6T7"),
    DeviceRecord::new(0x5009_2103, 64, 1024, "AT32F425R8T7-7"),
    DeviceRecord::new(0x5009_2100, 64, 1024, "AT32F425R8T7"),
    DeviceRecord::new(0x7008_449A, 192, 4096, "AT32F435CCT7-W"),
    DeviceRecord::new(0x7008_324B, 256, 2048, "AT32F435CCT7"),
    DeviceRecord::new(0x7008_449D, 192, 4096, "AT32F435CCU7-W"),
    DeviceRecord::new(0x7008_324E, 256, 2048, "AT32F435CCU7"),
    DeviceRecord::new(0x7008_44D9, 960, 4096, "AT32F435CGT7-W"),
    DeviceRecord::new(0x7008_334A, 1024, 2048, "AT32F435CGT7"),
    DeviceRecord::new(0x7008_44DC, 960, 4096, "AT32F435CGU7-W"),
    DeviceRecord::new(0x7008_334D, 1024, 2048, "AT32F435CGU7"),
    DeviceRecord::new(0x7008_4558, 4032, 4096, "AT32F435CMT7-E"),
    DeviceRecord::new(0x7008_4549, 4032, 4096, "AT32F435CMT7"),
    DeviceRecord::new(0x7008_455B, 4032, 4096, "AT32F435CMU7-E"),
    DeviceRecord::new(0x7008_454C, 4032, 4096, "AT32F435CMU7"),
    DeviceRecord::new(0x7008_3248, 256, 2048, "AT32F435RCT7"),
    DeviceRecord::new(0x7008_3347, 1024, 2048, "AT32F435RGT7"),
    DeviceRecord::new(0x7008_4546, 4032, 4096, "AT32F435RMT7"),
    DeviceRecord::new(0x7008_3245, 256, 2048, "AT32F435VCT7"),
    DeviceRecord::new(0x7008_3344, 1024, 2048, "AT32F435VGT7"),
    DeviceRecord::new(0x7008_4543, 4032, 4096, "AT32F435VMT7"),
    DeviceRecord::new(0x7008_3242, 256, 2048, "AT32F435ZCT7"),
    DeviceRecord::new(0x7008_3341, 1024, 2048, "AT32F435ZGT7"),
    DeviceRecord::new(0x7008_4540, 4032, 4096, "AT32F435ZMT7"),
    DeviceRecord::new(0x7008_3257, 256, 2048, "AT32F437RCT7"),
    DeviceRecord::new(0x7008_3356, 1024, 2048, "AT32F437RGT7"),
    DeviceRecord::new(0x7008_4555, 4032, 4096, "AT32F437RMT7"),
    DeviceRecord::new(0x7008_3254, 256, 2048, "AT32F437VCT7"),
    DeviceRecord::new(0x7008_3353, 1024, 2048, "AT32F437VGT7"),
    DeviceRecord::new(0x7008_4552, 4032, 4096, "AT32F437VMT7"),
    DeviceRecord::new(0x7008_3251, 256, 2048, "AT32F437ZCT7"),
    DeviceRecord::new(0x7008_3350, 1024, 2048, "AT32F437ZGT7"),
    DeviceRecord::new(0x7008_454F, 4032, 4096, "AT32F437ZMT7"),
    DeviceRecord::new(0x7003_0109, 64, 1024, "AT32FEBKC8T7"),
    DeviceRecord::new(0x1001_2006, 16, 1024, "AT32L021C4T7"),
    DeviceRecord::new(0x1001_208D, 32, 1024, "AT32L021C6T7"),
    DeviceRecord::new(0x1001_2114, 64, 1024, "AT32L021C8T7"),
    DeviceRecord::new(0x1001_2001, 16, 1024, "AT32L021F4P7"),
    DeviceRecord::new(0x1001_2002, 16, 1024, "AT32L021F4U7"),
    DeviceRecord::new(0x1001_2088, 32, 1024, "AT32L021F6P7"),
    DeviceRecord::new(0x1001_2089, 32, 1024, "AT32L021F6U7"),
    DeviceRecord::new(0x1001_210F, 64, 1024, "AT32L021F8P7"),
    DeviceRecord::new(0x1001_2110, 64, 1024, "AT32L021F8U7"),
    DeviceRecord::new(0x1001_2000, 16, 1024, "AT32L021G4U7"),
    DeviceRecord::new(0x1001_2087, 32, 1024, "AT32L021G6U7"),
    DeviceRecord::new(0x1001_210E, 64, 1024, "AT32L021G8U7"),
    DeviceRecord::new(0x1001_2005, 16, 1024, "AT32L021K4T7"),
    DeviceRecord::new(0x1001_2003, 16, 1024, "AT32L021K4U7-4"),
    DeviceRecord::new(0x1001_2004, 16, 1024, "AT32L021K4U7"),
    DeviceRecord::new(0x1001_208C, 32, 1024, "AT32L021K6T7"),
    DeviceRecord::new(0x1001_208A, 32, 1024, "AT32L021K6U7-4"),
    DeviceRecord::new(0x1001_208B, 32, 1024, "AT32L021K6U7"),
    DeviceRecord::new(0x1001_2113, 64, 1024, "AT32L021K8T7"),
    DeviceRecord::new(0x1001_2111, 64, 1024, "AT32L021K8U7-4"),
    DeviceRecord::new(0x1001_2112, 64, 1024, "AT32L021K8U7"),
    DeviceRecord::new(0x7003_0250, 256, 2048, "AT32WB415CCU7-7"),
    DeviceRecord::new(0xF003_01C2, 128, 1024, "KC9060"),
];

/// Find the first device record with the given identifier
pub fn lookup(id: u32) -> Option<&'static DeviceRecord> {
    KNOWN_DEVICES.iter().find(|dev| dev.id == id)
}

/// Iterate over all known devices whose name contains `filter`
///
/// The match is case-insensitive on ASCII.
pub fn search(filter: &str) -> impl Iterator<Item = &'static DeviceRecord> + '_ {
    KNOWN_DEVICES
        .iter()
        .filter(move |dev| contains_ignore_ascii_case(dev.name, filter))
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins_for_aliases() {
        // AR8F403CGT6-A and AR8F403CGT6 share an identifier
        let dev = lookup(0xF005_0340).unwrap();
        assert_eq!(dev.name, "AR8F403CGT6-A");

        // AT32FEBKC8T7 is listed long after AT32F415C8T7
        let dev = lookup(0x7003_0109).unwrap();
        assert_eq!(dev.name, "AT32F415C8T7");
        assert_eq!(dev.flash_size_kb, 64);
        assert_eq!(dev.sector_size, 1024);
    }

    #[test]
    fn test_lookup_returns_first_of_every_duplicate() {
        for (i, dev) in KNOWN_DEVICES.iter().enumerate() {
            let first = KNOWN_DEVICES.iter().position(|d| d.id == dev.id).unwrap();
            let found = lookup(dev.id).unwrap();
            assert_eq!(found, &KNOWN_DEVICES[first]);
            assert!(first <= i);
        }
    }

    #[test]
    fn test_unknown_id() {
        assert!(lookup(0xDEAD_BEEF).is_none());
        assert!(lookup(0).is_none());
    }

    #[test]
    fn test_table_sanity() {
        for dev in KNOWN_DEVICES {
            assert_ne!(dev.id, 0);
            assert!(!dev.name.is_empty());
            assert!(matches!(dev.sector_size, 1024 | 2048 | 4096), "{}", dev.name);
            assert!(dev.flash_size_kb > 0);
        }
    }

    #[test]
    fn test_sector_count() {
        let dev = lookup(0x7003_0109).unwrap();
        assert_eq!(dev.flash_size(), 64 * 1024);
        assert_eq!(dev.sector_count(), 64);

        let dev = lookup(0x7008_4549).unwrap();
        assert_eq!(dev.sector_count(), 4032 / 4);
    }

    #[test]
    fn test_search() {
        assert!(search("f435cm").any(|d| d.name == "AT32F435CMT7"));
        assert_eq!(search("").count(), KNOWN_DEVICES.len());
        assert_eq!(search("nonexistent").count(), 0);
    }
}
