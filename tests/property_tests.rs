//! Property-based tests for hyprstrap
//!
//! These tests verify:
//! - the 30 GB swap threshold
//! - partition layout contiguity
//! - partition device naming
//! - the shape of a planned install for any disk size

use std::path::Path;

use proptest::prelude::*;

use hyprstrap::layout::{Boundary, PartitionLayout, partition_path, swap_size_gb};
use hyprstrap::types::{FailurePolicy, Filesystem, PartitionRole};
use hyprstrap::{InstallConfig, Recorded, plan};

// =============================================================================
// Swap sizing
// =============================================================================

proptest! {
    /// Below 30 GB the swap partition is 4 GB
    #[test]
    fn small_devices_get_four_gb_swap(size in 0.0f64..30.0) {
        prop_assert_eq!(swap_size_gb(size), 4);
    }

    /// At or above 30 GB the swap partition is 8 GB
    #[test]
    fn large_devices_get_eight_gb_swap(size in 30.0f64..100_000.0) {
        prop_assert_eq!(swap_size_gb(size), 8);
    }
}

// =============================================================================
// Layout invariants
// =============================================================================

proptest! {
    /// Each partition starts where the previous one ends; root fills the disk.
    #[test]
    fn layout_is_contiguous(size in 0.0f64..100_000.0) {
        let layout = PartitionLayout::for_size(size);
        let parts = layout.partitions();
        prop_assert_eq!(parts.len(), 3);
        prop_assert_eq!(parts[0].start, Boundary::MiB(1));
        prop_assert_eq!(parts[0].end, parts[1].start);
        prop_assert_eq!(parts[1].end, parts[2].start);
        prop_assert_eq!(parts[2].end, Boundary::Percent(100));
        prop_assert_eq!(parts[1].end, Boundary::GiB(1 + layout.swap_gb()));
    }

    /// Partition roles appear in index order with their filesystems.
    #[test]
    fn layout_roles_in_order(size in 0.0f64..100_000.0) {
        let layout = PartitionLayout::for_size(size);
        let roles: Vec<PartitionRole> = layout.partitions().iter().map(|p| p.role).collect();
        prop_assert_eq!(roles, vec![PartitionRole::Efi, PartitionRole::Swap, PartitionRole::Root]);
        prop_assert_eq!(layout.partition(PartitionRole::Efi).role.filesystem(), Filesystem::Fat32);
        prop_assert_eq!(layout.partition(PartitionRole::Root).role.filesystem(), Filesystem::Ext4);
    }
}

// =============================================================================
// Partition naming
// =============================================================================

proptest! {
    /// Letter-terminated disks get the index appended directly
    #[test]
    fn sd_style_names(letter in "[a-z]", index in 1u8..=3) {
        let device = format!("/dev/sd{letter}");
        let path = partition_path(Path::new(&device), index);
        prop_assert_eq!(path.to_string_lossy().to_string(), format!("{device}{index}"));
    }

    /// Digit-terminated disks get a `p` separator
    #[test]
    fn nvme_style_names(ctrl in 0u8..8, ns in 1u8..4, index in 1u8..=3) {
        let device = format!("/dev/nvme{ctrl}n{ns}");
        let path = partition_path(Path::new(&device), index);
        prop_assert_eq!(path.to_string_lossy().to_string(), format!("{device}p{index}"));
    }
}

// =============================================================================
// Planned installs
// =============================================================================

fn policy_strategy() -> impl Strategy<Value = FailurePolicy> {
    prop_oneof![Just(FailurePolicy::Continue), Just(FailurePolicy::Halt)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A plan always creates three partitions and ends with the theme.
    #[test]
    fn plan_shape_is_stable(size_gb in 1u32..10_000, policy in policy_strategy()) {
        let size = f64::from(size_gb);
        let config = InstallConfig { failure_policy: policy, ..InstallConfig::default() };
        let log = plan(Path::new("/dev/sda"), size, config).expect("plan should succeed");

        let rendered: Vec<String> = log.iter().map(|r| r.to_string()).collect();
        let mkparts = rendered.iter().filter(|c| c.contains("mkpart primary")).count();
        prop_assert_eq!(mkparts, 3);

        let swap_end = format!("1GiB {}GiB", 1 + swap_size_gb(size));
        prop_assert!(rendered.iter().any(|c| c.ends_with(&swap_end)));

        match log.last() {
            Some(Recorded::Command(last)) => prop_assert!(last.to_string().contains(".bashrc")),
            other => prop_assert!(false, "unexpected last entry {:?}", other),
        }
    }
}
