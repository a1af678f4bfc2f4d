//! Volume-to-shard tables for the sharded CDN hosts.
//!
//! Both tables are ordered, contiguous from volume 0 and closed by an
//! unbounded last range. Boundaries are inclusive on both ends and must
//! match the backend bit-for-bit.

/// An inclusive range of volumes served by one shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardRange {
    /// First volume of the range.
    pub first: u64,
    /// Last volume of the range (`u64::MAX` for the catch-all range).
    pub last: u64,
    /// Two-digit shard suffix used in the host name.
    pub shard: &'static str,
}

impl ShardRange {
    const fn new(first: u64, last: u64, shard: &'static str) -> Self {
        Self { first, last, shard }
    }

    /// Whether `volume` falls inside this range.
    pub fn contains(&self, volume: u64) -> bool {
        self.first <= volume && volume <= self.last
    }
}

/// Shards of the `basket-NN` hosts serving product cards.
pub static BASKET_SHARDS: &[ShardRange] = &[
    ShardRange::new(0, 143, "01"),
    ShardRange::new(144, 287, "02"),
    ShardRange::new(288, 431, "03"),
    ShardRange::new(432, 719, "04"),
    ShardRange::new(720, 1007, "05"),
    ShardRange::new(1008, 1061, "06"),
    ShardRange::new(1062, 1115, "07"),
    ShardRange::new(1116, 1169, "08"),
    ShardRange::new(1170, 1313, "09"),
    ShardRange::new(1314, 1601, "10"),
    ShardRange::new(1602, 1655, "11"),
    ShardRange::new(1656, 1919, "12"),
    ShardRange::new(1920, 2045, "13"),
    ShardRange::new(2046, 2189, "14"),
    ShardRange::new(2190, 2405, "15"),
    ShardRange::new(2406, 2621, "16"),
    ShardRange::new(2622, 2837, "17"),
    ShardRange::new(2838, 3053, "18"),
    ShardRange::new(3054, 3269, "19"),
    ShardRange::new(3270, 3485, "20"),
    ShardRange::new(3486, 3701, "21"),
    ShardRange::new(3702, 3917, "22"),
    ShardRange::new(3918, 4133, "23"),
    ShardRange::new(4134, 4349, "24"),
    ShardRange::new(4350, 4565, "25"),
    ShardRange::new(4566, 4877, "26"),
    ShardRange::new(4878, 5189, "27"),
    ShardRange::new(5190, 5501, "28"),
    ShardRange::new(5502, 5813, "29"),
    ShardRange::new(5814, 6125, "30"),
    ShardRange::new(6126, 6437, "31"),
    ShardRange::new(6438, u64::MAX, "32"),
];

/// Shards of the `feedbackNN` hosts serving photo binaries.
pub static FEEDBACK_SHARDS: &[ShardRange] = &[
    ShardRange::new(0, 431, "01"),
    ShardRange::new(432, 863, "02"),
    ShardRange::new(864, 1199, "03"),
    ShardRange::new(1200, 1535, "04"),
    ShardRange::new(1536, 1919, "05"),
    ShardRange::new(1920, 2303, "06"),
    ShardRange::new(2304, 2687, "07"),
    ShardRange::new(2688, 3071, "08"),
    ShardRange::new(3072, 3455, "09"),
    ShardRange::new(3456, 3839, "10"),
    ShardRange::new(3840, u64::MAX, "11"),
];

/// Find the shard serving `volume`.
///
/// Binary search over the range ends; the catch-all last range guarantees a hit.
pub fn lookup(table: &'static [ShardRange], volume: u64) -> &'static str {
    let idx = table.partition_point(|range| range.last < volume);
    // The last range ends at u64::MAX, so idx is always in bounds for a
    // well-formed table. Fall back to the last shard anyway.
    table
        .get(idx)
        .or_else(|| table.last())
        .map(|range| range.shard)
        .unwrap_or("01")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_contiguous(table: &[ShardRange]) {
        assert_eq!(table[0].first, 0);
        for pair in table.windows(2) {
            assert_eq!(pair[0].last + 1, pair[1].first, "gap after {:?}", pair[0]);
        }
        assert_eq!(table.last().unwrap().last, u64::MAX);
    }

    #[test]
    fn test_tables_are_contiguous() {
        assert_contiguous(BASKET_SHARDS);
        assert_contiguous(FEEDBACK_SHARDS);
    }

    #[test]
    fn test_shard_suffixes_are_sequential() {
        for (i, range) in BASKET_SHARDS.iter().enumerate() {
            assert_eq!(range.shard, format!("{:02}", i + 1));
        }
        for (i, range) in FEEDBACK_SHARDS.iter().enumerate() {
            assert_eq!(range.shard, format!("{:02}", i + 1));
        }
    }

    #[test]
    fn test_lookup_inclusive_boundaries() {
        for table in [BASKET_SHARDS, FEEDBACK_SHARDS] {
            for range in table {
                assert_eq!(lookup(table, range.first), range.shard);
                assert_eq!(lookup(table, range.last), range.shard);
                if range.last != u64::MAX {
                    let mid = range.first + (range.last - range.first) / 2;
                    assert!(range.contains(mid));
                    assert_eq!(lookup(table, mid), range.shard);
                }
            }
        }
    }

    #[test]
    fn test_lookup_known_volumes() {
        assert_eq!(lookup(BASKET_SHARDS, 143), "01");
        assert_eq!(lookup(BASKET_SHARDS, 144), "02");
        assert_eq!(lookup(BASKET_SHARDS, 1241), "09");
        assert_eq!(lookup(BASKET_SHARDS, 6437), "31");
        assert_eq!(lookup(BASKET_SHARDS, 6438), "32");
        assert_eq!(lookup(BASKET_SHARDS, 1_000_000), "32");

        assert_eq!(lookup(FEEDBACK_SHARDS, 431), "01");
        assert_eq!(lookup(FEEDBACK_SHARDS, 432), "02");
        assert_eq!(lookup(FEEDBACK_SHARDS, 1241), "04");
        assert_eq!(lookup(FEEDBACK_SHARDS, 3839), "10");
        assert_eq!(lookup(FEEDBACK_SHARDS, 3840), "11");
        assert_eq!(lookup(FEEDBACK_SHARDS, u64::MAX), "11");
    }
}
