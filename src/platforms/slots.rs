//! ESPN NBA lineup slot IDs.
//!
//! Two numberings are in play. Transaction bodies use the write table
//! (`slot_id`, bench 9, IR 12). League reads report `lineupSlotId` in the
//! read numbering (`read_slot_name`, UTIL 11, bench 12, IR 13). Leagues can be
//! configured differently; capture a real lineup change to confirm before
//! relying on the write table.

/// Slot ID used for any name that is not in the table.
pub const BENCH_SLOT_ID: u16 = 9;
pub const IR_SLOT_ID: u16 = 12;

/// Bench aliases.
pub const BENCH_SLOTS: &[&str] = &["BE", "BN"];
/// Injured-reserve aliases.
pub const IR_SLOTS: &[&str] = &["IR", "IL"];

/// Name → ID. The first name listed for an ID is its canonical name.
const SLOT_IDS: &[(&str, u16)] = &[
    ("PG", 0),
    ("SG", 1),
    ("SF", 2),
    ("PF", 3),
    ("C", 4),
    ("G", 5), // guard flex
    ("F", 6), // forward flex
    ("UTIL", 8),
    ("BE", BENCH_SLOT_ID),
    ("BN", BENCH_SLOT_ID),
    ("IR", IR_SLOT_ID),
    ("IL", IR_SLOT_ID),
];

/// Numeric slot ID for a slot name (case-insensitive). Unknown names map to bench.
pub fn slot_id(name: &str) -> u16 {
    let upper = name.to_uppercase();
    SLOT_IDS
        .iter()
        .find(|(slot, _)| *slot == upper)
        .map(|(_, id)| *id)
        .unwrap_or(BENCH_SLOT_ID)
}

/// Slot names as reported by league reads, indexed by `lineupSlotId`.
const READ_SLOT_NAMES: &[&str] = &[
    "PG", "SG", "SF", "PF", "C", "G", "F", "SG/SF", "G/F", "PF/C", "F/C", "UTIL", "BE", "IR",
];

/// Slot name for a `lineupSlotId` from a league read. Unknown IDs read as bench.
pub fn read_slot_name(id: u16) -> &'static str {
    READ_SLOT_NAMES.get(usize::from(id)).copied().unwrap_or("BE")
}

pub fn is_bench(slot: &str) -> bool {
    let upper = slot.to_uppercase();
    BENCH_SLOTS.contains(&upper.as_str())
}

pub fn is_injured_reserve(slot: &str) -> bool {
    let upper = slot.to_uppercase();
    IR_SLOTS.contains(&upper.as_str())
}
