//! SOTDMA slot scheduler
//!
//! A 60 s frame holds 2250 slots of 26.67 ms. Every vessel gets one slot
//! per frame, seeded by an FNV-1a hash of its MMSI and resolved by linear
//! probing, so two stations never share a slot.
//!
//! ```text
//! slot = fnv1a(mmsi.to_be_bytes()) % 2250, then +1 (mod 2250) until free
//! ```
//!
//! [`SlotScheduler::slots_due`] tracks the last slot it reported, so a poll
//! loop that wakes late still reports every slot it passed over.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{SimError, SimResult};

/// Slots in one SOTDMA frame
pub const SLOTS_PER_FRAME: usize = 2250;

/// Frame length in seconds
pub const FRAME_SECONDS: f64 = 60.0;

/// Slot length in seconds (26.67 ms)
pub const SLOT_SECONDS: f64 = FRAME_SECONDS / SLOTS_PER_FRAME as f64;

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over the MMSI's big-endian bytes
pub fn fnv1a_mmsi(mmsi: u32) -> u32 {
    mmsi.to_be_bytes()
        .iter()
        .fold(FNV_OFFSET, |h, &b| (h ^ b as u32).wrapping_mul(FNV_PRIME))
}

/// Preferred slot before collision resolution
pub fn home_slot(mmsi: u32) -> u16 {
    (fnv1a_mmsi(mmsi) % SLOTS_PER_FRAME as u32) as u16
}

/// MMSI → slot map for one active vessel set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotAssignment {
    by_mmsi: HashMap<u32, u16>,
    by_slot: Vec<Option<u32>>,
}

impl SlotAssignment {
    pub fn slot_of(&self, mmsi: u32) -> Option<u16> {
        self.by_mmsi.get(&mmsi).copied()
    }

    pub fn occupant(&self, slot: u16) -> Option<u32> {
        self.by_slot.get(slot as usize).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_mmsi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_mmsi.is_empty()
    }

    /// `(mmsi, slot)` pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        self.by_slot
            .iter()
            .enumerate()
            .filter_map(|(slot, m)| m.map(|mmsi| (mmsi, slot as u16)))
    }
}

/// Assign slots to vessels in iteration order.
///
/// Repeated MMSIs are assigned once.
pub fn assign_slots(mmsis: &[u32]) -> SimResult<SlotAssignment> {
    let unique: HashSet<u32> = mmsis.iter().copied().collect();
    if unique.len() > SLOTS_PER_FRAME {
        return Err(SimError::SlotExhaustion {
            vessels: unique.len(),
            slots: SLOTS_PER_FRAME,
        });
    }

    let mut assignment = SlotAssignment {
        by_mmsi: HashMap::with_capacity(unique.len()),
        by_slot: vec![None; SLOTS_PER_FRAME],
    };
    for &mmsi in mmsis {
        if assignment.by_mmsi.contains_key(&mmsi) {
            continue;
        }
        let mut slot = home_slot(mmsi) as usize;
        while assignment.by_slot[slot].is_some() {
            slot = (slot + 1) % SLOTS_PER_FRAME;
        }
        assignment.by_slot[slot] = Some(mmsi);
        assignment.by_mmsi.insert(mmsi, slot as u16);
    }
    Ok(assignment)
}

/// Index of the frame containing `time_s`
pub fn frame_index(current_time: f64, frame_start_time: f64) -> u64 {
    let elapsed = current_time - frame_start_time;
    if elapsed.is_nan() || elapsed < 0.0 {
        return 0;
    }
    (elapsed / FRAME_SECONDS).floor() as u64
}

/// Slot within its frame that contains `time_s`
pub fn current_slot(current_time: f64, frame_start_time: f64) -> u16 {
    let elapsed = current_time - frame_start_time;
    if elapsed.is_nan() || elapsed < 0.0 {
        return 0;
    }
    let in_frame = elapsed.rem_euclid(FRAME_SECONDS);
    ((in_frame / SLOT_SECONDS).floor() as usize).min(SLOTS_PER_FRAME - 1) as u16
}

fn absolute_slot(current_time: f64, frame_start_time: f64) -> u64 {
    frame_index(current_time, frame_start_time) * SLOTS_PER_FRAME as u64
        + current_slot(current_time, frame_start_time) as u64
}

/// Slot assignment plus the polling cursor
#[derive(Debug, Clone, Default)]
pub struct SlotScheduler {
    assignment: SlotAssignment,
    /// Mmsis in the order the assignment was computed from
    active: Vec<u32>,
    /// First absolute slot (frame * 2250 + slot) not yet reported
    next_absolute: Option<u64>,
}

impl SlotScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute slots for a new active set.
    ///
    /// A set equal to the current one keeps the existing assignment.
    pub fn assign(&mut self, mmsis: &[u32]) -> SimResult<&SlotAssignment> {
        if mmsis != self.active.as_slice() {
            self.assignment = assign_slots(mmsis)?;
            self.active = mmsis.to_vec();
            debug!(vessels = self.assignment.len(), "slots reassigned");
        }
        Ok(&self.assignment)
    }

    pub fn assignment(&self) -> &SlotAssignment {
        &self.assignment
    }

    pub fn slot_of(&self, mmsi: u32) -> Option<u16> {
        self.assignment.slot_of(mmsi)
    }

    pub fn frame_index(&self, current_time: f64, frame_start_time: f64) -> u64 {
        frame_index(current_time, frame_start_time)
    }

    pub fn current_slot(&self, current_time: f64, frame_start_time: f64) -> u16 {
        current_slot(current_time, frame_start_time)
    }

    /// Forget the polling cursor, e.g. after the clock was rewound.
    pub fn reset_cursor(&mut self) {
        self.next_absolute = None;
    }

    /// Start polling from the slot containing `time`, so a later call
    /// reports that slot too. Without priming the first call only reports
    /// the slot it lands in.
    pub fn prime(&mut self, time: f64, frame_start_time: f64) {
        self.next_absolute = Some(absolute_slot(time, frame_start_time));
    }

    /// Vessels whose slot is the current one or was passed since the
    /// previous call, in slot order.
    pub fn slots_due(&mut self, current_time: f64, frame_start_time: f64) -> Vec<u32> {
        let elapsed = current_time - frame_start_time;
        if elapsed.is_nan() || elapsed < 0.0 {
            return Vec::new();
        }
        let slots = SLOTS_PER_FRAME as u64;
        let now = absolute_slot(current_time, frame_start_time);

        let first = self.next_absolute.unwrap_or(now);
        if now < first {
            return Vec::new();
        }
        self.next_absolute = Some(now + 1);

        // A whole frame or more was skipped: everyone is due exactly once
        if now - first + 1 >= slots {
            return self.assignment.iter().map(|(mmsi, _)| mmsi).collect();
        }

        let start = (first % slots) as usize;
        let end = (now % slots) as usize;
        let wanted = |slot: usize| {
            if start <= end {
                (start..=end).contains(&slot)
            } else {
                slot >= start || slot <= end
            }
        };
        // Report in time order, so a wrapped window lists the old frame first
        let mut due: Vec<(u64, u32)> = self
            .assignment
            .iter()
            .filter(|&(_, slot)| wanted(slot as usize))
            .map(|(mmsi, slot)| {
                let order = if (slot as usize) >= start { 0 } else { slots };
                (order + slot as u64, mmsi)
            })
            .collect();
        due.sort_unstable();
        due.into_iter().map(|(_, mmsi)| mmsi).collect()
    }
}
