//! Lock-less transposition table. Entries store `key ^ data`, so a probe
//! that recovers the probed key proves key and data were written together
//! even without locks; a torn write simply fails the match.

use crate::eval::{add_distance_to_mate, remove_distance_from_mate, Eval};
use crate::moves::types::Move;

/// Kind of bound an entry's evaluation represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntryKind {
    Exact = 0,
    LowerBound = 1,
    UpperBound = 2,
}

impl EntryKind {
    #[inline(always)]
    fn from_bits(bits: u64) -> Self {
        match bits {
            0 => EntryKind::Exact,
            1 => EntryKind::LowerBound,
            _ => EntryKind::UpperBound,
        }
    }
}

// Data word layout:
//   move       26 bits @ 0
//   generation  8 bits @ 26
//   kind        2 bits @ 34
//   depth      12 bits @ 36
//   eval       16 bits @ 48, biased by 1 << 15 to carry the signed range
const MOVE_SHIFT: u64 = 0;
const GENERATION_SHIFT: u64 = 26;
const KIND_SHIFT: u64 = 34;
const DEPTH_SHIFT: u64 = 36;
const EVAL_SHIFT: u64 = 48;

const MOVE_MASK: u64 = (1 << 26) - 1;
const GENERATION_MASK: u64 = 0xFF;
const KIND_MASK: u64 = 0x3;
const DEPTH_MASK: u64 = 0xFFF;
const EVAL_MASK: u64 = 0xFFFF;
const EVAL_BIAS: i64 = 1 << 15;

/// One 16-byte packed entry.
#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    key: u64,
    data: u64,
}

impl Entry {
    fn new(
        key: u64,
        mv: Move,
        generation: u8,
        kind: EntryKind,
        depth: u16,
        distance: u32,
        eval: Eval,
    ) -> Self {
        let node_eval = remove_distance_from_mate(eval, distance);
        let biased = (node_eval as i64 + EVAL_BIAS) as u64;
        debug_assert!(biased < 1 << 16);
        debug_assert!((depth as u64) < 1 << 12);

        let data = ((mv.bits() as u64) & MOVE_MASK) << MOVE_SHIFT
            | (generation as u64) << GENERATION_SHIFT
            | (kind as u64) << KIND_SHIFT
            | (depth as u64) << DEPTH_SHIFT
            | biased << EVAL_SHIFT;

        Entry {
            key: key ^ data,
            data,
        }
    }

    /// The true key, recovered by undoing the fold.
    #[inline(always)]
    fn key(&self) -> u64 {
        self.key ^ self.data
    }

    #[inline(always)]
    fn mv(&self) -> Move {
        Move::from_bits((self.data >> MOVE_SHIFT & MOVE_MASK) as u32)
    }

    #[inline(always)]
    fn generation(&self) -> u8 {
        (self.data >> GENERATION_SHIFT & GENERATION_MASK) as u8
    }

    #[inline(always)]
    fn kind(&self) -> EntryKind {
        EntryKind::from_bits(self.data >> KIND_SHIFT & KIND_MASK)
    }

    #[inline(always)]
    fn depth(&self) -> u16 {
        (self.data >> DEPTH_SHIFT & DEPTH_MASK) as u16
    }

    #[inline(always)]
    fn eval(&self, distance: u32) -> Eval {
        let node_eval = ((self.data >> EVAL_SHIFT & EVAL_MASK) as i64 - EVAL_BIAS) as Eval;
        add_distance_to_mate(node_eval, distance)
    }
}

/// A cache line holding a depth-preferred slot and an always-replace slot.
#[repr(align(64))]
#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    depth_preferred: Entry,
    always_replace: Entry,
}

impl Bucket {
    #[inline]
    fn find(&self, key: u64) -> Option<&Entry> {
        if self.always_replace.key() == key {
            return Some(&self.always_replace);
        }
        if self.depth_preferred.key() == key {
            return Some(&self.depth_preferred);
        }
        None
    }

    #[inline]
    fn insert(&mut self, entry: Entry, key: u64, generation: u8, depth: u16) {
        // The depth-preferred slot is taken by a deeper same-generation
        // entry; anything else yields to the new data.
        if self.always_replace.key() != key
            && (generation != self.depth_preferred.generation()
                || self.depth_preferred.depth() <= depth)
        {
            self.depth_preferred = entry;
        } else {
            self.always_replace = entry;
        }
    }
}

/// What a successful probe exposes to the search.
#[derive(Debug, Clone, Copy)]
pub struct TtHit {
    pub mv: Move,
    pub kind: EntryKind,
    pub depth: u16,
    /// Already rebased to the probing node's distance from the root.
    pub eval: Eval,
}

pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    mask: usize,
    generation: u8,
}

impl TranspositionTable {
    /// Allocate a table of at least `size_mb` megabytes, rounded up to a
    /// power of two of bytes.
    pub fn new(size_mb: usize) -> Self {
        let bytes = (size_mb.max(1) * 1024 * 1024).next_power_of_two();
        let num_buckets = bytes / std::mem::size_of::<Bucket>();
        TranspositionTable {
            buckets: vec![Bucket::default(); num_buckets],
            mask: num_buckets - 1,
            generation: 0,
        }
    }

    #[inline(always)]
    fn bucket_of(&self, key: u64) -> usize {
        key as usize & self.mask
    }

    /// Called once per outer search; lets replacement prefer fresh data.
    pub fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        self.buckets.fill(Bucket::default());
        self.generation = 0;
    }

    pub fn probe(&self, key: u64, distance: u32) -> Option<TtHit> {
        let bucket = &self.buckets[self.bucket_of(key)];
        bucket.find(key).map(|entry| TtHit {
            mv: entry.mv(),
            kind: entry.kind(),
            depth: entry.depth(),
            eval: entry.eval(distance),
        })
    }

    pub fn insert(
        &mut self,
        key: u64,
        mv: Move,
        kind: EntryKind,
        depth: u16,
        distance: u32,
        eval: Eval,
    ) {
        let generation = self.generation;
        let entry = Entry::new(key, mv, generation, kind, depth, distance, eval);
        let index = self.bucket_of(key);
        self.buckets[index].insert(entry, key, generation, depth);
    }

    /// Thousandths of the sampled buckets holding a current-generation
    /// entry, for `info hashfull`.
    pub fn hashfull_permill(&self) -> u32 {
        let sample = self.buckets.len().min(1000);
        let mut used = 0;
        for bucket in &self.buckets[..sample] {
            if bucket.depth_preferred.data != 0
                && bucket.depth_preferred.generation() == self.generation
            {
                used += 1;
            }
        }
        (used * 1000 / sample as u32).min(1000)
    }
}
