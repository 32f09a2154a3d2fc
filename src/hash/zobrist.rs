//! Zobrist key tables. Seeded with a fixed constant so position hashes are
//! identical across runs and across machines.

use once_cell::sync::OnceCell;
use rand::{rngs::StdRng, RngCore, SeedableRng};

const ZOBRIST_SEED: u64 = 0x9E37_79B9_AAAC_5C87;

pub struct ZobristKeys {
    /// [color][kind][square] with {White=0, Black=1} and {P,N,B,R,Q,K}={0..5}.
    pub piece: [[[u64; 64]; 6]; 2],
    /// XORed in iff black is to move.
    pub side_to_move: u64,
    /// Indexed by the full 4-bit castling-rights pattern.
    pub castling: [u64; 16],
    /// a..h => 0..7
    pub ep_file: [u64; 8],
}

/// Global keys, generated on first use.
pub fn zobrist_keys() -> &'static ZobristKeys {
    static KEYS: OnceCell<ZobristKeys> = OnceCell::new();
    KEYS.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

        // Zero keys would make distinct features cancel silently.
        let mut non_zero = |rng: &mut StdRng| {
            let mut v = rng.next_u64();
            while v == 0 {
                v = rng.next_u64();
            }
            v
        };

        let mut keys = ZobristKeys {
            piece: [[[0u64; 64]; 6]; 2],
            side_to_move: 0,
            castling: [0u64; 16],
            ep_file: [0u64; 8],
        };

        for color in 0..2 {
            for kind in 0..6 {
                for sq in 0..64 {
                    keys.piece[color][kind][sq] = non_zero(&mut rng);
                }
            }
        }

        // Pattern 0 (no rights) contributes nothing so the hash of a
        // rights-less position does not depend on the castling table.
        for pattern in 1..16 {
            keys.castling[pattern] = non_zero(&mut rng);
        }

        for file in 0..8 {
            keys.ep_file[file] = non_zero(&mut rng);
        }

        keys.side_to_move = non_zero(&mut rng);

        keys
    })
}
