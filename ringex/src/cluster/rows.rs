use crate::types::{Rank, Value};

/// Row of `world_size` pseudo-random values in `[1, world_size²]`.
///
/// The generator state is a hash of `(seed, rank)`, so peers sharing a seed
/// (zero included) still produce different rows. Deterministic for a given
/// `(rank, world_size, seed)`.
pub fn random_row(rank: Rank, world_size: u32, seed: u64) -> Vec<Value> {
    let limit = (u64::from(world_size) * u64::from(world_size)).clamp(1, i32::MAX as u64);
    let mut state = row_seed(rank, seed);
    (0..world_size)
        .map(|_| {
            // LCG step; the high bits have the longest period.
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % limit) as Value + 1
        })
        .collect()
}

/// FNV-1a over the seed and rank bytes.
fn row_seed(rank: Rank, seed: u64) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in seed.to_le_bytes().into_iter().chain(rank.to_le_bytes()) {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

/// `Rank r: a b c ` (trailing space included).
pub fn format_row(rank: Rank, row: &[Value]) -> String {
    let mut out = format!("Rank {rank}: ");
    for v in row {
        out.push_str(&v.to_string());
        out.push(' ');
    }
    out
}

/// A pair `(i, j)` where `outputs[j][i] != inputs[i][j]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub origin: Rank,
    pub dest: Rank,
    pub expected: Option<Value>,
    pub actual: Option<Value>,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rank {} holds {:?} from rank {}, expected {:?}",
            self.dest, self.actual, self.origin, self.expected
        )
    }
}

/// Check that every output row is the corresponding input column:
/// `outputs[j][i] == inputs[i][j]` for all `i, j`.
pub fn verify_exchange(inputs: &[Vec<Value>], outputs: &[Vec<Value>]) -> Result<(), Mismatch> {
    let n = inputs.len().max(outputs.len());
    for dest in 0..n {
        for origin in 0..n {
            let expected = inputs.get(origin).and_then(|row| row.get(dest)).copied();
            let actual = outputs.get(dest).and_then(|row| row.get(origin)).copied();
            if expected.is_none() || expected != actual {
                return Err(Mismatch {
                    origin: origin as Rank,
                    dest: dest as Rank,
                    expected,
                    actual,
                });
            }
        }
    }
    Ok(())
}
