use crate::stream::Bit;
use crate::{Error, Result};

use super::MAX_SUCCESSIVE_ONES;

/// Insert a 0 after every run of [MAX_SUCCESSIVE_ONES] ones.
#[must_use]
pub fn stuff(bits: &[Bit]) -> Vec<Bit> {
    let mut out = Vec::with_capacity(bits.len() + bits.len() / MAX_SUCCESSIVE_ONES);
    let mut ones = 0;
    for bit in bits {
        out.push(*bit);
        if *bit == 1 {
            ones += 1;
            if ones == MAX_SUCCESSIVE_ONES {
                out.push(0);
                ones = 0;
            }
        } else {
            ones = 0;
        }
    }
    out
}

/// Remove the 0 following every run of [MAX_SUCCESSIVE_ONES] ones.
///
/// # Errors
/// [Error::Stuffing] at the first run of more than [MAX_SUCCESSIVE_ONES] ones, with
/// `offset` relative to `base`.
pub fn destuff(bits: &[Bit], base: usize) -> Result<Vec<Bit>> {
    let mut out = Vec::with_capacity(bits.len());
    let mut ones = 0;
    for (idx, bit) in bits.iter().enumerate() {
        if ones == MAX_SUCCESSIVE_ONES {
            if *bit != 0 {
                return Err(Error::Stuffing { offset: base + idx });
            }
            ones = 0;
            continue;
        }
        if *bit == 1 {
            ones += 1;
        } else {
            ones = 0;
        }
        out.push(*bit);
    }
    Ok(out)
}
