use std::cmp::Ordering;

use num_bigint::BigUint;
use sha1::{Digest, Sha1};

/// Width of the identifier space. Node endpoints and lookup keys are both
/// hashed onto the same ring of 2^RING_BITS points.
pub const RING_BITS: u32 = 32;

/// Map an opaque byte string onto the ring.
///
/// The 160 bit digest is read as a big unsigned integer and reduced modulo
/// the size of the ring, so the same input always lands on the same point.
pub fn hash(data: &[u8]) -> u32 {
	let digest = Sha1::digest(data);
	let id = BigUint::from_bytes_be(digest.as_slice()) % BigUint::new(vec![2]).pow(RING_BITS);
	id.to_u32_digits().first().copied().unwrap_or(0)
}

/// Tests if id lies strictly inside the clockwise arc (lower, upper),
/// wrapping past the top of the ring when the arc crosses it. When
/// lower == upper the arc covers the whole ring except that single point.
pub fn between(id: u32, lower: u32, upper: u32) -> bool {
	match lower.cmp(&upper) {
		Ordering::Less => id > lower && id < upper,
		Ordering::Greater => id > lower || id < upper,
		Ordering::Equal => id != lower,
	}
}

/// Tests if id lies in the half open clockwise arc (lower, upper]. When
/// lower == upper the arc is the full ring, which is what makes a lone node
/// resolve every id to itself.
pub fn between_right_incl(id: u32, lower: u32, upper: u32) -> bool {
	match lower.cmp(&upper) {
		Ordering::Less => id > lower && id <= upper,
		Ordering::Greater => id > lower || id <= upper,
		Ordering::Equal => true,
	}
}

/// The ring point that finger `index` of a node at `id` should track:
/// (id + 2^index) mod 2^RING_BITS.
pub fn finger_target(id: u32, index: u32) -> u32 {
	id.wrapping_add(1u32 << index)
}
