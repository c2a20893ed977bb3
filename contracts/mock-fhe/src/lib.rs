#![no_std]

//! # Mock FHE Engine
//!
//! Deterministic stand-in for the encrypted arithmetic engine, used by the
//! unit tests of the game and gateway contracts. Values live in a cleartext
//! table keyed by opaque 32-byte handles; callers only ever see the handles.
//!
//! Semantics mirrored from the real engine:
//! - all arithmetic is modular in the 8-bit unsigned domain;
//! - `le`/`eq` produce 0/1 "encrypted boolean" handles;
//! - `ingest` traps on a bad input proof (empty, or leading `0xff` byte);
//! - randomness is served from a seedable queue so tests can pin the draw,
//!   falling back to the host PRNG when the queue is empty.
//!
//! The all-zero handle is reserved as the "no value" sentinel and is never
//! allocated (handle indices start at 1).

use soroban_sdk::{contract, contractimpl, contracttype, Address, Bytes, BytesN, Env, Vec};


const VALUE_MASK: u32 = 0xFF;

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    /// Next handle index (indices start at 1; 0 is the sentinel).
    Counter,
    /// Scripted random values consumed by `rand_bounded` in FIFO order.
    RandQueue,
    /// Cleartext value behind a handle.
    Value(BytesN<32>),
    /// Decrypt permission for (handle, principal).
    Grant(BytesN<32>, Address),
}

#[contract]
pub struct MockFhe;

#[contractimpl]
impl MockFhe {
    // ----- Test scripting ---------------------------------------------------

    /// Queue cleartext values to be returned (mod bound) by upcoming
    /// `rand_bounded` calls.
    pub fn seed_randoms(env: Env, values: Vec<u32>) {
        let mut queue: Vec<u32> = env
            .storage()
            .instance()
            .get(&DataKey::RandQueue)
            .unwrap_or(Vec::new(&env));
        queue.append(&values);
        env.storage().instance().set(&DataKey::RandQueue, &queue);
    }

    // ----- Encrypted-type construction --------------------------------------

    /// Encrypted uniform draw in `[0, bound)`.
    pub fn rand_bounded(env: Env, bound: u32) -> BytesN<32> {
        if bound == 0 {
            panic!("rand_bounded: bound must be nonzero");
        }
        let mut queue: Vec<u32> = env
            .storage()
            .instance()
            .get(&DataKey::RandQueue)
            .unwrap_or(Vec::new(&env));
        let value = match queue.pop_front() {
            Some(v) => {
                env.storage().instance().set(&DataKey::RandQueue, &queue);
                v % bound
            }
            None => env.prng().gen_range::<u64>(0..bound as u64) as u32,
        };
        Self::alloc(&env, value)
    }

    /// Validate and import an externally encrypted input.
    ///
    /// Ciphertext convention for tests: the value in the first 4 bytes,
    /// big-endian. Proof convention: traps if empty or starting with `0xff`.
    pub fn ingest(env: Env, ciphertext: Bytes, proof: Bytes) -> BytesN<32> {
        if proof.is_empty() {
            panic!("ingest: missing input proof");
        }
        if proof.get(0) == Some(0xff) {
            panic!("ingest: invalid input proof");
        }
        if ciphertext.len() < 4 {
            panic!("ingest: malformed ciphertext");
        }
        let value = (ciphertext.get_unchecked(0) as u32) << 24
            | (ciphertext.get_unchecked(1) as u32) << 16
            | (ciphertext.get_unchecked(2) as u32) << 8
            | ciphertext.get_unchecked(3) as u32;
        Self::alloc(&env, value & VALUE_MASK)
    }

    /// Trivial encryption of a plaintext constant.
    pub fn encrypt_const(env: Env, value: u32) -> BytesN<32> {
        Self::alloc(&env, value & VALUE_MASK)
    }

    // ----- Ciphertext arithmetic --------------------------------------------

    pub fn add(env: Env, a: BytesN<32>, b: BytesN<32>) -> BytesN<32> {
        let v = (Self::value_of(&env, &a) + Self::value_of(&env, &b)) & VALUE_MASK;
        Self::alloc(&env, v)
    }

    pub fn sub(env: Env, a: BytesN<32>, b: BytesN<32>) -> BytesN<32> {
        // Wrapping subtraction in the 8-bit domain.
        let v = (Self::value_of(&env, &a) + 0x100 - Self::value_of(&env, &b)) & VALUE_MASK;
        Self::alloc(&env, v)
    }

    pub fn rem(env: Env, a: BytesN<32>, modulus: u32) -> BytesN<32> {
        if modulus == 0 {
            panic!("rem: modulus must be nonzero");
        }
        Self::alloc(&env, Self::value_of(&env, &a) % modulus)
    }

    /// Encrypted boolean `a <= b`.
    pub fn le(env: Env, a: BytesN<32>, b: BytesN<32>) -> BytesN<32> {
        let v = (Self::value_of(&env, &a) <= Self::value_of(&env, &b)) as u32;
        Self::alloc(&env, v)
    }

    /// Encrypted boolean `a == b`.
    pub fn eq(env: Env, a: BytesN<32>, b: BytesN<32>) -> BytesN<32> {
        let v = (Self::value_of(&env, &a) == Self::value_of(&env, &b)) as u32;
        Self::alloc(&env, v)
    }

    /// Branchless conditional: `cond ? a : b`, as a fresh handle.
    pub fn select(env: Env, cond: BytesN<32>, a: BytesN<32>, b: BytesN<32>) -> BytesN<32> {
        let v = if Self::value_of(&env, &cond) != 0 {
            Self::value_of(&env, &a)
        } else {
            Self::value_of(&env, &b)
        };
        Self::alloc(&env, v)
    }

    // ----- Access control ---------------------------------------------------

    /// Authorize `who` to later decrypt `handle`.
    pub fn grant(env: Env, handle: BytesN<32>, who: Address) {
        // Granting an unknown handle is a programming error in the caller.
        Self::value_of(&env, &handle);
        env.storage()
            .persistent()
            .set(&DataKey::Grant(handle, who), &true);
    }

    pub fn has_grant(env: Env, handle: BytesN<32>, who: Address) -> bool {
        env.storage()
            .persistent()
            .has(&DataKey::Grant(handle, who))
    }

    /// Produce the cleartext behind a handle. Access policy is enforced by
    /// the gateway contract, not here.
    pub fn reveal(env: Env, handle: BytesN<32>) -> u32 {
        Self::value_of(&env, &handle)
    }

    // ----- Internals --------------------------------------------------------

    fn alloc(env: &Env, value: u32) -> BytesN<32> {
        let index: u32 = env
            .storage()
            .instance()
            .get(&DataKey::Counter)
            .unwrap_or(0u32)
            + 1;
        env.storage().instance().set(&DataKey::Counter, &index);
        let handle = Self::handle_from_index(env, index);
        env.storage()
            .persistent()
            .set(&DataKey::Value(handle.clone()), &value);
        handle
    }

    fn value_of(env: &Env, handle: &BytesN<32>) -> u32 {
        env.storage()
            .persistent()
            .get(&DataKey::Value(handle.clone()))
            .unwrap_or_else(|| panic!("unknown handle"))
    }

    fn handle_from_index(env: &Env, index: u32) -> BytesN<32> {
        let mut arr = [0u8; 32];
        // Big-endian in the trailing bytes.
        arr[28] = (index >> 24) as u8;
        arr[29] = (index >> 16) as u8;
        arr[30] = (index >> 8) as u8;
        arr[31] = index as u8;
        BytesN::from_array(env, &arr)
    }
}
