#![no_std]

//! # Treasure Hunt — Encrypted Coordinates Edition
//!
//! A grid treasure-hunt game whose secret never exists in cleartext on chain.
//!
//! ## Flow
//! 1. Admin deploys the FHE engine and the decrypt gateway.
//! 2. Admin deploys this contract with (`owner`, `fhe`, `grid_size`).
//! 3. The owner calls `create_treasure`: two encrypted random draws, reduced
//!    into `[0, grid_size)`, become the secret coordinates.
//! 4. A player encrypts a guess off-chain and calls `guess` with the two
//!    ciphertexts and their input proofs. The contract computes the Manhattan
//!    distance to the secret entirely under encryption and stores the result
//!    handle under the player's address.
//! 5. The player opens a decryption session on the gateway and unseals their
//!    own distance. Nobody else can: the handle is granted to the submitting
//!    player and to this contract, and to no one else.
//!
//! ## Confidentiality invariant
//!
//! No cleartext control-flow decision in this contract depends on a
//! comparison between the secret and a guess. Each axis distance is computed
//! by evaluating both subtraction orders and picking one with an encrypted
//! `select`; the "treasure found" signal is likewise only ever an encrypted
//! equality handle. The predicates never leave the encrypted domain here.
//!
//! ## Trust boundaries
//!
//! - The FHE engine is an external contract reached through the narrow
//!   client interface below; this contract never inspects ciphertext bytes.
//! - Input proofs are validated by the engine during `ingest`; a rejected
//!   input fails the whole call with `InvalidProof` and writes nothing.
//! - `reset_game` is a soft reset: it clears the secret and the ready flag
//!   but neither revokes grants already issued nor deletes stored distance
//!   handles, so past results stay readable by their owners.

use soroban_sdk::{
    contract, contractclient, contracterror, contractimpl, contracttype, symbol_short, Address,
    Bytes, BytesN, Env, String,
};

pub mod console;


pub use console::{Capabilities, OpFlags, Phase, PlayerView, Tier};

// ============================================================================
// External Contract Interfaces
// ============================================================================

/// Interface of the FHE engine, as consumed by this contract.
///
/// Handles are opaque 32-byte references to ciphertexts; the all-zero handle
/// is the reserved "no value" sentinel. Arithmetic is modular in the 8-bit
/// unsigned domain. `ingest` MUST trap on an invalid input proof.
#[contractclient(name = "FheEngineClient")]
pub trait FheEngine {
    fn rand_bounded(env: Env, bound: u32) -> BytesN<32>;
    fn ingest(env: Env, ciphertext: Bytes, proof: Bytes) -> BytesN<32>;
    fn encrypt_const(env: Env, value: u32) -> BytesN<32>;
    fn add(env: Env, a: BytesN<32>, b: BytesN<32>) -> BytesN<32>;
    fn sub(env: Env, a: BytesN<32>, b: BytesN<32>) -> BytesN<32>;
    fn rem(env: Env, a: BytesN<32>, modulus: u32) -> BytesN<32>;
    fn le(env: Env, a: BytesN<32>, b: BytesN<32>) -> BytesN<32>;
    fn eq(env: Env, a: BytesN<32>, b: BytesN<32>) -> BytesN<32>;
    fn select(env: Env, cond: BytesN<32>, a: BytesN<32>, b: BytesN<32>) -> BytesN<32>;
    fn grant(env: Env, handle: BytesN<32>, who: Address);
}

// ============================================================================
// Errors
// ============================================================================

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    /// Caller is not the game owner.
    NotOwner = 1,
    /// A treasure is already hidden; reset first.
    AlreadySet = 2,
    /// No treasure is hidden yet; guessing is closed.
    NotReady = 3,
    /// No treasure is hidden; nothing to read.
    NotSet = 4,
    /// The engine rejected an encrypted input's proof.
    InvalidProof = 5,
}

// ============================================================================
// Storage
// ============================================================================

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    /// Game owner (instance storage).
    Owner,
    /// Address of the FHE engine contract (instance storage).
    FheEngine,
    /// Side length of the coordinate grid (instance storage).
    GridSize,
    /// Secret coordinate handles; present iff `TreasureSet` (instance).
    TreasureX,
    TreasureY,
    TreasureSet,
    /// Latest encrypted distance per player (persistent, 30-day TTL).
    Distance(Address),
    /// Encrypted "distance is zero" flag per player (persistent, 30-day TTL).
    HitFlag(Address),
}

/// 30 days = 30 × 24 × 3600 / 5 ≈ 518 400 ledgers (5-second ledger close).
const RECORD_TTL_LEDGERS: u32 = 518_400;

/// Coordinates live in the 8-bit unsigned domain.
const MAX_GRID_SIZE: u32 = 256;

// ============================================================================
// Contract
// ============================================================================

#[contract]
pub struct TreasureHunt;

#[contractimpl]
impl TreasureHunt {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Deploy and configure the contract.
    ///
    /// # Arguments
    /// * `owner`     – The only identity allowed to hide or reset treasures.
    /// * `fhe`       – Address of the FHE engine contract.
    /// * `grid_size` – Side length of the square grid; 2 to 256.
    pub fn __constructor(env: Env, owner: Address, fhe: Address, grid_size: u32) {
        if grid_size < 2 || grid_size > MAX_GRID_SIZE {
            panic!("grid size out of range");
        }
        env.storage().instance().set(&DataKey::Owner, &owner);
        env.storage().instance().set(&DataKey::FheEngine, &fhe);
        env.storage().instance().set(&DataKey::GridSize, &grid_size);
        env.storage().instance().set(&DataKey::TreasureSet, &false);
    }

    // ========================================================================
    // Owner Operations
    // ========================================================================

    /// Hide a new treasure at an encrypted random coordinate.
    ///
    /// Draws two independent bounded random ciphertexts from the engine, one
    /// per axis, and locks them in until `reset_game`. The secret handles are
    /// granted to this contract and to the owner (operator debugging); no
    /// player is ever granted access to them.
    pub fn create_treasure(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        Self::require_owner(&env, &caller)?;
        if Self::treasure_set(&env) {
            return Err(Error::AlreadySet);
        }

        let grid_size = Self::grid_size_internal(&env);
        let fhe = Self::engine(&env);
        let x = fhe.rand_bounded(&grid_size);
        let y = fhe.rand_bounded(&grid_size);

        let this = env.current_contract_address();
        fhe.grant(&x, &this);
        fhe.grant(&x, &caller);
        fhe.grant(&y, &this);
        fhe.grant(&y, &caller);

        env.storage().instance().set(&DataKey::TreasureX, &x);
        env.storage().instance().set(&DataKey::TreasureY, &y);
        env.storage().instance().set(&DataKey::TreasureSet, &true);

        env.events().publish((symbol_short!("created"),), caller);
        Ok(())
    }

    /// Forget the current treasure so a new one can be hidden.
    ///
    /// Soft reset: stored player distances and previously issued decrypt
    /// grants survive, so old results remain readable by their owners.
    pub fn reset_game(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        Self::require_owner(&env, &caller)?;

        env.storage().instance().remove(&DataKey::TreasureX);
        env.storage().instance().remove(&DataKey::TreasureY);
        env.storage().instance().set(&DataKey::TreasureSet, &false);

        env.events().publish((symbol_short!("reset"),), caller);
        Ok(())
    }

    /// Read the secret coordinate handles. Operator debugging only; players
    /// have no grant on these, so the handles are useless to anyone else.
    pub fn get_treasure_location(
        env: Env,
        caller: Address,
    ) -> Result<(BytesN<32>, BytesN<32>), Error> {
        caller.require_auth();
        Self::require_owner(&env, &caller)?;
        if !Self::treasure_set(&env) {
            return Err(Error::NotSet);
        }
        let x = env.storage().instance().get(&DataKey::TreasureX).unwrap();
        let y = env.storage().instance().get(&DataKey::TreasureY).unwrap();
        Ok((x, y))
    }

    // ========================================================================
    // Player Operations
    // ========================================================================

    /// Submit an encrypted guess.
    ///
    /// Both coordinates arrive as external ciphertexts with input proofs and
    /// are validated and imported by the engine, then reduced into the grid
    /// domain. The Manhattan distance to the secret is computed entirely
    /// under encryption and stored under the player's address, replacing any
    /// previous guess. The player and this contract are granted decryption
    /// rights on the fresh distance and hit-flag handles.
    ///
    /// Every fallible step precedes every write: a failed guess records
    /// nothing.
    pub fn guess(
        env: Env,
        player: Address,
        ct_x: Bytes,
        proof_x: Bytes,
        ct_y: Bytes,
        proof_y: Bytes,
    ) -> Result<(), Error> {
        player.require_auth();
        if !Self::treasure_set(&env) {
            return Err(Error::NotReady);
        }

        let fhe = Self::engine(&env);
        let gx = match fhe.try_ingest(&ct_x, &proof_x) {
            Ok(Ok(handle)) => handle,
            _ => return Err(Error::InvalidProof),
        };
        let gy = match fhe.try_ingest(&ct_y, &proof_y) {
            Ok(Ok(handle)) => handle,
            _ => return Err(Error::InvalidProof),
        };

        let grid_size = Self::grid_size_internal(&env);
        let gx = fhe.rem(&gx, &grid_size);
        let gy = fhe.rem(&gy, &grid_size);

        let sx: BytesN<32> = env.storage().instance().get(&DataKey::TreasureX).unwrap();
        let sy: BytesN<32> = env.storage().instance().get(&DataKey::TreasureY).unwrap();

        let dx = Self::axis_distance(&fhe, &sx, &gx);
        let dy = Self::axis_distance(&fhe, &sy, &gy);
        let distance = fhe.add(&dx, &dy);

        // "Found" stays an encrypted flag; it is never branched on here.
        let zero = fhe.encrypt_const(&0u32);
        let hit = fhe.eq(&distance, &zero);

        let this = env.current_contract_address();
        fhe.grant(&distance, &player);
        fhe.grant(&distance, &this);
        fhe.grant(&hit, &player);
        fhe.grant(&hit, &this);

        Self::store_player_handle(&env, DataKey::Distance(player.clone()), &distance);
        Self::store_player_handle(&env, DataKey::HitFlag(player.clone()), &hit);

        env.events().publish((symbol_short!("guess"),), player);
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The caller's latest encrypted distance, or the zero sentinel handle if
    /// they have never guessed. Never fails.
    pub fn get_my_distance(env: Env, player: Address) -> BytesN<32> {
        env.storage()
            .persistent()
            .get(&DataKey::Distance(player))
            .unwrap_or_else(|| Self::empty_handle(&env))
    }

    /// The caller's latest encrypted "found it" flag, or the zero sentinel.
    pub fn get_my_hit_flag(env: Env, player: Address) -> BytesN<32> {
        env.storage()
            .persistent()
            .get(&DataKey::HitFlag(player))
            .unwrap_or_else(|| Self::empty_handle(&env))
    }

    pub fn has_guessed(env: Env, player: Address) -> bool {
        env.storage().persistent().has(&DataKey::Distance(player))
    }

    pub fn is_treasure_ready(env: Env) -> bool {
        Self::treasure_set(&env)
    }

    // ========================================================================
    // Player Console Projections
    // ========================================================================

    /// Fresh snapshot of everything the console derives from chain state.
    /// Recomputed from storage on every call; reads after a write always
    /// observe the write.
    pub fn get_player_view(env: Env, player: Address) -> PlayerView {
        let owner: Address = env.storage().instance().get(&DataKey::Owner).unwrap();
        PlayerView {
            treasure_ready: Self::treasure_set(&env),
            grid_size: Self::grid_size_internal(&env),
            is_owner: player == owner,
            has_guess: env
                .storage()
                .persistent()
                .has(&DataKey::Distance(player)),
        }
    }

    /// Action availability for the player given the caller-side flags.
    pub fn capabilities(env: Env, player: Address, flags: OpFlags) -> Capabilities {
        console::capabilities(&Self::get_player_view(env, player), &flags)
    }

    /// Single human-readable status line for the current protocol phase.
    pub fn status(env: Env, player: Address, flags: OpFlags) -> String {
        let phase = console::phase(&Self::get_player_view(env.clone(), player), &flags);
        console::status_text(&env, phase)
    }

    /// Qualitative feedback tier for a decrypted distance. Display only.
    pub fn feedback_tier(distance: u32) -> Tier {
        console::tier_for_distance(distance)
    }

    // ========================================================================
    // Admin Functions
    // ========================================================================

    pub fn get_owner(env: Env) -> Address {
        env.storage()
            .instance()
            .get(&DataKey::Owner)
            .expect("Owner not set")
    }

    pub fn get_grid_size(env: Env) -> u32 {
        Self::grid_size_internal(&env)
    }

    pub fn get_fhe(env: Env) -> Address {
        env.storage()
            .instance()
            .get(&DataKey::FheEngine)
            .expect("FHE engine not set")
    }

    /// Swap the FHE engine. Refused while a treasure is hidden: the secret
    /// handles would be orphaned on the old engine.
    pub fn set_fhe(env: Env, caller: Address, new_fhe: Address) -> Result<(), Error> {
        caller.require_auth();
        Self::require_owner(&env, &caller)?;
        if Self::treasure_set(&env) {
            return Err(Error::AlreadySet);
        }
        env.storage().instance().set(&DataKey::FheEngine, &new_fhe);
        Ok(())
    }

    pub fn upgrade(env: Env, new_wasm_hash: BytesN<32>) {
        let owner: Address = env
            .storage()
            .instance()
            .get(&DataKey::Owner)
            .expect("Owner not set");
        owner.require_auth();
        env.deployer().update_current_contract_wasm(new_wasm_hash);
    }

    // ========================================================================
    // Private Helpers
    // ========================================================================

    /// Per-axis `|a - b|` without a cleartext branch: both subtraction orders
    /// are evaluated and an encrypted comparison picks the non-wrapping one.
    fn axis_distance(
        fhe: &FheEngineClient<'_>,
        a: &BytesN<32>,
        b: &BytesN<32>,
    ) -> BytesN<32> {
        let a_le_b = fhe.le(a, b);
        let b_minus_a = fhe.sub(b, a);
        let a_minus_b = fhe.sub(a, b);
        fhe.select(&a_le_b, &b_minus_a, &a_minus_b)
    }

    fn require_owner(env: &Env, caller: &Address) -> Result<(), Error> {
        let owner: Address = env
            .storage()
            .instance()
            .get(&DataKey::Owner)
            .expect("Owner not set");
        if *caller != owner {
            return Err(Error::NotOwner);
        }
        Ok(())
    }

    fn treasure_set(env: &Env) -> bool {
        env.storage()
            .instance()
            .get(&DataKey::TreasureSet)
            .unwrap_or(false)
    }

    fn grid_size_internal(env: &Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::GridSize)
            .expect("grid size not set")
    }

    fn engine(env: &Env) -> FheEngineClient<'_> {
        let addr: Address = env
            .storage()
            .instance()
            .get(&DataKey::FheEngine)
            .expect("FHE engine not set");
        FheEngineClient::new(env, &addr)
    }

    fn store_player_handle(env: &Env, key: DataKey, handle: &BytesN<32>) {
        env.storage().persistent().set(&key, handle);
        env.storage()
            .persistent()
            .extend_ttl(&key, RECORD_TTL_LEDGERS, RECORD_TTL_LEDGERS);
    }

    fn empty_handle(env: &Env) -> BytesN<32> {
        BytesN::from_array(env, &[0u8; 32])
    }
}
