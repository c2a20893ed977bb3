#![no_std]

//! # Decrypt Gateway
//!
//! Authorization layer between ciphertext handles and their cleartext.
//! A requester opens a **decryption session**: a time-boxed credential that
//! binds the requester's identity to a public key and an explicit set of
//! contract addresses (the scope). Decryption then succeeds only while the
//! session is live, only for contracts inside the scope, and only for handles
//! the FHE engine has granted to both the requester and the scope contract.
//!
//! ## Session cache
//!
//! Sessions are stored keyed by `(requester, sha256(scope))`, so reopening a
//! session for the same scope inside the validity window returns the stored
//! record unchanged and performs no new signing handshake. The private half
//! of the session keypair never reaches the chain; only the public key is
//! registered here.
//!
//! ## Trust boundaries
//!
//! - This contract is the only path from a handle to a cleartext value.
//! - Grant bookkeeping lives in the FHE engine; this contract only queries it.
//! - Opening a session requires the requester to authorize the exact tuple
//!   `(public_key, scope digest, valid_for_days)`; a declined signature
//!   surfaces as the host auth failure.

use soroban_sdk::{
    contract, contractclient, contracterror, contractimpl, contracttype, symbol_short, vec,
    xdr::ToXdr, Address, BytesN, Env, IntoVal, Vec,
};


// ============================================================================
// External Contract Interfaces
// ============================================================================

/// The slice of the FHE engine this contract needs: grant lookups and the
/// reveal primitive.
#[contractclient(name = "FheAccessClient")]
pub trait FheAccess {
    fn has_grant(env: Env, handle: BytesN<32>, who: Address) -> bool;
    fn reveal(env: Env, handle: BytesN<32>) -> u32;
}

// ============================================================================
// Errors
// ============================================================================

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    /// Caller is not the gateway admin.
    NotAdmin = 1,
    /// No session exists for `(requester, scope)`.
    SessionNotFound = 2,
    /// The session's validity window has elapsed.
    Expired = 3,
    /// The handle's contract is not in the session scope.
    ScopeMismatch = 4,
    /// The engine holds no grant for the requester (or scope contract) on
    /// this handle.
    Unauthorized = 5,
    /// The scope address set is empty.
    InvalidScope = 6,
    /// Validity duration is zero or above the cap.
    InvalidDuration = 7,
}

// ============================================================================
// Data Types
// ============================================================================

/// A live decryption credential. The matching private key stays with the
/// requester; it is never transmitted.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecryptSession {
    pub requester: Address,
    pub scope: Vec<Address>,
    pub public_key: BytesN<32>,
    /// Ledger timestamp at issuance (seconds).
    pub issued_at: u64,
    pub valid_for_days: u32,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    /// Gateway admin (instance storage).
    Admin,
    /// Address of the FHE engine contract (instance storage).
    FheEngine,
    /// Session per `(requester, sha256(scope))` (temporary storage).
    Session(Address, BytesN<32>),
}

const SECONDS_PER_DAY: u64 = 86_400;
/// 5-second ledger close.
const LEDGERS_PER_DAY: u32 = 17_280;
const MAX_SESSION_DAYS: u32 = 365;

// ============================================================================
// Contract
// ============================================================================

#[contract]
pub struct DecryptGateway;

#[contractimpl]
impl DecryptGateway {
    /// Deploy and configure the contract.
    ///
    /// # Arguments
    /// * `admin` – Admin address (`set_fhe` + `upgrade`).
    /// * `fhe`   – Address of the FHE engine contract.
    pub fn __constructor(env: Env, admin: Address, fhe: Address) {
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::FheEngine, &fhe);
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Open (or return the cached) decryption session for `(requester, scope)`.
    ///
    /// Idempotent within the validity window: while a stored session is still
    /// live, it is returned unchanged and no new authorization is requested.
    /// Once absent or expired, the requester must authorize the new session
    /// material and the stored record is replaced.
    ///
    /// # Arguments
    /// * `requester`      – Identity the session is bound to.
    /// * `scope`          – Contract addresses whose handles the session may
    ///                      decrypt. Must be non-empty.
    /// * `public_key`     – Public half of the requester's session keypair.
    /// * `valid_for_days` – Validity window, in days (1 to 365).
    pub fn open_session(
        env: Env,
        requester: Address,
        scope: Vec<Address>,
        public_key: BytesN<32>,
        valid_for_days: u32,
    ) -> Result<DecryptSession, Error> {
        if scope.is_empty() {
            return Err(Error::InvalidScope);
        }
        if valid_for_days == 0 || valid_for_days > MAX_SESSION_DAYS {
            return Err(Error::InvalidDuration);
        }

        let digest = Self::scope_digest(&env, &scope);
        let key = DataKey::Session(requester.clone(), digest.clone());

        // Cache hit: a still-valid session is returned as-is, no re-signing.
        if let Some(existing) = env
            .storage()
            .temporary()
            .get::<DataKey, DecryptSession>(&key)
        {
            if Self::is_live(&env, &existing) {
                return Ok(existing);
            }
        }

        // The requester signs over exactly what the session binds.
        requester.require_auth_for_args(vec![
            &env,
            public_key.into_val(&env),
            digest.into_val(&env),
            valid_for_days.into_val(&env),
        ]);

        let session = DecryptSession {
            requester: requester.clone(),
            scope,
            public_key,
            issued_at: env.ledger().timestamp(),
            valid_for_days,
        };

        let ttl = valid_for_days.saturating_mul(LEDGERS_PER_DAY);
        env.storage().temporary().set(&key, &session);
        env.storage().temporary().extend_ttl(&key, ttl, ttl);

        env.events()
            .publish((symbol_short!("session"), requester), digest);

        Ok(session)
    }

    /// Retrieve the stored session for `(requester, scope)`, expired or not.
    pub fn get_session(
        env: Env,
        requester: Address,
        scope: Vec<Address>,
    ) -> Option<DecryptSession> {
        let digest = Self::scope_digest(&env, &scope);
        env.storage()
            .temporary()
            .get(&DataKey::Session(requester, digest))
    }

    /// Discard the stored session so the next `open_session` starts a fresh
    /// signing handshake.
    pub fn revoke_session(env: Env, requester: Address, scope: Vec<Address>) {
        requester.require_auth();
        let digest = Self::scope_digest(&env, &scope);
        env.storage()
            .temporary()
            .remove(&DataKey::Session(requester, digest));
    }

    // ========================================================================
    // Decryption
    // ========================================================================

    /// Decrypt `handle` under the requester's session.
    ///
    /// The single ciphertext-to-cleartext path in the system. Checks, in
    /// order: a session exists, it has not expired, `scope_contract` is in
    /// the session scope, and the engine holds grants on the handle for both
    /// the requester and the scope contract. Only then is the cleartext
    /// produced.
    ///
    /// # Arguments
    /// * `requester`      – Session owner; must authorize the call.
    /// * `scope`          – Scope the session was opened with.
    /// * `scope_contract` – Contract the handle belongs to.
    /// * `handle`         – The ciphertext handle to decrypt.
    pub fn decrypt(
        env: Env,
        requester: Address,
        scope: Vec<Address>,
        scope_contract: Address,
        handle: BytesN<32>,
    ) -> Result<u32, Error> {
        requester.require_auth();

        let digest = Self::scope_digest(&env, &scope);
        let session: DecryptSession = env
            .storage()
            .temporary()
            .get(&DataKey::Session(requester.clone(), digest))
            .ok_or(Error::SessionNotFound)?;

        if !Self::is_live(&env, &session) {
            return Err(Error::Expired);
        }
        if !session.scope.contains(&scope_contract) {
            return Err(Error::ScopeMismatch);
        }

        let fhe_addr: Address = env
            .storage()
            .instance()
            .get(&DataKey::FheEngine)
            .expect("FHE engine not set");
        let fhe = FheAccessClient::new(&env, &fhe_addr);

        if !fhe.has_grant(&handle, &requester) {
            return Err(Error::Unauthorized);
        }
        if !fhe.has_grant(&handle, &scope_contract) {
            return Err(Error::Unauthorized);
        }

        Ok(fhe.reveal(&handle))
    }

    // ========================================================================
    // Admin Functions
    // ========================================================================

    pub fn get_admin(env: Env) -> Address {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("Admin not set")
    }

    pub fn get_fhe(env: Env) -> Address {
        env.storage()
            .instance()
            .get(&DataKey::FheEngine)
            .expect("FHE engine not set")
    }

    /// Point the gateway at a different FHE engine contract.
    pub fn set_fhe(env: Env, admin: Address, new_fhe: Address) -> Result<(), Error> {
        admin.require_auth();
        let stored: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("Admin not set");
        if admin != stored {
            return Err(Error::NotAdmin);
        }
        env.storage().instance().set(&DataKey::FheEngine, &new_fhe);
        Ok(())
    }

    pub fn upgrade(env: Env, new_wasm_hash: BytesN<32>) {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("Admin not set");
        admin.require_auth();
        env.deployer().update_current_contract_wasm(new_wasm_hash);
    }

    // ========================================================================
    // Private Helpers
    // ========================================================================

    /// Content-address a scope set so it can key the session cache.
    fn scope_digest(env: &Env, scope: &Vec<Address>) -> BytesN<32> {
        env.crypto().sha256(&scope.clone().to_xdr(env)).to_bytes()
    }

    fn is_live(env: &Env, session: &DecryptSession) -> bool {
        let expires_at =
            session.issued_at + session.valid_for_days as u64 * SECONDS_PER_DAY;
        env.ledger().timestamp() < expires_at
    }
}
