//! Player console projections.
//!
//! Pure derivations over a chain-state snapshot plus caller-side flags: which
//! actions are currently available, which protocol phase to show, and how a
//! decrypted distance maps to a feedback tier. Nothing here is
//! security-relevant; the contract enforces its own preconditions. Everything
//! is recomputed from a fresh snapshot on every call, never cached. A wallet
//! or network switch simply means deriving from a new snapshot; stale flags
//! from the previous identity must not be carried over.

use soroban_sdk::{contracttype, Env, String};

/// Snapshot of the chain state a console needs, assembled per player.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerView {
    pub treasure_ready: bool,
    pub grid_size: u32,
    pub is_owner: bool,
    pub has_guess: bool,
}

/// Caller-side context: in-flight guards for each action kind, and whether
/// the wallet is on the game's network. In-flight actions must be coalesced
/// by the caller; these flags are how the projection respects that.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OpFlags {
    pub creating: bool,
    pub guessing: bool,
    pub decrypting: bool,
    pub refreshing: bool,
    pub network_match: bool,
}

/// Which actions the player may start right now.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Capabilities {
    pub can_create_treasure: bool,
    pub can_make_guess: bool,
    pub can_decrypt: bool,
    pub can_refresh: bool,
}

/// Protocol phase, as shown to the player.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    WrongNetwork,
    CreatingTreasure,
    GuessInFlight,
    Decrypting,
    Refreshing,
    AwaitingTreasure,
    DistanceReady,
    ReadyToGuess,
}

/// Qualitative distance feedback. Display only.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Tier {
    Found,
    Hot,
    Warm,
    Cool,
    Cold,
}

pub fn capabilities(view: &PlayerView, flags: &OpFlags) -> Capabilities {
    Capabilities {
        can_create_treasure: flags.network_match
            && view.is_owner
            && !view.treasure_ready
            && !flags.creating,
        can_make_guess: flags.network_match && view.treasure_ready && !flags.guessing,
        can_decrypt: flags.network_match && view.has_guess && !flags.decrypting,
        can_refresh: flags.network_match && !flags.refreshing,
    }
}

/// In-flight states win over resting states; the wrong network wins over
/// everything.
pub fn phase(view: &PlayerView, flags: &OpFlags) -> Phase {
    if !flags.network_match {
        Phase::WrongNetwork
    } else if flags.creating {
        Phase::CreatingTreasure
    } else if flags.guessing {
        Phase::GuessInFlight
    } else if flags.decrypting {
        Phase::Decrypting
    } else if flags.refreshing {
        Phase::Refreshing
    } else if !view.treasure_ready {
        Phase::AwaitingTreasure
    } else if view.has_guess {
        Phase::DistanceReady
    } else {
        Phase::ReadyToGuess
    }
}

pub fn status_text(env: &Env, phase: Phase) -> String {
    let text = match phase {
        Phase::WrongNetwork => "Switch to the game network to play.",
        Phase::CreatingTreasure => "Hiding the treasure...",
        Phase::GuessInFlight => "Submitting your guess...",
        Phase::Decrypting => "Unsealing your distance...",
        Phase::Refreshing => "Syncing game state...",
        Phase::AwaitingTreasure => "No treasure is hidden yet. Waiting on the owner.",
        Phase::DistanceReady => "Your distance is sealed and ready to unseal.",
        Phase::ReadyToGuess => "The treasure is hidden. Submit a guess.",
    };
    String::from_str(env, text)
}

/// 0 is a find; everything else falls into four temperature bands.
pub fn tier_for_distance(distance: u32) -> Tier {
    if distance == 0 {
        Tier::Found
    } else if distance <= 2 {
        Tier::Hot
    } else if distance <= 5 {
        Tier::Warm
    } else if distance <= 10 {
        Tier::Cool
    } else {
        Tier::Cold
    }
}
