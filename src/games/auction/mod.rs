//! "Auction", a sealed-bid game played simultaneously.
//!
//! - A shuffled, face-down pile of prizes worth -5..-1 and 1..10
//! - Each player holds bid cards 1..15
//! - The current player reveals a prize; then everyone bids at once
//! - Tied bids cancel; the highest remaining bid takes a positive prize,
//!   the lowest takes a negative one; if every bid ties the prize carries over
//! - Bid cards are spent; when the pile is empty the highest total wins
//!
//! Bids are made with the ephemeral `EBid`/`ERetract` opcodes and become
//! `Bid`/`Retract` when the round is canonicalized.

mod game;

pub use game::{resolve_bids, Auction, AuctionOp, AuctionPhase, Tile, BID, HAND, MAX_BID, PILE, PRIZE, PRIZE_VALUES, SPENT, WON};
