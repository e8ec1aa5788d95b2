// Negotiation: proposals, the deal builder, summaries, commits and the AI
// trade driver.

pub mod block;
pub mod builder;
pub mod commit;
pub mod driver;
pub mod proposal;
pub mod summary;

use courtside_core::league::{Phase, StoreError};
use thiserror::Error;

pub use block::{trading_block_offers, BlockOffer};
pub use builder::{describe_counter_offer, make_it_work, BuildOutcome};
pub use commit::{process_trade, propose, ProposeOutcome};
pub use driver::{between_ai_teams, AiTradeOutcome};
pub use proposal::{is_untradable, TradeProposal, TradeSide};
pub use summary::{summary, TradeSummary};

#[derive(Debug, Error)]
pub enum TradeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The pick value table covers the index in neither the season curve nor
    /// the default curve.
    #[error("no pick value for season {season}, index {index}")]
    MissingPickValue { season: i32, index: usize },

    #[error("trades are not allowed during the {0} phase")]
    NotTradingPeriod(Phase),
}

/// Render a list the way a sentence would: "A", "A and B", "A, B, and C".
/// An empty list reads as "nothing".
pub fn natural_list(items: &[String]) -> String {
    match items {
        [] => "nothing".to_string(),
        [one] => one.clone(),
        [a, b] => format!("{a} and {b}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}
