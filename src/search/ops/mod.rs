pub mod cross_exchange;
pub mod relocation_chain;
pub mod segment_move;

pub use cross_exchange::{search_cross_exchanges_from, CrossExchangeMove};
pub use relocation_chain::{search_relocation_chains_from, RelocationChainMove};
pub use segment_move::{search_segment_moves_from, SegmentMove};
