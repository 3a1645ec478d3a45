pub mod amount;
pub mod config;
pub mod csv;
pub mod ledger;
pub mod model;
pub mod split;

pub use amount::{Amount, Rate};
pub use config::Config;
pub use ledger::Ledger;
pub use model::{AgentId, CommissionSplit, Deal, DealType, Event, SplitRecord, TxId};
pub use split::{split_commission, split_deal};
