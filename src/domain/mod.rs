mod cell;
mod directory;
mod ledger;
mod money;
mod poule;
mod totals;

pub use cell::*;
pub use directory::*;
pub use ledger::*;
pub use money::*;
pub use poule::*;
pub use totals::*;
