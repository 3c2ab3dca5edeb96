mod derangement;

pub use derangement::{derange, DerangementError, DerangementPolicy};
