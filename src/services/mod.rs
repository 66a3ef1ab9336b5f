//! Application operations. Handlers stay thin and call into these with an
//! explicit store, clock and caller context.

pub mod accounts;
pub mod deliveries;
