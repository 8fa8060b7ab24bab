pub mod arbitrage;
pub mod balance;
pub mod broker;
pub mod dispatch;
pub mod engine;
pub mod flow;
pub mod parameters;
pub mod record;
pub mod reservoir;
pub mod retention;
pub mod settlement;
pub mod step;
pub mod summary;
