pub mod catalog;
pub mod day;
pub mod dispatch;
pub mod queue;
pub mod record;
pub mod replay;
pub mod report;
pub mod resolve;
pub mod shared;
