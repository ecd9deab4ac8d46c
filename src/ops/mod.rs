//! Façade operations on [`crate::areas::repository::Repository`], one file
//! per operation. Each is a synchronous pipeline over the areas; multi-step
//! operations expose partial failure instead of rolling back.

pub mod branch;
pub mod checkout;
pub mod clone;
pub mod commit;
pub mod fetch;
pub mod head;
pub mod init;
pub mod push;
pub mod remote;
pub mod tag;
