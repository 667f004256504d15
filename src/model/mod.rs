pub mod card;
pub mod event;
pub mod issue;
