pub mod money;
pub mod signature;
pub mod time;
pub mod validation;
