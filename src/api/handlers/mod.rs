pub mod fleet;
pub mod health;
pub mod site;
pub mod stream;
