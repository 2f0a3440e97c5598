pub mod intake;
pub mod wizard;
