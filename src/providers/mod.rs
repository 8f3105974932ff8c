pub mod iex;

pub use iex::IexProvider;
