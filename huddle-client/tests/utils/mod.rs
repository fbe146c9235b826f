pub mod test_hub;

pub use fake_transport::*;
pub use test_hub::*;
