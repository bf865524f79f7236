pub mod address;
pub mod signature;
pub mod typed_data;

pub use address::Address;
pub use signature::{recover_address, Signature};
pub use typed_data::{domain_separator, wallet_verification_hash, Eip712Domain};
