// Seams between the chain view and its collaborators
pub mod consensus;
pub mod storage_interface;

pub use consensus::*;
pub use storage_interface::*;
