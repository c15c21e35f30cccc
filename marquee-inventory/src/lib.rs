pub mod holds;
pub mod locks;
pub mod memory;
pub mod sweeper;

pub use holds::HoldManager;
pub use locks::LockManager;
pub use memory::MemoryStore;
pub use sweeper::ExpirySweeper;
