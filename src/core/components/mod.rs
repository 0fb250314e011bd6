pub mod carriage;
pub mod elevator;
pub mod part_track;

// Re-export commonly used types
pub use carriage::TransferCarriage;
pub use elevator::{ElevatorSide, ElevatorTrack};
pub use part_track::PartTrack;
