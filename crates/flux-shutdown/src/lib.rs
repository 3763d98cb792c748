pub mod coordinator;
pub mod signal;

pub use coordinator::{ShutdownCoordinator, ShutdownCoordinatorBuilder, ShutdownReport};
pub use signal::{ShutdownSignal, SignalHandler};
