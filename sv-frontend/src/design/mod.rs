//! Design components built from parsed files: module definitions, their
//! signals and modports.

mod modport;
mod module_definition;
mod port_net_holder;
mod signal;

pub use self::modport::ModPort;
pub use self::module_definition::{ClockingBlock, ModuleDefinition, ModuleKind};
pub use self::port_net_holder::{HandleKind, PortNetHolder, PortNetStore};
pub use self::signal::Signal;
