use crate::{device, exti, registry};
pub use can_common_core::{ClassicCan as _, FdCan as _};
pub use device::Device as _;
pub use exti::PinHandler as _;
pub use registry::RxHandler as _;
