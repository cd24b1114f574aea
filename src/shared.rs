//! Sharing tables between mainline code and interrupt handlers
//!
//! The registry, the default handler and the EXTI table are read by interrupt
//! handlers and modified from mainline code. [`Shared`] puts them behind a
//! critical section: a drain loop runs to completion inside one, and a
//! mutation either happens entirely before it or entirely after it.
//!
//! Handlers run inside the critical section of the dispatch that invoked
//! them. Trying to lock the same table again from a handler fails with
//! [`Busy`] instead of aliasing it.

use core::cell::RefCell;
use critical_section::Mutex;

/// The table is already locked further up the call stack
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Busy;

/// Value guarded by a critical section
pub struct Shared<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> Shared<T> {
    /// Wraps `value`; usable in `static` initializers.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Runs `f` with exclusive access to the value inside a critical
    /// section.
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, Busy> {
        critical_section::with(|cs| {
            let mut value = self.inner.borrow(cs).try_borrow_mut().map_err(|_| Busy)?;
            Ok(f(&mut value))
        })
    }

    /// Unwraps the value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner().into_inner()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::DataPolicy;
    use crate::device::DeviceId;
    use crate::dispatch::Dispatcher;
    use crate::exti::{Pin, PinTable};
    use crate::header::RxHeader;
    use crate::registry::RxLocation;

    type Handler = fn(RxLocation, &RxHeader, &[u8]);
    type PinFn = fn(&Pin<u8>, u32, Option<&mut ()>);

    static DISPATCHER: Shared<Dispatcher<Handler, 4>> = Shared::new(Dispatcher::new());
    static EXTI: Shared<PinTable<u8, (), PinFn>> = Shared::new(PinTable::new(DataPolicy::Preserve));

    fn ignore(_: RxLocation, _: &RxHeader, _: &[u8]) {}

    #[test]
    fn statics_are_usable() {
        let len = DISPATCHER
            .lock(|d| d.registry().len())
            .unwrap();
        assert_eq!(len, 0);

        fn on_pin(_: &Pin<u8>, _: u32, _: Option<&mut ()>) {}
        let pin = Pin::new(0, 1 << 3);
        EXTI.lock(|t| t.register(pin, on_pin as PinFn)).unwrap().unwrap();
        assert_eq!(EXTI.lock(|t| t.on_interrupt(1 << 3)), Ok(true));
        assert_eq!(EXTI.lock(|t| t.counter(&pin)), Ok(Ok(1)));
    }

    #[test]
    fn nested_lock_is_busy() {
        let shared: Shared<Dispatcher<Handler, 2>> = Shared::new(Dispatcher::new());
        let nested = shared.lock(|_| shared.lock(|d| d.registry().len()));
        assert_eq!(nested, Ok(Err(Busy)));

        let registry = shared.into_inner();
        assert!(registry.registry().is_empty());
    }

    #[test]
    fn mutation_is_visible_to_later_locks() {
        let shared: Shared<crate::registry::Registry<Handler, 2>> = Shared::new(Default::default());
        let handle = shared
            .lock(|r| r.add(DeviceId(0), 1, RxLocation::RxFifo1, ignore as Handler))
            .unwrap()
            .unwrap();
        assert_eq!(shared.lock(|r| r.contains(handle)), Ok(true));
        assert!(shared.lock(|r| r.remove(handle)).unwrap().is_ok());
        assert_eq!(shared.lock(|r| r.len()), Ok(0));
    }
}
