//! EXTI (pin change) callback table
//!
//! All GPIO ports share 16 external interrupt lines, one per pin number. The
//! table holds one binding per line: the registered pin, its handler, a
//! trigger counter and optional user data. The shared interrupt vector is
//! demultiplexed by [`PinTable::on_interrupt`], which receives the pin mask
//! of the line that fired.

use crate::config::{DataPolicy, EXTI_LINES};

/// GPIO pin: port plus single-bit pin mask (`1 << pin_number`)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin<P> {
    /// Port the pin belongs to
    pub port: P,
    /// Pin mask with exactly one bit set
    pub mask: u16,
}

impl<P> Pin<P> {
    /// Pin `mask` of `port`.
    pub const fn new(port: P, mask: u16) -> Self {
        Self { port, mask }
    }

    /// EXTI line of the pin, see [`line_of`].
    pub fn line(&self) -> Option<usize> {
        line_of(self.mask)
    }
}

/// EXTI line selected by a pin mask: the position of its lowest set bit.
///
/// Masks are expected to have exactly one bit set; higher bits of a
/// multi-bit mask are ignored. A zero mask selects no line.
pub fn line_of(mask: u16) -> Option<usize> {
    if mask == 0 {
        None
    } else {
        Some(mask.trailing_zeros() as usize)
    }
}

/// Receiver of pin interrupts
///
/// Implemented for every `FnMut(&Pin<P>, u32, Option<&mut D>)`.
pub trait PinHandler<P, D> {
    /// Called on every trigger of the bound line with the number of
    /// triggers since registration (or the last counter reset), starting
    /// at 1.
    fn on_trigger(&mut self, pin: &Pin<P>, counter: u32, data: Option<&mut D>);
}

impl<P, D, F> PinHandler<P, D> for F
where
    F: FnMut(&Pin<P>, u32, Option<&mut D>),
{
    fn on_trigger(&mut self, pin: &Pin<P>, counter: u32, data: Option<&mut D>) {
        self(pin, counter, data)
    }
}

/// Pin mask selects no EXTI line
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidPin;

struct Line<P, D, H> {
    pin: Option<Pin<P>>,
    counter: u32,
    data: Option<D>,
    handler: Option<H>,
}

impl<P, D, H> Line<P, D, H> {
    const VACANT: Self = Self {
        pin: None,
        counter: 0,
        data: None,
        handler: None,
    };
}

/// Handler table for the 16 EXTI lines
pub struct PinTable<P, D, H> {
    lines: [Line<P, D, H>; EXTI_LINES],
    policy: DataPolicy,
}

impl<P, D, H> PinTable<P, D, H> {
    /// Creates a table with no bindings.
    pub const fn new(policy: DataPolicy) -> Self {
        Self {
            lines: [Line::<P, D, H>::VACANT; EXTI_LINES],
            policy,
        }
    }

    fn line_mut(&mut self, mask: u16) -> Result<&mut Line<P, D, H>, InvalidPin> {
        let index = line_of(mask).ok_or(InvalidPin)?;
        self.lines.get_mut(index).ok_or(InvalidPin)
    }

    fn line(&self, mask: u16) -> Result<&Line<P, D, H>, InvalidPin> {
        let index = line_of(mask).ok_or(InvalidPin)?;
        self.lines.get(index).ok_or(InvalidPin)
    }

    /// Binds `handler` to the line of `pin` and resets its counter. A
    /// previous binding of the line, from any port, is overwritten. User
    /// data is kept or dropped according to the table's [`DataPolicy`].
    pub fn register(&mut self, pin: Pin<P>, handler: H) -> Result<(), InvalidPin> {
        let policy = self.policy;
        let line = self.line_mut(pin.mask)?;
        line.pin = Some(pin);
        line.handler = Some(handler);
        line.counter = 0;
        if policy == DataPolicy::Clear {
            line.data = None;
        }
        Ok(())
    }

    /// Clears the binding of the line of `pin` and resets its counter.
    /// Returns the handler that was bound.
    pub fn unregister(&mut self, pin: &Pin<P>) -> Result<Option<H>, InvalidPin> {
        let policy = self.policy;
        let line = self.line_mut(pin.mask)?;
        line.pin = None;
        line.counter = 0;
        if policy == DataPolicy::Clear {
            line.data = None;
        }
        Ok(line.handler.take())
    }

    /// Binds user data to the line of `pin`, independently of its handler.
    /// Returns the data it replaces.
    pub fn set_data(&mut self, pin: &Pin<P>, data: D) -> Result<Option<D>, InvalidPin> {
        Ok(self.line_mut(pin.mask)?.data.replace(data))
    }

    /// Removes the user data of the line of `pin`.
    pub fn take_data(&mut self, pin: &Pin<P>) -> Result<Option<D>, InvalidPin> {
        Ok(self.line_mut(pin.mask)?.data.take())
    }

    /// Zeroes the trigger counter of the line of `pin`.
    pub fn reset_counter(&mut self, pin: &Pin<P>) -> Result<(), InvalidPin> {
        self.line_mut(pin.mask)?.counter = 0;
        Ok(())
    }

    /// Trigger counter of the line of `pin`
    pub fn counter(&self, pin: &Pin<P>) -> Result<u32, InvalidPin> {
        Ok(self.line(pin.mask)?.counter)
    }

    /// `true` if the line of `pin` has both a pin and a handler bound
    pub fn is_registered(&self, pin: &Pin<P>) -> bool {
        self.line(pin.mask)
            .map(|l| l.pin.is_some() && l.handler.is_some())
            .unwrap_or(false)
    }

    /// User data policy of the table
    pub fn policy(&self) -> DataPolicy {
        self.policy
    }
}

impl<P, D, H: PinHandler<P, D>> PinTable<P, D, H> {
    /// Shared EXTI interrupt for the line selected by `mask`.
    ///
    /// If the line is bound, increments its counter and invokes the handler
    /// with the new value. Interrupts of unbound lines are absorbed. Returns
    /// `true` if a handler ran.
    pub fn on_interrupt(&mut self, mask: u16) -> bool {
        let Ok(line) = self.line_mut(mask) else {
            log::debug!("EXTI interrupt without pin mask");
            return false;
        };
        let Line {
            pin: Some(pin),
            handler: Some(handler),
            counter,
            data,
        } = line
        else {
            log::debug!("spurious EXTI interrupt, mask {:#06x}", mask);
            return false;
        };
        *counter = counter.wrapping_add(1);
        log::trace!("EXTI line {} trigger #{}", mask.trailing_zeros(), counter);
        handler.on_trigger(pin, *counter, data.as_mut());
        true
    }
}
