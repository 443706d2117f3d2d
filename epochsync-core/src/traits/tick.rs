//! Tick Source Abstraction for Embedded Systems
//!
//! The system clock advances its epoch-seconds estimate from a free-running
//! millisecond counter. This module defines that counter as a trait so the
//! clock can run on a hardware timer, an RTOS tick, `std::time::Instant`,
//! or a hand-driven counter in tests.
//!
//! ## Design Goals
//!
//! - **Platform Independence**: Works on bare metal, RTOS, and Linux
//! - **Testability**: Inject a manual counter instead of overriding a method
//! - **Efficiency**: Zero allocation, one read per call
//!
//! ## Common Implementations
//!
//! - `ManualTicks`: Counter advanced by hand, for tests and simulations
//! - `StdTicks`: Milliseconds since construction (requires `std`)

/// Raw tick counter value in milliseconds
///
/// Wraps at `u32::MAX`. Only the low 16 bits are ever retained by the
/// system clock, so any counter at least 16 bits wide works.
pub type Ticks = u32;

/// Free-running millisecond counter
///
/// ## Implementation Requirements
///
/// - `now()` must advance by one per elapsed millisecond
/// - Wraparound at the word width is expected and must not be corrected
/// - Reads must never fail; there is no error path
///
/// ## Example Implementation
///
/// ```rust
/// use epochsync_core::traits::{TickSource, Ticks};
///
/// struct SysTick {
///     // ... timer peripheral
/// }
///
/// impl TickSource for SysTick {
///     fn now(&self) -> Ticks {
///         // Read the millisecond counter maintained by the SysTick ISR
///         0 // placeholder
///     }
/// }
/// ```
///
/// ## Platform-Specific Considerations
///
/// ### Bare Metal (no_std)
/// - Increment a counter from a 1 kHz timer interrupt
/// - Ensure the read is atomic with respect to the ISR
///
/// ### Linux/Unix
/// - Use a monotonic clock, never the wall clock
pub trait TickSource {
    /// Current counter value in milliseconds
    fn now(&self) -> Ticks;

    /// Resolution of the counter in milliseconds
    fn precision_ms(&self) -> u32 {
        1
    }
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now(&self) -> Ticks {
        (**self).now()
    }

    fn precision_ms(&self) -> u32 {
        (**self).precision_ms()
    }
}
