//! Error types for the panel hardware.

use core::fmt;

/// Errors raised while driving the panel or the voice latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelError<E> {
    /// A GPIO read or write failed.
    Pin(E),
}

// Allow `?` straight from pin operations.
impl<E> From<E> for PanelError<E> {
    fn from(error: E) -> Self {
        PanelError::Pin(error)
    }
}

impl<E: fmt::Debug> fmt::Display for PanelError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PanelError::Pin(e) => write!(f, "GPIO error: {:?}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for PanelError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            PanelError::Pin(e) => defmt::write!(f, "GPIO error: {}", e),
        }
    }
}
