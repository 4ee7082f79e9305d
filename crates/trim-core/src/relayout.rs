//! Debounce bookkeeping for the shared resize/scroll listener
//!
//! The browser side arms one timer per event. Each timer carries the ticket
//! it was issued; only the latest ticket is still current when it fires, so
//! a burst of resize events yields a single fan-out.

/// Ticket identifying one scheduled relayout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer {
    delay_ms: u32,
    generation: u64,
    fired: u64,
}

impl Debouncer {
    pub fn new(delay_ms: u32) -> Self {
        Self {
            delay_ms,
            generation: 0,
            fired: 0,
        }
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// Supersede every earlier ticket and issue a new one
    pub fn schedule(&mut self) -> Ticket {
        self.generation = self.generation.wrapping_add(1);
        Ticket(self.generation)
    }

    /// Called when a timer fires. Returns true if this ticket is the latest
    /// one and has not fired before.
    pub fn fire(&mut self, ticket: Ticket) -> bool {
        if ticket.0 != self.generation || self.fired == ticket.0 {
            return false;
        }
        self.fired = ticket.0;
        true
    }

    /// Whether a scheduled relayout has not fired yet
    pub fn is_pending(&self) -> bool {
        self.generation != self.fired
    }

    /// Drop whatever is scheduled; outstanding timers become no-ops
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.fired = self.generation;
    }
}
