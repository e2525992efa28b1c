//! Discrete-event kernel: clock generators, an event queue, and the
//! delta-cycle settling loop around a [`DutModel`].
//!
//! The kernel is the scheduler primitive the harness suspends on. Control
//! returns to the caller only from [`SimKernel::await_rising_edge`] and
//! [`SimKernel::advance`], and only after every registered and combinational
//! effect of the processed edges has settled.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use garuda_common::{Logic, LogicVec};

use crate::dut::{DutModel, PortIo};
use crate::error::SimError;
use crate::time::SimTime;
use crate::value::{PortDirection, SimSignalId, SimSignalState};

/// Delta cycles allowed in one settling pass before the DUT is declared
/// combinationally unstable.
const MAX_DELTAS_PER_STEP: u32 = 1_000;

/// A scheduled clock transition.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SimEvent {
    /// When the transition happens (femtoseconds).
    fs: u64,
    /// Insertion order, breaking ties between events at the same time.
    seq: u64,
    /// The clock signal that toggles.
    signal: SimSignalId,
    /// Generation of the clock that scheduled this event; stale events are dropped.
    generation: u64,
}

impl PartialOrd for SimEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.fs.cmp(&other.fs).then(self.seq.cmp(&other.seq))
    }
}

/// A free-running clock generator.
#[derive(Debug, Clone, Copy)]
struct ClockGen {
    half_period_fs: u64,
    generation: u64,
}

/// What processing one event produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Rising(SimSignalId),
    Falling,
    Stale,
}

/// The simulation kernel wrapping one DUT.
pub struct SimKernel {
    current_time: SimTime,
    event_queue: BinaryHeap<Reverse<SimEvent>>,
    next_seq: u64,
    signals: Vec<SimSignalState>,
    by_name: HashMap<String, SimSignalId>,
    clocks: HashMap<SimSignalId, ClockGen>,
    clock_generation: u64,
    rising_edges: HashMap<SimSignalId, u64>,
    dut: Box<dyn DutModel>,
    edge_timeout: Option<u64>,
    max_delta_per_step: u32,
}

impl SimKernel {
    /// Builds a kernel around a DUT, declaring one signal per DUT port.
    ///
    /// Every port starts at all-X.
    pub fn new(dut: Box<dyn DutModel>) -> Result<Self, SimError> {
        let mut signals = Vec::new();
        let mut by_name = HashMap::new();
        for decl in dut.ports() {
            let id = SimSignalId::from_raw(signals.len() as u32);
            if by_name.insert(decl.name.clone(), id).is_some() {
                return Err(SimError::DuplicatePort(decl.name));
            }
            signals.push(SimSignalState::new_unknown(decl));
        }
        log::debug!("kernel built for '{}' with {} ports", dut.name(), signals.len());

        let mut kernel = Self {
            current_time: SimTime::zero(),
            event_queue: BinaryHeap::new(),
            next_seq: 0,
            signals,
            by_name,
            clocks: HashMap::new(),
            clock_generation: 0,
            rising_edges: HashMap::new(),
            dut,
            edge_timeout: None,
            max_delta_per_step: MAX_DELTAS_PER_STEP,
        };
        kernel.settle()?;
        Ok(kernel)
    }

    /// Sets the deadline for each [`await_rising_edge`](Self::await_rising_edge) call.
    pub fn set_edge_timeout(&mut self, timeout_fs: u64) {
        self.edge_timeout = Some(timeout_fs);
    }

    /// Returns the current simulation time.
    pub fn current_time(&self) -> SimTime {
        self.current_time
    }

    /// Name of the wrapped DUT.
    pub fn dut_name(&self) -> &str {
        self.dut.name()
    }

    /// Finds a port by name.
    pub fn find_signal(&self, name: &str) -> Option<SimSignalId> {
        self.by_name.get(name).copied()
    }

    /// Number of rising edges processed on `clock` since it was last started.
    pub fn rising_edge_count(&self, clock: &str) -> u64 {
        self.find_signal(clock)
            .and_then(|id| self.rising_edges.get(&id).copied())
            .unwrap_or(0)
    }

    /// Samples the current value of any port.
    pub fn read(&self, name: &str) -> Result<&LogicVec, SimError> {
        let id = self.lookup(name)?;
        Ok(&self.signals[id.index()].value)
    }

    /// Writes an unsigned bit pattern to an input port and settles.
    ///
    /// Values wider than the port's declared width are rejected.
    pub fn write(&mut self, name: &str, value: u64) -> Result<(), SimError> {
        let width = self.input_decl_width(name)?;
        if width < 64 && value >> width != 0 {
            return Err(SimError::WidthMismatch {
                port: name.to_string(),
                width,
                value,
            });
        }
        self.write_logic(name, LogicVec::from_u64(value, width))
    }

    /// Drives a full 4-state vector onto an input port and settles.
    pub fn write_logic(&mut self, name: &str, value: LogicVec) -> Result<(), SimError> {
        let width = self.input_decl_width(name)?;
        if value.width() != width {
            return Err(SimError::VectorWidth {
                port: name.to_string(),
                expected: width,
                actual: value.width(),
            });
        }
        let id = self.lookup(name)?;
        if self.clocks.contains_key(&id) {
            return Err(SimError::PortDrivenByClock(name.to_string()));
        }
        if self.signals[id.index()].update(value) {
            self.settle()?;
        }
        Ok(())
    }

    /// Starts a free-running clock on a 1-bit input port.
    ///
    /// The clock is driven low immediately and rises half a period later.
    /// Restarting a running clock discards its pending transitions.
    pub fn start_clock(&mut self, name: &str, period_fs: u64) -> Result<(), SimError> {
        let width = self.input_decl_width(name)?;
        if width != 1 || period_fs < 2 {
            return Err(SimError::InvalidClockPeriod {
                port: name.to_string(),
                period_fs,
            });
        }
        let id = self.lookup(name)?;
        self.clock_generation += 1;
        let clock = ClockGen {
            half_period_fs: period_fs / 2,
            generation: self.clock_generation,
        };
        self.clocks.insert(id, clock);
        self.rising_edges.insert(id, 0);
        if self.signals[id.index()].update(LogicVec::from_bool(false)) {
            self.settle()?;
        }
        self.schedule(id, clock, self.current_time.fs + clock.half_period_fs);
        log::debug!(
            "clock '{name}' started at {} with period {period_fs} fs",
            self.current_time
        );
        Ok(())
    }

    /// Runs until the next rising edge of `clock` has been processed and
    /// everything it triggers has settled. Returns the edge time.
    ///
    /// Fails with [`SimError::EdgeTimeout`] if the edge would arrive later
    /// than the configured deadline; simulation time is left unchanged then.
    pub fn await_rising_edge(&mut self, clock: &str) -> Result<SimTime, SimError> {
        let target = self.lookup(clock)?;
        if !self.clocks.contains_key(&target) {
            return Err(SimError::ClockNotRunning(clock.to_string()));
        }
        let start_fs = self.current_time.fs;

        loop {
            let Some(Reverse(next)) = self.event_queue.peek() else {
                return Err(SimError::ClockNotRunning(clock.to_string()));
            };
            if let Some(timeout) = self.edge_timeout {
                if next.fs > start_fs.saturating_add(timeout) {
                    return Err(SimError::EdgeTimeout {
                        clock: clock.to_string(),
                        waited_fs: timeout,
                    });
                }
            }
            if let Some(Reverse(event)) = self.event_queue.pop() {
                if self.process(event)? == Transition::Rising(target) {
                    return Ok(self.current_time);
                }
            }
            if !self.clocks.contains_key(&target) {
                return Err(SimError::ClockNotRunning(clock.to_string()));
            }
        }
    }

    /// Advances simulation time by `duration_fs`, processing every clock
    /// transition that falls inside the window.
    pub fn advance(&mut self, duration_fs: u64) -> Result<SimTime, SimError> {
        let end_fs = self.current_time.fs.saturating_add(duration_fs);
        while let Some(Reverse(next)) = self.event_queue.peek() {
            if next.fs > end_fs {
                break;
            }
            if let Some(Reverse(event)) = self.event_queue.pop() {
                self.process(event)?;
            }
        }
        self.current_time = self.current_time.advance_to(end_fs);
        Ok(self.current_time)
    }

    fn process(&mut self, event: SimEvent) -> Result<Transition, SimError> {
        let Some(clock) = self.clocks.get(&event.signal).copied() else {
            return Ok(Transition::Stale);
        };
        if clock.generation != event.generation {
            return Ok(Transition::Stale);
        }
        if event.fs > self.current_time.fs {
            self.current_time = self.current_time.advance_to(event.fs);
        }

        let sig = &mut self.signals[event.signal.index()];
        let rising = sig.value.get(0) != Logic::One;
        sig.update(LogicVec::from_bool(rising));
        self.schedule(event.signal, clock, event.fs + clock.half_period_fs);

        if !rising {
            self.settle()?;
            return Ok(Transition::Falling);
        }

        *self.rising_edges.entry(event.signal).or_insert(0) += 1;
        let name = self.signals[event.signal.index()].decl.name.clone();
        {
            let mut io = PortIo::new(&mut self.signals, &self.by_name);
            self.dut.rising_edge(&name, &mut io)?;
        }
        self.settle()?;
        Ok(Transition::Rising(event.signal))
    }

    /// Re-evaluates the DUT until its outputs stop changing.
    fn settle(&mut self) -> Result<(), SimError> {
        let mut deltas = 0u32;
        loop {
            let changed = {
                let mut io = PortIo::new(&mut self.signals, &self.by_name);
                self.dut.evaluate(&mut io)?;
                io.changed()
            };
            if !changed {
                return Ok(());
            }
            deltas += 1;
            self.current_time = self.current_time.next_delta();
            if deltas >= self.max_delta_per_step {
                return Err(SimError::DeltaCycleLimit {
                    fs: self.current_time.fs,
                    max_deltas: self.max_delta_per_step,
                });
            }
        }
    }

    fn schedule(&mut self, signal: SimSignalId, clock: ClockGen, fs: u64) {
        self.next_seq += 1;
        self.event_queue.push(Reverse(SimEvent {
            fs,
            seq: self.next_seq,
            signal,
            generation: clock.generation,
        }));
    }

    fn lookup(&self, name: &str) -> Result<SimSignalId, SimError> {
        self.find_signal(name)
            .ok_or_else(|| SimError::UnknownPort(name.to_string()))
    }

    fn input_decl_width(&self, name: &str) -> Result<u32, SimError> {
        let id = self.lookup(name)?;
        let decl = &self.signals[id.index()].decl;
        if decl.direction != PortDirection::Input {
            return Err(SimError::NotAnInput(name.to_string()));
        }
        Ok(decl.width)
    }
}

impl std::fmt::Debug for SimKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimKernel")
            .field("dut", &self.dut.name())
            .field("current_time", &self.current_time)
            .field("signals", &self.signals.len())
            .field("clocks", &self.clocks.len())
            .finish()
    }
}
