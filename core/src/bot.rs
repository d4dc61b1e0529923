//! Bot play: an external agent suggests moves which are fed to the engine
//! through the same single-step entry point manual play uses.
//!
//! A [`BotDriver`] belongs to one bot session: the [`ModeSwitch`] epoch at
//! construction. Every mode change starts a new epoch, and the loop re-checks
//! its own after every suspension. A reply that arrives after the user left
//! bot play is dropped even if bot play was picked again in the meantime.
//! Pointer input is gated on the same switch, which keeps the engine to one
//! writer at a time.

use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::future::Future;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayMode {
    #[default]
    Manual,
    Bot,
}

#[derive(Debug, Default)]
struct ModeState {
    mode: Cell<PlayMode>,
    epoch: Cell<u32>,
}

/// Play mode shared between the UI, the pointer tracker and the bot loop.
#[derive(Clone, Debug, Default)]
pub struct ModeSwitch(Rc<ModeState>);

impl ModeSwitch {
    pub fn new(mode: PlayMode) -> Self {
        let switch = Self::default();
        switch.0.mode.set(mode);
        switch
    }

    pub fn get(&self) -> PlayMode {
        self.0.mode.get()
    }

    /// Counts mode changes. Setting the current mode again keeps the epoch.
    pub fn epoch(&self) -> u32 {
        self.0.epoch.get()
    }

    pub fn set(&self, mode: PlayMode) {
        let previous = self.0.mode.replace(mode);
        if previous != mode {
            self.0.epoch.set(self.epoch().wrapping_add(1));
            log::debug!("play mode {:?} -> {:?}", previous, mode);
        }
    }

    pub fn is_bot(&self) -> bool {
        self.get() == PlayMode::Bot
    }
}

/// A step suggested by the agent: continue the flow whose frontier is `from`
/// onto `to`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotMove {
    pub from: CellIndex,
    pub to: CellIndex,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AgentReply {
    Move(BotMove),
    NoMoreMoves,
    Solved,
}

/// Source of suggested moves, usually a remote service.
pub trait MoveAgent {
    type Error: fmt::Display;

    fn next_move(
        &mut self,
        board: &BoardSnapshot,
    ) -> impl Future<Output = Result<AgentReply, Self::Error>>;
}

/// Timer used between agent requests.
pub trait Delay {
    fn delay(&mut self, millis: u32) -> impl Future<Output = ()>;
}

/// Gives the bot loop short, synchronous access to the engine.
///
/// The closure never spans an `.await`, so the engine is free whenever the
/// loop is suspended.
pub trait EngineHost {
    fn with_engine<R>(&mut self, f: impl FnOnce(&mut GridEngine) -> R) -> R;
}

impl EngineHost for GridEngine {
    fn with_engine<R>(&mut self, f: impl FnOnce(&mut GridEngine) -> R) -> R {
        f(self)
    }
}

impl EngineHost for Rc<RefCell<GridEngine>> {
    fn with_engine<R>(&mut self, f: impl FnOnce(&mut GridEngine) -> R) -> R {
        f(&mut self.borrow_mut())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Pause before each agent request.
    pub poll_delay_ms: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self { poll_delay_ms: 500 }
    }
}

/// Why the bot loop returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotStop<E> {
    /// The mode switched away from bot play.
    Cancelled,
    /// The agent has no further moves.
    Exhausted,
    Solved,
    AgentFailed(E),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiscardReason {
    InvalidCell,
    /// No flow occupies the `from` cell.
    NoFlow,
    /// `from` is not where the flow currently ends.
    NotFrontier,
    /// The engine refused the step.
    Rejected,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BotStep {
    Applied(MoveOutcome),
    Discarded(DiscardReason),
}

#[derive(Clone, Debug)]
pub struct BotDriver {
    config: BotConfig,
    mode: ModeSwitch,
    epoch: u32,
}

impl BotDriver {
    /// Binds the driver to the current mode epoch. Once the mode changes the
    /// driver stays cancelled; bot play picked again needs a new driver.
    pub fn new(config: BotConfig, mode: ModeSwitch) -> Self {
        let epoch = mode.epoch();
        Self {
            config,
            mode,
            epoch,
        }
    }

    pub fn config(&self) -> BotConfig {
        self.config
    }

    pub fn mode(&self) -> &ModeSwitch {
        &self.mode
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Whether this driver's session is still the live bot session.
    pub fn is_active(&self) -> bool {
        self.mode.is_bot() && self.mode.epoch() == self.epoch
    }

    /// Plays agent moves until cancelled, solved, out of moves or the agent
    /// fails. A failed request never reaches the engine.
    pub async fn run<H, A, D>(&self, host: &mut H, agent: &mut A, delay: &mut D) -> BotStop<A::Error>
    where
        H: EngineHost,
        A: MoveAgent,
        D: Delay,
    {
        log::info!("bot play started");
        loop {
            if !self.is_active() {
                log::info!("bot play cancelled");
                return BotStop::Cancelled;
            }
            if host.with_engine(|engine| engine.is_solved()) {
                return BotStop::Solved;
            }

            delay.delay(self.config.poll_delay_ms).await;
            if !self.is_active() {
                log::info!("bot play cancelled");
                return BotStop::Cancelled;
            }

            let snapshot = host.with_engine(|engine| engine.snapshot());
            let reply = match agent.next_move(&snapshot).await {
                Ok(reply) => reply,
                Err(err) => {
                    log::error!("agent request failed: {}", err);
                    return BotStop::AgentFailed(err);
                }
            };
            if !self.is_active() {
                log::debug!("dropping {:?}, bot play ended while waiting", reply);
                return BotStop::Cancelled;
            }

            match reply {
                AgentReply::Move(bot_move) => {
                    match host.with_engine(|engine| Self::apply(engine, bot_move)) {
                        BotStep::Applied(MoveOutcome::Solved) => return BotStop::Solved,
                        BotStep::Applied(_) => {}
                        BotStep::Discarded(reason) => {
                            log::warn!("discarded agent move {:?}: {:?}", bot_move, reason);
                        }
                    }
                }
                AgentReply::NoMoreMoves => {
                    log::info!("agent has no more moves");
                    return BotStop::Exhausted;
                }
                AgentReply::Solved => {
                    log::info!("agent reports the puzzle solved");
                    return BotStop::Solved;
                }
            }
        }
    }

    /// Feeds one suggested move to `engine`, provided `from` is the frontier
    /// of the flow it belongs to. An endpoint whose flow has no path yet
    /// starts one first. A discarded move leaves the engine untouched.
    pub fn apply(engine: &mut GridEngine, bot_move: BotMove) -> BotStep {
        let BotMove { from, to } = bot_move;
        let color = match engine.cell(from) {
            Ok(status) if status.color().is_flow() => status.color(),
            Ok(_) => return BotStep::Discarded(DiscardReason::NoFlow),
            Err(_) => return BotStep::Discarded(DiscardReason::InvalidCell),
        };

        if engine.path(color).is_none() {
            return Self::start_and_step(engine, color, from, to);
        }
        if engine.frontier(color) != Some(from) {
            return BotStep::Discarded(DiscardReason::NotFrontier);
        }
        match engine.extend_or_retract(color, to) {
            Ok(MoveOutcome::NoChange) => BotStep::Discarded(DiscardReason::Rejected),
            Ok(outcome) => BotStep::Applied(outcome),
            Err(_) => BotStep::Discarded(DiscardReason::InvalidCell),
        }
    }

    /// Starts `color` at the endpoint `from` and steps onto `to`. The step is
    /// checked up front so a refused move never leaves a lone start behind.
    fn start_and_step(engine: &mut GridEngine, color: Color, from: CellIndex, to: CellIndex) -> BotStep {
        let target = match engine.cell(to) {
            Ok(status) => status,
            Err(_) => return BotStep::Discarded(DiscardReason::InvalidCell),
        };
        let width = engine.size().1;
        let enterable = match target {
            CellStatus::Empty => true,
            CellStatus::Endpoint(other) => other == color && to != from,
            CellStatus::PathSegment(..) => false,
        };
        if engine.is_solved()
            || !enterable
            || !is_adjacent(to_coords(from, width), to_coords(to, width))
        {
            return BotStep::Discarded(DiscardReason::Rejected);
        }

        let started = match engine.extend_or_retract(color, from) {
            Ok(outcome) => outcome,
            Err(_) => return BotStep::Discarded(DiscardReason::InvalidCell),
        };
        match engine.extend_or_retract(color, to) {
            Ok(outcome) => BotStep::Applied(started | outcome),
            Err(_) => BotStep::Discarded(DiscardReason::InvalidCell),
        }
    }
}
