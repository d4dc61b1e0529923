use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use fluo_core as game;
use fluo_protocol::{AGENT_NEXT_MOVE_PATH, NextMoveRequest, NextMoveResponse};
use gloo::net::http::Request;
use gloo::timers::future::TimeoutFuture;
use yew::Callback;

/// Asks the agent service for moves over HTTP.
#[derive(Clone, Debug)]
pub(crate) struct HttpAgent {
    url: String,
}

impl Default for HttpAgent {
    fn default() -> Self {
        Self {
            url: AGENT_NEXT_MOVE_PATH.to_string(),
        }
    }
}

impl game::MoveAgent for HttpAgent {
    type Error = gloo::net::Error;

    fn next_move(
        &mut self,
        board: &game::BoardSnapshot,
    ) -> impl Future<Output = Result<game::AgentReply, Self::Error>> {
        let request = NextMoveRequest::from_snapshot(board);
        let url = self.url.clone();
        async move {
            let response = Request::post(&url).json(&request)?.send().await?;
            if !response.ok() {
                return Err(gloo::net::Error::GlooError(format!(
                    "agent answered with HTTP {}",
                    response.status()
                )));
            }
            let reply: NextMoveResponse = response.json().await?;
            log::trace!("agent reply: {:?}", reply);
            Ok(reply.into())
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct TimeoutDelay;

impl game::Delay for TimeoutDelay {
    fn delay(&mut self, millis: u32) -> impl Future<Output = ()> {
        TimeoutFuture::new(millis)
    }
}

/// Engine shared with the board view; asks for a redraw after each change.
pub(crate) struct WebHost {
    engine: Rc<RefCell<game::GridEngine>>,
    redraw: Callback<()>,
}

impl WebHost {
    pub(crate) fn new(engine: Rc<RefCell<game::GridEngine>>, redraw: Callback<()>) -> Self {
        Self { engine, redraw }
    }
}

impl game::EngineHost for WebHost {
    fn with_engine<R>(&mut self, f: impl FnOnce(&mut game::GridEngine) -> R) -> R {
        let (result, changed) = {
            let mut engine = self.engine.borrow_mut();
            let revision = engine.revision();
            let result = f(&mut engine);
            (result, engine.revision() != revision)
        };
        if changed {
            self.redraw.emit(());
        }
        result
    }
}

/// Runs the bot loop until it stops on its own or the mode changes.
///
/// Returns the mode epoch the loop is bound to; `on_stop` receives it along
/// with whether the agent failed.
pub(crate) fn spawn_bot(
    engine: Rc<RefCell<game::GridEngine>>,
    mode: game::ModeSwitch,
    redraw: Callback<()>,
    on_stop: Callback<(u32, bool)>,
) -> u32 {
    let driver = game::BotDriver::new(game::BotConfig::default(), mode);
    let epoch = driver.epoch();
    wasm_bindgen_futures::spawn_local(async move {
        let mut host = WebHost::new(engine, redraw);
        let mut agent = HttpAgent::default();
        let stop = driver.run(&mut host, &mut agent, &mut TimeoutDelay).await;
        log::info!("bot stopped: {:?}", stop);
        on_stop.emit((driver.epoch(), matches!(stop, game::BotStop::AgentFailed(_))));
    });
    epoch
}
