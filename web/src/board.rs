use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;
use fluo_core as game;
use game::{CellStatus, Color, LevelGenerator, PlayMode, PointerPos};
use web_sys::{Element, HtmlSelectElement};
use yew::prelude::*;

use crate::utils::*;

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq)]
    struct PointerButtons: u16 {
        const PRIMARY   = 1;
        const SECONDARY = 1 << 1;
        const MIDDLE    = 1 << 2;
    }
}

fn pointer_pos(e: &PointerEvent) -> PointerPos {
    PointerPos::new(e.client_x() as f32, e.client_y() as f32)
}

/// SVG `points` for a path through cell centers, in cell units, optionally
/// trailing off to where the pointer is.
fn polyline_points(cells: &[game::CellIndex], width: game::Coord, tail: Option<(f32, f32)>) -> String {
    let centers = cells.iter().map(|&cell| {
        let (row, col) = game::to_coords(cell, width);
        (f32::from(col) + 0.5, f32::from(row) + 0.5)
    });
    centers
        .chain(tail)
        .map(|(x, y)| format!("{},{}", x, y))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Properties, Clone, PartialEq)]
pub(crate) struct BoardProps {
    pub level: game::Level,
    #[prop_or_default]
    pub bot: bool,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Msg {
    PointerDown(PointerPos),
    PointerMove(PointerPos),
    PointerUp,
    SetMode(PlayMode),
    NewLevel,
    Reset,
    Redraw,
    /// A bot loop ended; `epoch` is the mode epoch it was started in.
    BotStopped { epoch: u32, failed: bool },
}

pub(crate) struct BoardView {
    engine: Rc<RefCell<game::GridEngine>>,
    tracker: game::PointerTracker,
    mode: game::ModeSwitch,
    board_ref: NodeRef,
    /// Mode epoch of the live bot loop, if any.
    bot_epoch: Option<u32>,
}

impl BoardView {
    fn load_level(&mut self, level: game::Level) {
        write_fragment(&game::encode(&level));
        let engine = game::GridEngine::new(level);
        self.tracker = game::PointerTracker::for_engine(&engine, self.tracker.layout())
            .gated_by(self.mode.clone());
        // replaced in place, a running bot keeps the same handle
        *self.engine.borrow_mut() = engine;
    }

    /// Reads the board's on-screen geometry into the tracker.
    fn sync_layout(&mut self) {
        let Some(element) = self.board_ref.cast::<Element>() else {
            return;
        };
        let rect = element.get_bounding_client_rect();
        let (_, width) = self.tracker.size();
        self.tracker.set_layout(game::BoardLayout {
            origin_x: rect.left() as f32,
            origin_y: rect.top() as f32,
            cell_size: rect.width() as f32 / f32::from(width),
        });
    }

    #[cfg(feature = "bot-runtime")]
    fn start_bot(&mut self, ctx: &Context<Self>) {
        // an older loop sees the epoch change and stops on its own
        if self.bot_epoch == Some(self.mode.epoch()) {
            return;
        }
        let epoch = crate::agent::spawn_bot(
            Rc::clone(&self.engine),
            self.mode.clone(),
            ctx.link().callback(|_| Msg::Redraw),
            ctx.link()
                .callback(|(epoch, failed): (u32, bool)| Msg::BotStopped { epoch, failed }),
        );
        self.bot_epoch = Some(epoch);
    }

    #[cfg(not(feature = "bot-runtime"))]
    fn start_bot(&mut self, _ctx: &Context<Self>) {
        log::warn!("built without bot-runtime, staying in manual mode");
        self.mode.set(PlayMode::Manual);
    }

    fn view_status(&self, engine: &game::GridEngine) -> Html {
        if engine.is_solved() {
            return html! { <aside class="solved">{"Solved!"}</aside> };
        }
        let level = engine.level();
        let connected = level
            .colors()
            .filter(|&color| engine.is_complete(color))
            .count();
        html! { <aside>{format!("{}/{} flows", connected, level.flow_count())}</aside> }
    }

    fn view_paths(&self, engine: &game::GridEngine) -> Html {
        let (height, width) = engine.size();
        let layout = self.tracker.layout();
        let overlay = self.tracker.overlay(engine);

        let lines = engine.paths().map(|(color, path)| {
            let tail = overlay
                .as_ref()
                .filter(|overlay| overlay.color == color)
                .map(|overlay| {
                    (
                        (overlay.pointer.x - layout.origin_x) / layout.cell_size,
                        (overlay.pointer.y - layout.origin_y) / layout.cell_size,
                    )
                });
            let points = polyline_points(path.cells(), width, tail);
            html! { <polyline {points} stroke={color.css()} /> }
        });

        html! {
            <svg class="paths" viewBox={format!("0 0 {} {}", width, height)}>
                { for lines }
            </svg>
        }
    }
}

impl Component for BoardView {
    type Message = Msg;
    type Properties = BoardProps;

    fn create(ctx: &Context<Self>) -> Self {
        let props = ctx.props();
        let mode = game::ModeSwitch::default();
        let engine = game::GridEngine::new(props.level.clone());
        let tracker = game::PointerTracker::for_engine(&engine, Default::default())
            .gated_by(mode.clone());
        if props.bot {
            ctx.link().send_message(Msg::SetMode(PlayMode::Bot));
        }

        Self {
            engine: Rc::new(RefCell::new(engine)),
            tracker,
            mode,
            board_ref: NodeRef::default(),
            bot_epoch: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        match msg {
            PointerDown(pos) => {
                self.sync_layout();
                let outcome = self.tracker.begin(&mut self.engine.borrow_mut(), pos);
                log::trace!("pointer down at {:?}: {:?}", pos, outcome);
                outcome.has_update() || self.tracker.is_dragging()
            }
            PointerMove(pos) => {
                if !self.tracker.is_dragging() {
                    return false;
                }
                let outcome = self.tracker.move_to(&mut self.engine.borrow_mut(), pos);
                if outcome == game::MoveOutcome::Solved {
                    log::info!("solved by hand");
                }
                true
            }
            PointerUp => self.tracker.end(),
            SetMode(mode) => {
                self.mode.set(mode);
                if mode == PlayMode::Bot {
                    self.tracker.end();
                    self.start_bot(ctx);
                }
                true
            }
            NewLevel => {
                self.mode.set(PlayMode::Manual);
                let level = game::RandomLevelGenerator::new(js_random_seed())
                    .generate(game::GeneratorConfig::default());
                self.load_level(level);
                true
            }
            Reset => {
                self.tracker.end();
                self.engine.borrow_mut().reset();
                true
            }
            Redraw => true,
            BotStopped { epoch, failed } => {
                if self.bot_epoch != Some(epoch) {
                    log::debug!("bot loop of epoch {} wound down", epoch);
                    return false;
                }
                self.bot_epoch = None;
                if failed {
                    log::warn!("agent unavailable, back to manual play");
                }
                self.mode.set(PlayMode::Manual);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let engine = self.engine.borrow();
        let (_, width) = engine.size();
        let hints = self
            .tracker
            .dragged_color()
            .map(|color| engine.legal_steps(color))
            .unwrap_or_default();

        let cells = engine.cells().map(|(cell, status)| {
            let (kind, color) = match status {
                CellStatus::Empty => ("empty", Color::None),
                CellStatus::Endpoint(color) => ("endpoint", color),
                CellStatus::PathSegment(color, _) => ("segment", color),
            };
            let style = color
                .is_flow()
                .then(|| format!("--flow: {}", color.css()));
            let class = classes!("cell", kind, hints.contains(&cell).then_some("hint"));
            html! { <div {class} {style} /> }
        });

        let onpointerdown = ctx.link().batch_callback(|e: PointerEvent| {
            if !PointerButtons::from_bits_truncate(e.buttons()).contains(PointerButtons::PRIMARY) {
                return None;
            }
            if let Some(target) = e.target_dyn_into::<Element>() {
                if let Err(err) = target.set_pointer_capture(e.pointer_id()) {
                    log::trace!("pointer capture failed: {:?}", err);
                }
            }
            Some(Msg::PointerDown(pointer_pos(&e)))
        });
        let onpointermove = ctx
            .link()
            .callback(|e: PointerEvent| Msg::PointerMove(pointer_pos(&e)));
        let onpointerup = ctx.link().callback(|_: PointerEvent| Msg::PointerUp);
        let onpointercancel = ctx.link().callback(|_: PointerEvent| Msg::PointerUp);

        let bot = self.mode.is_bot();
        let onchange = ctx.link().callback(|e: Event| {
            match e.target_unchecked_into::<HtmlSelectElement>().value().as_str() {
                "bot" => Msg::SetMode(PlayMode::Bot),
                _ => Msg::SetMode(PlayMode::Manual),
            }
        });
        let cb_new_level = ctx.link().callback(|_| Msg::NewLevel);
        let cb_reset = ctx.link().callback(|_| Msg::Reset);

        html! {
            <div class={classes!("fluo", bot.then_some("bot"))}>
                <nav>
                    <select {onchange}>
                        <option value="manual" selected={!bot}>{"Manual"}</option>
                        <option value="bot" selected={bot}>{"Bot"}</option>
                    </select>
                    <button onclick={cb_reset}>{"Reset"}</button>
                    <button onclick={cb_new_level}>{"New level"}</button>
                    { self.view_status(&engine) }
                </nav>
                <div
                    class="board"
                    ref={self.board_ref.clone()}
                    style={format!("grid-template-columns: repeat({}, 1fr); touch-action: none", width)}
                    {onpointerdown}
                    {onpointermove}
                    {onpointerup}
                    {onpointercancel}
                >
                    { for cells }
                    { self.view_paths(&engine) }
                </div>
            </div>
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polyline_runs_through_cell_centers() {
        assert_eq!(polyline_points(&[0, 1, 4], 3, None), "0.5,0.5 1.5,0.5 1.5,1.5");
        assert_eq!(
            polyline_points(&[2], 3, Some((2.25, 1.75))),
            "2.5,0.5 2.25,1.75"
        );
        assert_eq!(polyline_points(&[], 3, None), "");
    }

    #[test]
    fn only_the_primary_button_draws() {
        assert!(PointerButtons::from_bits_truncate(1).contains(PointerButtons::PRIMARY));
        assert!(!PointerButtons::from_bits_truncate(2).contains(PointerButtons::PRIMARY));
        assert!(
            PointerButtons::from_bits_truncate(0b11)
                .contains(PointerButtons::PRIMARY | PointerButtons::SECONDARY)
        );
    }
}
