use crate::settings::{BoardSetup, SetupView};
use crate::utils::*;
use chrono::prelude::*;
use gloo::timers::callback::Interval;
use minegrid_core as game;
use serde::{Deserialize, Serialize};
use yew::prelude::*;

/// One browser game: the engine plus the wall-clock bookkeeping the engine
/// deliberately does not own.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GameSession {
    engine: game::GameEngine,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl GameSession {
    fn new(setup: BoardSetup, seed: u64) -> Self {
        let engine = game::GameEngine::new(setup.game_config(), seed)
            .expect("setup clamp keeps the config valid");
        Self {
            engine,
            started_at: None,
            ended_at: None,
        }
    }

    /// How many seconds have passed since the first reveal, frozen once the
    /// game ends; 0 before the game starts.
    fn elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        if let Some(started_at) = self.started_at {
            (self.ended_at.unwrap_or(now) - started_at)
                .num_seconds()
                .max(0) as u32
        } else {
            0
        }
    }

    fn absorb_events(&mut self, events: &[game::GameEvent], now: DateTime<Utc>) {
        for event in events {
            match event {
                game::GameEvent::Started => {
                    self.started_at = Some(now);
                    log::debug!("started at {}", now);
                }
                game::GameEvent::Won | game::GameEvent::Lost { .. } => {
                    if self.ended_at.is_none() {
                        self.ended_at = Some(now);
                        log::debug!("ended at {}", now);
                    }
                }
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum CellMsg {
    Reveal(game::GridPos),
    ToggleFlag(game::GridPos),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum Msg {
    Cell(CellMsg),
    UpdateTime,
    NewGame(BoardSetup),
}

#[derive(Properties, Clone, PartialEq)]
struct CellProps {
    row: game::Coord,
    col: game::Coord,
    cell: game::CellState,
    #[prop_or_default]
    frozen: bool,
    callback: Callback<CellMsg>,
}

#[function_component(CellView)]
fn cell_view(props: &CellProps) -> Html {
    use game::CellState::*;

    let CellProps {
        row,
        col,
        cell,
        frozen,
        callback,
    } = props.clone();

    let class = classes!(
        "cell",
        match cell {
            Hidden => classes!(),
            Revealed(count) => classes!("open", format!("num-{}", count)),
            Flagged => classes!("flag"),
            Exploded => classes!("open", "mine", "oops"),
            Mine => classes!("open", "mine"),
            Misflagged => classes!("flag", "wrong"),
        },
        frozen.then_some("frozen"),
    );

    let onclick = {
        let callback = callback.clone();
        Callback::from(move |_: MouseEvent| {
            callback.emit(CellMsg::Reveal((row, col)));
            log::trace!("({}, {}) reveal click", row, col);
        })
    };

    let oncontextmenu = {
        let callback = callback.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            callback.emit(CellMsg::ToggleFlag((row, col)));
            log::trace!("({}, {}) flag click", row, col);
        })
    };

    html! {
        <td {class} {onclick} {oncontextmenu}/>
    }
}

#[derive(Properties, Clone, Debug, PartialEq)]
pub(crate) struct GameProps {
    #[prop_or_default]
    pub seed: Option<u64>,
}

pub(crate) struct GameView {
    setup: BoardSetup,
    session: GameSession,
    prev_time: u32,
    _timer_interval: Interval,
}

impl GameView {
    fn create_timer(ctx: &Context<Self>) -> Interval {
        let link = ctx.link().clone();
        Interval::new(250, move || link.send_message(Msg::UpdateTime))
    }

    fn reveal_cell(&mut self, pos: game::GridPos) -> bool {
        let now = utc_now();
        match self.session.engine.reveal(pos) {
            Ok(report) => {
                self.session.absorb_events(&report.events, now);
                for event in &report.events {
                    log::debug!("game event: {:?}", event);
                }
                report.has_update()
            }
            Err(err) => {
                log::debug!("reveal rejected: {}", err);
                false
            }
        }
    }

    fn toggle_flag(&mut self, pos: game::GridPos) -> bool {
        match self.session.engine.toggle_flag(pos) {
            Ok(report) => {
                if report.has_update() {
                    log::debug!("mines left: {}", report.mines_left);
                }
                report.has_update()
            }
            Err(err) => {
                log::debug!("flag rejected: {}", err);
                false
            }
        }
    }

    fn status_class(&self) -> Classes {
        use game::GameStatus::*;
        classes!(match self.session.engine.status() {
            NotStarted => "not-started",
            InProgress => "in-progress",
            Won => "win",
            Lost => "lose",
        })
    }

    fn elapsed(&self) -> u32 {
        self.session.elapsed_secs(utc_now())
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let setup = BoardSetup::default();
        let seed = ctx.props().seed.unwrap_or_else(js_random_seed);
        Self {
            setup,
            session: GameSession::new(setup, seed),
            prev_time: 0,
            _timer_interval: GameView::create_timer(ctx),
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Cell(CellMsg::Reveal(pos)) => {
                log::debug!("reveal cell: {:?}", pos);
                self.reveal_cell(pos)
            }
            Msg::Cell(CellMsg::ToggleFlag(pos)) => {
                log::debug!("flag cell: {:?}", pos);
                self.toggle_flag(pos)
            }
            Msg::UpdateTime => {
                let time = self.elapsed();
                if self.prev_time != time {
                    self.prev_time = time;
                    true
                } else {
                    false
                }
            }
            Msg::NewGame(setup) => {
                self.setup = setup;
                self.session = GameSession::new(setup, js_random_seed());
                self.prev_time = 0;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let size = self.session.engine.size();
        let frozen = self.session.engine.status().is_terminal();
        let status_class = self.status_class();
        let mines_left = self.session.engine.mines_left().to_string();
        let elapsed_time = format_elapsed(self.elapsed());
        let cb_cell = ctx.link().callback(Msg::Cell);
        let cb_new_game = {
            let setup = self.setup;
            ctx.link().callback(move |e: MouseEvent| {
                e.stop_propagation();
                Msg::NewGame(setup)
            })
        };
        let cb_setup = ctx.link().callback(Msg::NewGame);

        html! {
            <div class="minegrid" oncontextmenu={Callback::from(|e: MouseEvent| e.prevent_default())}>
                <nav>
                    <aside class="mines-left">{mines_left}</aside>
                    <span><button class={status_class} onclick={cb_new_game}/></span>
                    <aside class="timer">{elapsed_time}</aside>
                </nav>
                <table>
                    {
                        for (0..size).map(|row| html! {
                            <tr>
                                {
                                    for (0..size).map(|col| {
                                        let cell = self.session.engine.cell_at((row, col));
                                        let callback = cb_cell.clone();
                                        html! {
                                            <CellView {row} {col} {cell} {frozen} {callback}/>
                                        }
                                    })
                                }
                            </tr>
                        })
                    }
                </table>
                <SetupView setup={self.setup} onapply={cb_setup}/>
            </div>
        }
    }
}
