use minegrid_core as game;
use serde::{Deserialize, Serialize};
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// Board parameters as edited in the setup controls.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct BoardSetup {
    pub size: game::Coord,
    pub mines: game::CellCount,
}

impl BoardSetup {
    /// Applies the caller-side clamp the engine contract requires: the mine
    /// count never exceeds `size*size - 9`.
    pub(crate) fn clamped(self) -> Self {
        let config = game::GameConfig::new(self.size, self.mines);
        Self {
            size: config.size,
            mines: config.mines,
        }
    }

    pub(crate) fn game_config(self) -> game::GameConfig {
        let Self { size, mines } = self.clamped();
        game::GameConfig::new_unchecked(size, mines)
    }
}

impl Default for BoardSetup {
    fn default() -> Self {
        Self { size: 9, mines: 10 }
    }
}

#[derive(Properties, PartialEq)]
pub(crate) struct SetupProps {
    pub setup: BoardSetup,
    pub onapply: Callback<BoardSetup>,
}

#[function_component(SetupView)]
pub(crate) fn setup_view(props: &SetupProps) -> Html {
    let size = use_state(|| props.setup.size);
    let mines = use_state(|| props.setup.mines);

    let on_size_change = {
        let size = size.clone();
        Callback::from(move |e: Event| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                if let Ok(value) = input.value().parse() {
                    size.set(value);
                }
            }
        })
    };

    let on_mines_change = {
        let mines = mines.clone();
        Callback::from(move |e: Event| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                if let Ok(value) = input.value().parse() {
                    mines.set(value);
                }
            }
        })
    };

    let on_apply = {
        let size = size.clone();
        let mines = mines.clone();
        let onapply = props.onapply.clone();
        Callback::from(move |_: MouseEvent| {
            onapply.emit(
                BoardSetup {
                    size: *size,
                    mines: *mines,
                }
                .clamped(),
            );
        })
    };

    html! {
        <fieldset class="setup">
            <label>
                {"Size"}
                <input type="number" min="1" max="30" value={size.to_string()} onchange={on_size_change}/>
            </label>
            <label>
                {"Mines"}
                <input type="number" min="0" value={mines.to_string()} onchange={on_mines_change}/>
            </label>
            <button onclick={on_apply}>{"Apply"}</button>
        </fieldset>
    }
}
