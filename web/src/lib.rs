use clap::Parser;
use fluo_core as game;
use game::LevelGenerator;
use wasm_bindgen::prelude::*;

#[cfg(feature = "bot-runtime")]
mod agent;
mod board;
mod utils;

#[derive(Parser, Debug, Default)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Level token to play, as produced by a previous session
    level: Option<String>,

    /// Play a built-in level
    #[arg(short, long)]
    preset: Option<u8>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Start in bot mode
    #[arg(long)]
    bot: bool,
}

impl Args {
    fn from_fragment(fragment: &str) -> Result<Self, clap::Error> {
        Self::try_parse_from(fragment.split(['#', '&']))
    }

    /// Token first, then preset, then a freshly generated level.
    fn choose_level(&self, random_seed: impl FnOnce() -> u64) -> game::Level {
        if let Some(token) = &self.level {
            match game::decode(token) {
                Ok(level) => return level,
                Err(err) => log::warn!("ignoring level token {:?}: {}", token, err),
            }
        }
        if let Some(number) = self.preset {
            match game::preset(number) {
                Some(level) => return level,
                None => log::warn!("no preset {}, there are {}", number, game::PRESET_COUNT),
            }
        }

        let seed = self.seed.unwrap_or_else(random_seed);
        log::debug!("seed: {}", seed);
        game::RandomLevelGenerator::new(seed).generate(game::GeneratorConfig::default())
    }
}

#[wasm_bindgen(start)]
pub fn run_app() {
    use gloo::utils::{document, window};

    #[cfg(feature = "console_error_panic_hook")]
    {
        console_error_panic_hook::set_once();
    }

    let location_hash = window().location().hash().unwrap_or_default();
    let (args, parse_error) = match Args::from_fragment(&location_hash) {
        Ok(args) => (args, None),
        Err(err) => (Args::default(), Some(err)),
    };
    if let Some(log_level) = args.verbose.log_level() {
        if let Err(err) = console_log::init_with_level(log_level) {
            gloo::console::error!(format!("Error initializing logger: {}", err));
        }
    }
    if let Some(err) = parse_error {
        log::warn!("could not parse fragment {:?}: {}", location_hash, err);
    }

    let level = args.choose_level(utils::js_random_seed);
    utils::write_fragment(&game::encode(&level));

    let Some(root) = document().get_element_by_id("game") else {
        log::error!("Could not find id=\"game\" element");
        return;
    };

    log::debug!("App started");
    let props = board::BoardProps {
        level,
        bot: args.bot,
    };
    yew::Renderer::<board::BoardView>::with_root_and_props(root, props).render();
}
