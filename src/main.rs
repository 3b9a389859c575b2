//! Numby's Number Factory entry point
//!
//! Native: a headless autoplay demo, `numby-factory [seed] [launches]`.
//! Web: wires the `#pegboard` element, the animation frame loop and the
//! browser collaborators.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use js_sys::Function;
    use wasm_bindgen::prelude::*;
    use web_sys::{Element, KeyboardEvent, MouseEvent};

    use numby_factory::GameError;
    use numby_factory::audio::WebAudioNotifier;
    use numby_factory::game::Game;
    use numby_factory::platform::Collaborators;
    use numby_factory::platform::web::{ConsoleMessages, JsRenderer, JsShop, LocalStorageStore};
    use numby_factory::sim::{Aim, GamePhase, RewardChoice, TickInput};

    /// The simulation is tuned per tick at 60 Hz
    const SIM_DT: f64 = 1.0 / 60.0;
    const MAX_SUBSTEPS: u32 = 4;
    const LAUNCH_POWER: f32 = 75.0;
    const ANCHOR_ID: &str = "pegboard";

    thread_local! {
        static SHELL: RefCell<Option<Rc<RefCell<Shell>>>> = const { RefCell::new(None) };
    }

    struct Shell {
        game: Game,
        input: TickInput,
        accumulator: f64,
        last_time: f64,
    }

    impl Shell {
        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0).min(0.1)
            } else {
                SIM_DT
            };
            self.last_time = time;
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.game.tick(&self.input);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // One-shot commands only apply to the first substep
                self.input.launch = None;
                self.input.reward = None;
                self.input.restart = false;
            }
            if substeps == MAX_SUBSTEPS {
                self.accumulator = 0.0;
            }
        }

        /// Aim from the launch point at a click on the board element
        fn click(&mut self, anchor: &Element, event: &MouseEvent) {
            if self.game.run().phase() != &GamePhase::Aiming {
                return;
            }
            let rect = anchor.get_bounding_client_rect();
            if rect.width() <= 0.0 || rect.height() <= 0.0 {
                return;
            }
            let board = self.game.run().board().size();
            let target = glam::Vec2::new(
                ((f64::from(event.client_x()) - rect.left()) / rect.width()) as f32 * board.x,
                ((f64::from(event.client_y()) - rect.top()) / rect.height()) as f32 * board.y,
            );
            let from = self.game.run().character().pos;
            self.input.launch = Some(Aim::toward(from, target, LAUNCH_POWER));
        }

        fn key(&mut self, key: &str) {
            match key {
                "1" | "2" | "3" | "4" | "5" => {
                    let index = key.parse::<usize>().map_or(0, |n| n - 1);
                    self.input.reward = Some(RewardChoice::Take(index));
                }
                "s" | "S" => self.input.reward = Some(RewardChoice::Skip),
                "r" | "R" => self.input.restart = true,
                "i" | "I" => {
                    self.input.autoplay = !self.input.autoplay;
                    log::info!("Autoplay: {}", self.input.autoplay);
                }
                _ => {}
            }
        }
    }

    /// Page-supplied callback `window[name]`, or a no-op
    fn page_callback(window: &web_sys::Window, name: &str) -> Function {
        js_sys::Reflect::get(window, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.dyn_into::<Function>().ok())
            .unwrap_or_else(|| {
                log::warn!("window.{name} is not defined, ignoring its output");
                Function::new_no_args("")
            })
    }

    /// Answer the reward shop from page script
    #[wasm_bindgen(js_name = chooseReward)]
    pub fn choose_reward(index: usize) -> Result<(), JsValue> {
        SHELL.with(|shell| {
            let shell = shell.borrow();
            let Some(shell) = shell.as_ref() else {
                return Err(JsValue::from_str("game is not running"));
            };
            shell
                .borrow_mut()
                .game
                .choose_reward(index)
                .map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&JsValue::from_str(&format!("logger already set: {e}")));
        }

        log::info!("Numby's Number Factory starting...");

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let anchor = document
            .get_element_by_id(ANCHOR_ID)
            .ok_or_else(|| JsValue::from_str(&GameError::MissingAnchor(ANCHOR_ID.to_string()).to_string()))?;

        let io = Collaborators {
            renderer: Box::new(JsRenderer::new(
                page_callback(&window, "numbyRender"),
                page_callback(&window, "numbyEffect"),
            )),
            audio: Box::new(WebAudioNotifier::new()),
            store: Box::new(LocalStorageStore::new()),
            messages: Box::new(ConsoleMessages),
            shop: Box::new(JsShop::new(page_callback(&window, "numbyShop"))),
        };

        let seed = js_sys::Date::now() as u64;
        let shell = Rc::new(RefCell::new(Shell {
            game: Game::load(seed, io),
            input: TickInput::default(),
            accumulator: 0.0,
            last_time: 0.0,
        }));
        log::info!("Game initialized with seed: {seed}");

        {
            let shell = shell.clone();
            let target = anchor.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                shell.borrow_mut().click(&target, &event);
            });
            anchor.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let shell = shell.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                shell.borrow_mut().key(&event.key());
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        SHELL.with(|s| *s.borrow_mut() = Some(shell.clone()));
        request_animation_frame(shell);

        log::info!("Numby's Number Factory running!");
        Ok(())
    }

    fn request_animation_frame(shell: Rc<RefCell<Shell>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            shell.borrow_mut().update(time);
            request_animation_frame(shell);
        });
        if let Err(e) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            log::error!("requestAnimationFrame failed: {e:?}");
        }
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use numby_factory::game::Game;
    use numby_factory::platform::{Collaborators, MessageSink};
    use numby_factory::sim::{GamePhase, TickInput};
    use numby_factory::tuning::Tuning;

    const DEFAULT_SEED: u64 = 12345;
    const DEFAULT_LAUNCHES: u32 = 50;
    /// Upper bound on ticks per launch before giving up
    const TICKS_PER_LAUNCH: u64 = 60 * 120;

    /// Player messages go to the log
    struct LogMessages;

    impl MessageSink for LogMessages {
        fn add_message(&mut self, text: &str) {
            log::info!("{text}");
        }
    }

    fn parse_arg<T: std::str::FromStr>(arg: Option<String>, default: T, name: &str) -> T {
        match arg {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid {name} {raw:?}");
                default
            }),
        }
    }

    pub fn run() {
        let mut args = std::env::args().skip(1);
        let seed = parse_arg(args.next(), DEFAULT_SEED, "seed");
        let launches = parse_arg(args.next(), DEFAULT_LAUNCHES, "launch count");

        log::info!("Numby's Number Factory (native) starting with seed {seed}, {launches} launches");

        let io = Collaborators {
            messages: Box::new(LogMessages),
            ..Collaborators::headless()
        };
        let mut game = Game::new(Tuning::default(), seed, io);
        let input = TickInput {
            autoplay: true,
            ..Default::default()
        };

        let mut launched = 0;
        let mut was_aiming = true;
        let max_ticks = u64::from(launches.max(1)) * TICKS_PER_LAUNCH;
        for _ in 0..max_ticks {
            game.tick(&input);
            let in_flight = game.run().phase() == &GamePhase::InFlight;
            if was_aiming && in_flight {
                launched += 1;
            }
            was_aiming = !in_flight;
            if game.run().is_over() || (launched >= launches && !in_flight) {
                break;
            }
        }

        let state = game.run().state();
        println!("seed {seed}: {launched} launches");
        println!(
            "day {}  score {}/{}  lives {}/{}  run score {}",
            state.day,
            state.current_score,
            state.quota,
            state.lives,
            state.max_lives,
            game.run_score()
        );
        let items: Vec<String> = game
            .run()
            .items()
            .items()
            .iter()
            .map(|i| format!("{} L{}", i.id, i.level))
            .collect();
        if !items.is_empty() {
            println!("items: {}", items.join(", "));
        }
        if game.run().is_over() {
            println!("game over");
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The wasm entry point is wasm_main
}
