//! Asteroid Math entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlInputElement};

    use asteroid_math::sim::{
        GameEvent, GamePhase, GameState, TickInput, apply_boss_result, resolve_boss_choice, tick,
    };
    use asteroid_math::{Achievements, SessionContext, Settings, net, render};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        settings: Settings,
        session: SessionContext,
        input: TickInput,
        ctx: Option<CanvasRenderingContext2d>,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            Self {
                state: GameState::new(seed),
                settings: Settings::load(),
                session: SessionContext::default(),
                input: TickInput::default(),
                ctx: None,
            }
        }

        /// Run one simulation tick and collect this frame's events
        fn update(&mut self) -> Vec<GameEvent> {
            tick(&mut self.state, &self.input, &self.settings);
            // Clear one-shot inputs after processing
            self.input.fire = false;
            self.state.events.drain(..).collect()
        }

        /// Paint the current frame
        fn render(&self) {
            if let Some(ctx) = &self.ctx {
                render::draw(ctx, &self.state, self.settings.effective_screen_shake());
            }
        }

        /// Mirror score/lives/wave and overlay visibility into the DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            set_text(&document, "score", &self.state.score.to_string());
            set_text(&document, "wave", &self.state.wave.to_string());
            set_text(&document, "lives", &"\u{2764}".repeat(self.state.lives as usize));

            if let Some(problem) = &self.state.question {
                set_text(&document, "game-status", &format!("Solve: {}", problem.question()));
            }

            show_if(&document, "menu", self.state.phase == GamePhase::Menu);
            show_if(&document, "boss-overlay", self.state.phase == GamePhase::Boss);
            show_if(&document, "game-over", self.state.phase == GamePhase::GameOver);

            if self.state.phase == GamePhase::GameOver {
                let summary = self.state.run_summary();
                set_text(&document, "final-score", &summary.score.to_string());
                set_text(&document, "final-wave", &summary.wave.to_string());
                set_text(&document, "final-accuracy", &format!("{}%", summary.accuracy));
                let title = if summary.victory {
                    "Mission Complete!"
                } else {
                    "Mission Failed!"
                };
                set_text(&document, "game-over-title", title);
            }
        }

        /// Reset for a fresh run
        fn restart(&mut self, seed: u64) {
            self.state = GameState::new(seed);
            self.input = TickInput::default();
            self.state.start();
            log::info!("New run with seed {seed}");
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn show_if(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "overlay" } else { "overlay hidden" });
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Asteroid Math starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("game-canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .expect("2d context")
            .expect("2d context missing")
            .dyn_into()
            .expect("not a 2d context");

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        game.borrow_mut().ctx = Some(ctx);

        log::info!("Game initialized with seed: {seed}");

        setup_input_handlers(game.clone());
        setup_menu_buttons(game.clone());

        request_animation_frame(game);

        log::info!("Asteroid Math running!");
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::once(move |_time: f64| {
            game_loop(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// One tick per rendered frame
    fn game_loop(game: Rc<RefCell<Game>>) {
        let events = {
            let mut g = game.borrow_mut();
            let events = g.update();
            g.render();
            g.update_hud();
            events
        };

        handle_events(&game, events);
        request_animation_frame(game);
    }

    fn handle_events(game: &Rc<RefCell<Game>>, events: Vec<GameEvent>) {
        for event in events {
            match event {
                GameEvent::BossRequested(request) => {
                    let document = web_sys::window().and_then(|w| w.document());
                    if let Some(document) = &document {
                        set_text(document, "boss-story", "Generating boss encounter...");
                        set_text(document, "boss-problem", "");
                        clear_children(document, "boss-answers");
                    }

                    let (epoch, session) = {
                        let g = game.borrow();
                        (g.state.boss_epoch, g.session.clone())
                    };
                    let game = game.clone();
                    spawn_local(async move {
                        let result = net::request_boss_encounter(&request, &session).await;
                        apply_boss_result(&mut game.borrow_mut().state, epoch, result);
                    });
                }
                GameEvent::BossReady => {
                    show_boss_encounter(game);
                }
                GameEvent::RunEnded(summary) => {
                    let mut achievements = Achievements::load();
                    achievements.record_run(summary.score, summary.wave, summary.accuracy);
                    achievements.save();
                    log::info!(
                        "Run over: score {} wave {} accuracy {}% (victory: {})",
                        summary.score,
                        summary.wave,
                        summary.accuracy,
                        summary.victory
                    );
                }
                _ => {}
            }
        }
    }

    /// Fill the boss overlay with the validated encounter
    fn show_boss_encounter(game: &Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(encounter) = game.borrow().state.boss.clone() else {
            return;
        };

        set_text(&document, "boss-story", &encounter.story);
        set_text(&document, "boss-problem", &encounter.problem);
        clear_children(&document, "boss-answers");

        let Some(container) = document.get_element_by_id("boss-answers") else {
            return;
        };

        for &choice in &encounter.choices {
            let Ok(button) = document.create_element("button") else {
                continue;
            };
            let _ = button.set_attribute("class", "boss-answer-btn");
            button.set_text_content(Some(&choice.to_string()));

            let game = game.clone();
            let success = encounter.success_message.clone();
            let fail = encounter.fail_message.clone();
            let correct_answer = encounter.correct_answer;
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                resolve_boss_choice(&mut g.state, choice);
                let message = if choice == correct_answer {
                    format!("{success} (answer: {correct_answer})")
                } else {
                    format!("{fail} (answer: {correct_answer}, you chose {choice})")
                };
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    set_text(&document, "game-status", &message);
                }
            });
            let _ = button
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();

            let _ = container.append_child(&button);
        }
    }

    fn clear_children(document: &Document, id: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_inner_html("");
        }
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" => {
                        event.prevent_default();
                        g.input.left = true;
                    }
                    "ArrowRight" => {
                        event.prevent_default();
                        g.input.right = true;
                    }
                    " " => {
                        event.prevent_default();
                        if !event.repeat() {
                            g.input.fire = true;
                        }
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" => g.input.left = false,
                    "ArrowRight" => g.input.right = false,
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_menu_buttons(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Start button: pick up the player name, leave the menu
        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                if let Some(input) = web_sys::window()
                    .and_then(|w| w.document())
                    .and_then(|d| d.get_element_by_id("player-name"))
                    .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                {
                    let name = input.value().trim().to_string();
                    if !name.is_empty() {
                        g.session.player_name = name;
                    }
                }
                g.state.start();
                log::info!("Run started for {}", g.session.player_name);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Restart button on the game-over screen
        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                game.borrow_mut().restart(seed);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Asteroid Math (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    smoke_run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless autopilot session: aims at the correct asteroid, answers
/// every boss with the fallback encounter. Exercises the full phase
/// machine without a browser.
#[cfg(not(target_arch = "wasm32"))]
fn smoke_run() {
    use asteroid_math::Settings;
    use asteroid_math::sim::{
        BossError, GamePhase, GameState, TickInput, apply_boss_result, resolve_boss_choice, tick,
    };

    let settings = Settings::default();
    let mut state = GameState::new(0xA57E_201D);
    state.start();

    for _ in 0..100_000u32 {
        match state.phase {
            GamePhase::Playing => {
                let target = state
                    .asteroids
                    .iter()
                    .find(|a| a.is_correct)
                    .map(|a| a.pos.x);
                let input = match target {
                    Some(x) if (x - state.ship.x).abs() < 3.0 => TickInput {
                        fire: true,
                        ..Default::default()
                    },
                    Some(x) => TickInput {
                        left: x < state.ship.x,
                        right: x > state.ship.x,
                        ..Default::default()
                    },
                    None => TickInput::default(),
                };
                tick(&mut state, &input, &settings);
            }
            GamePhase::Boss => {
                let epoch = state.boss_epoch;
                if state.boss.is_none() {
                    // No network on the CLI: force the fallback path
                    apply_boss_result(
                        &mut state,
                        epoch,
                        Err(BossError::Request("headless".to_string())),
                    );
                }
                let answer = state.boss.as_ref().map(|b| b.correct_answer).unwrap_or(0);
                resolve_boss_choice(&mut state, answer);
            }
            _ => break,
        }
        state.events.clear();
    }

    let summary = state.run_summary();
    log::info!(
        "Smoke run finished: score {} wave {} accuracy {}% victory {}",
        summary.score,
        summary.wave,
        summary.accuracy,
        summary.victory
    );
}
