//! Lane Runner entry point
//!
//! Browser builds wire DOM events to the game and run it from
//! `requestAnimationFrame`. Native builds run a headless autopilot session.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Document, HtmlMediaElement, HtmlSelectElement, KeyboardEvent, TouchEvent};

    use lane_runner::assets::{
        AssetError, AssetHandle, AssetKey, AssetProvider, LoadCompletion, LoadTicket,
    };
    use lane_runner::scene::{FrameSnapshot, SceneRenderer};
    use lane_runner::sim::GameEvent;
    use lane_runner::{Game, Selection, Settings, Tuning};

    // Page-side loader and scene. Handles are numbers owned by the page.
    #[wasm_bindgen(inline_js = "
        const cache = new Map();
        let nextHandle = 1;

        export function load_asset(path) {
            if (!window.laneRunnerScene || !window.laneRunnerScene.load) {
                return Promise.reject(new Error('no scene loader on page'));
            }
            return window.laneRunnerScene.load(path).then((asset) => {
                const handle = nextHandle++;
                cache.set(handle, asset);
                return handle;
            });
        }

        // scenery and instances are packed 28-byte records:
        // position xyz, yaw (f32), id, tag, handle (u32)
        export function draw_frame(scenery, instances, eye, target, background, dt) {
            if (window.laneRunnerScene && window.laneRunnerScene.draw) {
                window.laneRunnerScene.draw({
                    scenery, instances, eye, target, background, dt, assets: cache,
                });
            }
        }
    ")]
    extern "C" {
        fn load_asset(path: &str) -> js_sys::Promise;
        fn draw_frame(
            scenery: &[u8],
            instances: &[u8],
            eye: &[f32],
            target: &[f32],
            background: Option<String>,
            dt: f32,
        );
    }

    type Completions = Rc<RefCell<Vec<LoadCompletion>>>;

    /// Loads through the page's loader; completions queue up until polled
    #[derive(Default)]
    struct JsAssets {
        done: Completions,
    }

    impl AssetProvider for JsAssets {
        fn request(&mut self, ticket: LoadTicket, key: AssetKey) {
            let done = self.done.clone();
            let path = key.path();
            wasm_bindgen_futures::spawn_local(async move {
                let result = match JsFuture::from(load_asset(&path)).await {
                    Ok(value) => value
                        .as_f64()
                        .map(|h| AssetHandle(h as u32))
                        .ok_or_else(|| AssetError::Load {
                            path: path.clone(),
                            reason: "loader returned no handle".to_string(),
                        }),
                    Err(err) => Err(AssetError::Load {
                        path: path.clone(),
                        reason: err
                            .as_string()
                            .unwrap_or_else(|| format!("{:?}", err)),
                    }),
                };
                done.borrow_mut().push(LoadCompletion {
                    ticket,
                    key,
                    result,
                });
            });
        }

        fn poll(&mut self) -> Vec<LoadCompletion> {
            std::mem::take(&mut *self.done.borrow_mut())
        }
    }

    /// Hands each snapshot to the page's scene
    struct JsRenderer;

    impl SceneRenderer for JsRenderer {
        fn draw(&mut self, frame: &FrameSnapshot) {
            draw_frame(
                &frame.scenery_bytes(),
                frame.instance_bytes(),
                &frame.camera_eye.to_array(),
                &frame.camera_target.to_array(),
                frame.background.clone(),
                frame.dt,
            );
        }
    }

    type SharedGame = Rc<RefCell<Game<JsAssets, JsRenderer>>>;

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Lane Runner starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let settings = Settings::load();
        apply_settings(&document, &settings);

        let seed = js_sys::Date::now() as u64;
        let game: SharedGame = Rc::new(RefCell::new(Game::new(
            seed,
            Tuning::default(),
            JsAssets::default(),
            JsRenderer,
        )));
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(game.clone());
        setup_start_button(&document, game.clone());
        setup_dark_toggle(&document);

        request_animation_frame(game);

        log::info!("Lane Runner running!");
    }

    fn apply_settings(document: &Document, settings: &Settings) {
        if let Some(select) = select_element(document, "characterSelect") {
            select.set_value(&settings.character);
        }
        if let Some(select) = select_element(document, "themeSelect") {
            select.set_value(&settings.theme);
        }
        if settings.dark_mode {
            if let Some(body) = document.body() {
                let _ = body.class_list().add_1("dark");
            }
        }
        if let Some(music) = music(document) {
            music.set_volume(settings.music_volume as f64);
        }
    }

    fn select_element(document: &Document, id: &str) -> Option<HtmlSelectElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    fn music(document: &Document) -> Option<HtmlMediaElement> {
        document.get_element_by_id("bgMusic")?.dyn_into().ok()
    }

    fn setup_start_button(document: &Document, game: SharedGame) {
        let Some(btn) = document.get_element_by_id("startBtn") else {
            log::warn!("No start button on page");
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let mut settings = Settings::load();
            if let Some(select) = select_element(&document, "characterSelect") {
                settings.character = select.value();
            }
            if let Some(select) = select_element(&document, "themeSelect") {
                settings.theme = select.value();
            }
            settings.save();

            game.borrow_mut().start(&Selection::from(&settings));

            if let Some(el) = document.get_element_by_id("start-screen") {
                let _ = el.class_list().remove_1("active");
            }
            if let Some(music) = music(&document) {
                // Autoplay may be refused; the game runs silent then
                let _ = music.play();
            }
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_dark_toggle(document: &Document) {
        let Some(toggle) = document.get_element_by_id("darkToggle") else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(body) = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.body())
            else {
                return;
            };
            let dark = body.class_list().toggle("dark").unwrap_or(false);
            let mut settings = Settings::load();
            settings.dark_mode = dark;
            settings.save();
        });
        let _ = toggle.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_input_handlers(game: SharedGame) {
        let window = web_sys::window().unwrap();

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                if g.input_mut().key_down(&event.key()) {
                    event.prevent_default();
                } else if event.key() == "i" || event.key() == "I" {
                    let idle = !g.idle_mode();
                    g.set_idle_mode(idle);
                    log::info!("Idle mode: {}", idle);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().input_mut().key_up(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start (swipe origin, two-finger jump)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if let Some(touch) = event.changed_touches().get(0) {
                    game.borrow_mut()
                        .input_mut()
                        .touch_start(touch.screen_x() as f32, event.touches().length());
                }
            });
            let _ = window
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end (swipe)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                let x = event
                    .changed_touches()
                    .get(0)
                    .map(|t| t.screen_x() as f32)
                    .unwrap_or_default();
                game.borrow_mut()
                    .input_mut()
                    .touch_end(x, js_sys::Date::now());
            });
            let _ = window
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur releases held keys
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().input_mut().clear();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: SharedGame) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |_time: f64| {
            game_loop(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: SharedGame) {
        // Same clock as the touch handlers so swipe release times line up
        let events = game.borrow_mut().frame(js_sys::Date::now());
        for event in events {
            if let GameEvent::GameOver { final_score } = event {
                show_game_over(final_score);
            }
        }
        request_animation_frame(game);
    }

    fn show_game_over(final_score: u64) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(el) = document.get_element_by_id("finalScore") {
            el.set_text_content(Some(&final_score.to_string()));
        }
        if let Some(el) = document.get_element_by_id("game-over") {
            let _ = el.class_list().add_1("active");
        }
        if let Some(music) = music(&document) {
            let _ = music.pause();
        }
        log::info!("Game over, final score {}", final_score);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use lane_runner::assets::InstantAssets;
    use lane_runner::consts::SIM_DT;
    use lane_runner::scene::NullRenderer;
    use lane_runner::{Game, Selection, Tuning};

    /// Headless session length (one minute at 60 fps)
    const FRAMES: u32 = 3600;

    env_logger::init();
    log::info!("Lane Runner (native) starting headless autopilot run...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match load_tuning(&path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::error!("Bad tuning file {}: {} (using defaults)", path, e);
                Tuning::default()
            }
        },
        None => Tuning::default(),
    };

    let mut game = Game::new(0x5EED, tuning, InstantAssets::new(), NullRenderer::default());
    game.set_idle_mode(true);
    game.start(&Selection::default());

    let frame_ms = SIM_DT as f64 * 1000.0;
    let mut coins = 0;
    for frame in 0..FRAMES {
        for event in game.frame(frame as f64 * frame_ms) {
            if matches!(event, lane_runner::sim::GameEvent::CoinCollected { .. }) {
                coins += 1;
            }
        }
        if game.is_over() {
            break;
        }
    }

    let state = game.state();
    log::info!(
        "Ran {} ticks, {} coins, {} frames drawn",
        state.time_ticks,
        coins,
        game.renderer().frames
    );
    match serde_json::to_string_pretty(&state.session) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Could not serialize session: {}", e),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn load_tuning(path: &str) -> Result<lane_runner::Tuning, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(lane_runner::Tuning::from_json(&json)?)
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
