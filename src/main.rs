//! Skyline Siege entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::HtmlCanvasElement;

    use skyline_siege::Settings;
    use skyline_siege::consts::*;
    use skyline_siege::renderer::SdfRenderState;
    use skyline_siege::sim::{GameState, RoundPhase, TickInput, tick};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        settings: Settings,
        render_state: Option<SdfRenderState>,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            Self {
                state: GameState::new(seed),
                settings: Settings::load(),
                render_state: None,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(MAX_FRAME_DT);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input;
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.fire = false;
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            // Calculate FPS from oldest to newest frame
            let oldest_idx = self.frame_index;
            let oldest_time = self.frame_times[oldest_idx];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.state, &self.settings, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let window = web_sys::window().unwrap();
            let document = window.document().unwrap();

            // Health readouts
            for (idx, gorilla) in self.state.gorillas.iter().enumerate() {
                let selector = format!("#hud-p{} .hud-value", idx + 1);
                if let Some(el) = document.query_selector(&selector).ok().flatten() {
                    el.set_text_content(Some(&format!("{:.0}", gorilla.health)));
                }
            }

            // Match score
            if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                let text = format!(
                    "{} : {}",
                    self.state.players[0].score, self.state.players[1].score
                );
                el.set_text_content(Some(&text));
            }

            // Active player's aim
            let shooter = &self.state.players[self.state.active_player];
            if let Some(el) = document.query_selector("#hud-angle .hud-value").ok().flatten() {
                el.set_text_content(Some(&format!("{:.0}\u{b0}", shooter.aim_angle)));
            }
            if let Some(el) = document.query_selector("#hud-power .hud-value").ok().flatten() {
                el.set_text_content(Some(&format!("{:.0}", shooter.power)));
            }
            if let Some(el) = document.query_selector("#hud-shots .hud-value").ok().flatten() {
                el.set_text_content(Some(&shooter.shots.to_string()));
            }

            // Whose turn, round clock, status
            if let Some(el) = document.query_selector("#hud-turn .hud-value").ok().flatten() {
                el.set_text_content(Some(&format!("Player {}", self.state.active_player + 1)));
            }
            if let Some(el) = document.query_selector("#hud-time .hud-value").ok().flatten() {
                el.set_text_content(Some(&format!("{:.0}s", self.state.elapsed_secs)));
            }
            if let Some(el) = document.get_element_by_id("hud-status") {
                el.set_text_content(Some(&self.state.status_line()));
            }

            // FPS (toggled with KeyF)
            if let Some(el) = document.get_element_by_id("hud-fps") {
                if self.settings.show_fps {
                    let _ = el.set_attribute("class", "hud-item");
                    if let Some(val) = document.query_selector("#hud-fps .hud-value").ok().flatten()
                    {
                        val.set_text_content(Some(&self.fps.to_string()));
                    }
                } else {
                    let _ = el.set_attribute("class", "hud-item hidden");
                }
            }

            // Round banner between rounds
            if let Some(el) = document.get_element_by_id("round-banner") {
                if matches!(self.state.phase, RoundPhase::RoundOver { .. }) {
                    let _ = el.set_attribute("class", "");
                    el.set_text_content(Some(&self.state.status_line()));
                } else {
                    let _ = el.set_attribute("class", "hidden");
                }
            }
        }

        /// Reset to a fresh match
        fn restart(&mut self, seed: u64) {
            self.state = GameState::new(seed);
            self.accumulator = 0.0;
            self.input = TickInput::default();
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Skyline Siege starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize game
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));

        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let mut render_state = SdfRenderState::new(surface, &adapter, width, height).await;
        render_state.set_start_time(js_sys::Date::now());
        game.borrow_mut().render_state = Some(render_state);

        // Set up input handlers
        setup_input_handlers(game.clone());

        // Set up rematch button
        setup_rematch_button(game.clone());

        // Keep the frame clock sane across tab switches
        setup_visibility_handler(game.clone());

        // Show HUD
        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        // Start game loop
        request_animation_frame(game);

        log::info!("Skyline Siege running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        // Keydown: held aim keys, one-shot fire, settings toggles
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.code().as_str() {
                    "ArrowUp" => {
                        g.input.angle_up = true;
                        event.prevent_default();
                    }
                    "ArrowDown" => {
                        g.input.angle_down = true;
                        event.prevent_default();
                    }
                    "ArrowRight" => {
                        g.input.power_up = true;
                        event.prevent_default();
                    }
                    "ArrowLeft" => {
                        g.input.power_down = true;
                        event.prevent_default();
                    }
                    "Space" | "Enter" => {
                        if !event.repeat() {
                            g.input.fire = true;
                        }
                        event.prevent_default();
                    }
                    "KeyS" => {
                        if !event.repeat() {
                            g.settings.screen_shake = !g.settings.screen_shake;
                            g.settings.save();
                            log::info!("Screen shake: {}", g.settings.screen_shake);
                        }
                    }
                    "KeyF" => {
                        if !event.repeat() {
                            g.settings.show_fps = !g.settings.show_fps;
                            g.settings.save();
                        }
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyup: release held aim keys
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.code().as_str() {
                    "ArrowUp" => g.input.angle_up = false,
                    "ArrowDown" => g.input.angle_down = false,
                    "ArrowRight" => g.input.power_up = false,
                    "ArrowLeft" => g.input.power_down = false,
                    _ => {}
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur: keyups are lost while unfocused, so drop all held keys
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().input = TickInput::default();
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_rematch_button(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        if let Some(btn) = document.get_element_by_id("rematch-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                game.borrow_mut().restart(seed);
                log::info!("Rematch started with seed: {}", seed);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_visibility_handler(game: Rc<RefCell<Game>>) {
        let document = web_sys::window().unwrap().document().unwrap();

        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Visible {
                // Restart the frame clock so the first dt after resume is small
                game.borrow_mut().last_time = 0.0;
                log::info!("Tab visible again, frame clock reset");
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt, time);
            g.render(time);
            g.update_hud();
        }

        request_animation_frame(game);
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
    log::info!("Skyline Siege (native) starting...");
    log::info!("Native mode requires winit integration - run with `trunk serve` for web version");

    // Run tests
    println!("\nRunning impact tests...");
    test_direct_hit();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn test_direct_hit() {
    use glam::Vec2;
    use skyline_siege::Tuning;
    use skyline_siege::sim::{Bullet, Gorilla, Impact, Terrain, resolve_bullet_impact};

    let tuning = Tuning::default();
    let terrain = Terrain::default();
    let gorillas = [
        Gorilla::new(Vec2::new(100.0, 300.0), tuning.gorilla_radius),
        Gorilla::new(Vec2::new(700.0, 300.0), tuning.gorilla_radius),
    ];
    let bullet = Bullet {
        pos: Vec2::new(700.0, 290.0),
        vel: Vec2::new(0.0, 120.0),
        radius: tuning.bullet_radius,
        age: 1.0,
        owner: 0,
        immune_building: None,
    };

    let result = resolve_bullet_impact(&bullet, &gorillas, &terrain, &tuning);
    assert!(
        matches!(result, Some(Impact::Direct { target: 1 })),
        "Direct hit should be detected"
    );
    println!("\u{2713} Impact resolution tests passed!");
}
