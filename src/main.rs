//! Plinko Drop entry point
//!
//! On the web: wires the DOM controls and draws the board on a 2D canvas.
//! Natively: plays one headless round on rapier2d and logs the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlInputElement};

    use plinko_drop::GameConfig;
    use plinko_drop::config::parse_positive;
    use plinko_drop::consts::SIM_DT;
    use plinko_drop::physics::RapierWorld;
    use plinko_drop::sim::{Game, GameEvent, Shape};

    /// Game instance plus its drawing surface
    struct App {
        game: Game<RapierWorld>,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        last_time: f64,
    }

    impl App {
        /// Draw the current frame
        fn render(&self) {
            let ctx = &self.ctx;
            let geo = self.game.geometry();
            let w = self.canvas.width() as f64;
            let h = self.canvas.height() as f64;

            ctx.set_fill_style_str("#f0f0f0");
            ctx.fill_rect(0.0, 0.0, w, h);

            ctx.set_fill_style_str("#333333");
            for wall in &geo.walls {
                fill_shape(ctx, wall);
            }

            ctx.set_fill_style_str("#4a4a4a");
            for peg in &geo.pegs {
                fill_circle(ctx, peg.pos, geo.peg_radius);
            }

            ctx.set_font("14px sans-serif");
            ctx.set_text_align("center");
            for bin in &geo.bins {
                ctx.set_fill_style_str("#87CEEB");
                fill_shape(ctx, &bin.shape());
                ctx.set_fill_style_str("#1a1a1a");
                let _ = ctx.fill_text(
                    &format!("x{}", bin.multiplier),
                    bin.center.x as f64,
                    bin.center.y as f64,
                );
            }

            ctx.set_fill_style_str("#FF5733");
            for ball in self.game.balls() {
                fill_circle(ctx, ball.pos, ball.radius);
            }
        }
    }

    fn fill_circle(ctx: &CanvasRenderingContext2d, center: Vec2, radius: f32) {
        ctx.begin_path();
        let _ = ctx.arc(
            center.x as f64,
            center.y as f64,
            radius as f64,
            0.0,
            std::f64::consts::TAU,
        );
        ctx.fill();
    }

    fn fill_shape(ctx: &CanvasRenderingContext2d, shape: &Shape) {
        match *shape {
            Shape::Circle { center, radius } => fill_circle(ctx, center, radius),
            Shape::Rect {
                center,
                half_extents,
            } => {
                let min = center - half_extents;
                let size = half_extents * 2.0;
                ctx.fill_rect(min.x as f64, min.y as f64, size.x as f64, size.y as f64);
            }
        }
    }

    fn document() -> Document {
        web_sys::window().unwrap().document().unwrap()
    }

    fn viewport() -> Vec2 {
        let window = web_sys::window().unwrap();
        let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1024.0);
        let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(768.0);
        Vec2::new(w as f32, h as f32)
    }

    /// Parse a numeric `<input>` value, clamped to at least 1
    fn input_value<T>(id: &str) -> Option<T>
    where
        T: std::str::FromStr + Ord + From<u8>,
    {
        let input: HtmlInputElement = document().get_element_by_id(id)?.dyn_into().ok()?;
        parse_positive(&input.value())
    }

    fn update_balance_display(balance: u64) {
        if let Some(el) = document().get_element_by_id("balance") {
            el.set_text_content(Some(&balance.to_string()));
        }
    }

    fn alert(message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }

    fn on_click(id: &str, handler: impl FnMut(web_sys::MouseEvent) + 'static) {
        if let Some(btn) = document().get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(handler);
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Plinko Drop starting...");

        let canvas: HtmlCanvasElement = document()
            .get_element_by_id("gameCanvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");
        let view = viewport();
        canvas.set_width(view.x as u32);
        canvas.set_height(view.y as u32);
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");

        let mut config = GameConfig {
            viewport: view,
            ..GameConfig::default()
        };
        if let Some(height) = input_value::<u32>("pyramidHeight") {
            config.pyramid_height = height;
        }

        let seed = js_sys::Date::now() as u64;
        let world = RapierWorld::new(&config.physics);
        let game = Game::new(world, config, seed);
        update_balance_display(game.balance());

        let app = Rc::new(RefCell::new(App {
            game,
            canvas,
            ctx,
            last_time: 0.0,
        }));

        setup_controls(app.clone());
        request_animation_frame(app);

        log::info!("Plinko Drop running!");
    }

    fn setup_controls(app: Rc<RefCell<App>>) {
        // Drop button
        {
            let app = app.clone();
            on_click("dropBalls", move |_event| {
                let result = {
                    let mut a = app.borrow_mut();
                    if let Some(wager) = input_value::<u64>("betAmount") {
                        a.game.set_wager(wager);
                    }
                    if let Some(count) = input_value::<u32>("ballCount") {
                        a.game.set_ball_count(count);
                    }
                    let result = a.game.drop_balls();
                    update_balance_display(a.game.balance());
                    result
                };
                if result.is_err() {
                    alert("Insufficient balance!");
                }
            });
        }

        // Regenerate button
        {
            let app = app.clone();
            on_click("updateGame", move |_event| {
                let height = input_value::<u32>("pyramidHeight").unwrap_or(8);
                app.borrow_mut().game.regenerate_board(height, viewport());
            });
        }

        // Height slider label
        if let Some(slider) = document().get_element_by_id("pyramidHeight") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if let (Some(label), Some(height)) = (
                    document().get_element_by_id("heightValue"),
                    input_value::<u32>("pyramidHeight"),
                ) {
                    label.set_text_content(Some(&height.to_string()));
                }
            });
            let _ = slider.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Resize regenerates the board at the current height
        {
            let window = web_sys::window().unwrap();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let view = viewport();
                let mut a = app.borrow_mut();
                a.canvas.set_width(view.x as u32);
                a.canvas.set_height(view.y as u32);
                let height = a.game.config().pyramid_height;
                a.game.regenerate_board(height, view);
            });
            let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        let mut messages = Vec::new();
        {
            let mut a = app.borrow_mut();

            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            a.last_time = time;

            a.game.update(dt);
            for event in a.game.drain_events() {
                match event {
                    GameEvent::BallSettled { .. } => update_balance_display(a.game.balance()),
                    GameEvent::RoundComplete { summary } => {
                        messages.push(format!(
                            "All balls have landed! Total winnings: ${}",
                            summary.winnings
                        ));
                    }
                    _ => {}
                }
            }
            a.render();
        }

        // Alert outside the borrow so handlers stay usable
        for message in messages {
            alert(&message);
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use plinko_drop::GameConfig;
    use plinko_drop::consts::SIM_DT;
    use plinko_drop::physics::RapierWorld;
    use plinko_drop::sim::{Game, GameEvent};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Plinko Drop (native) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => match GameConfig::load_file(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => GameConfig::default(),
    };

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    let world = RapierWorld::new(&config.physics);
    let mut game = Game::new(world, config, seed);

    if let Err(e) = game.drop_balls() {
        log::error!("{}", e);
        std::process::exit(1);
    }

    // Up to one minute of simulated time
    let max_ticks = (60.0 / SIM_DT) as u32;
    for _ in 0..max_ticks {
        game.tick(SIM_DT);
        for event in game.drain_events() {
            if let GameEvent::RoundComplete { summary } = event {
                println!(
                    "Round complete: {} settled, {} lost, winnings {}, balance {}",
                    summary.settled,
                    summary.lost,
                    summary.winnings,
                    game.balance()
                );
                return;
            }
        }
    }
    log::warn!("Round did not finish within {} ticks", max_ticks);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
