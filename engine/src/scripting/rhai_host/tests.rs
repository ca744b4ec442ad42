use super::*;
use crate::config::GameConfig;
use crate::graphics::{Blit, Color, Shape};
use crate::io::MemorySource;
use crate::test_support::png;
use crate::windowing::{HeadlessPlatform, PlatformEvent};

struct Harness {
    ctx: EngineContext,
    platform: HeadlessPlatform,
    state: RhaiState,
    surface: Surface,
}

impl Harness {
    fn new(script: &str) -> Self {
        Self::configured(script, |_| {})
    }

    fn configured(script: &str, configure: impl FnOnce(&mut GameConfig)) -> Self {
        let source = MemorySource::new()
            .with("main.rhai", script)
            .with("back.png", png(100, 40))
            .with("sprites.png", png(16, 16));

        let mut config = GameConfig::new();
        config.set("main", "script", "main.rhai");
        configure(&mut config);

        let platform = HeadlessPlatform::new(320, 240);
        let ctx = EngineContext::new(config, Box::new(platform.clone()), Box::new(source));
        let surface = ctx.new_surface();
        Self {
            ctx,
            platform,
            state: RhaiState::new("main"),
            surface,
        }
    }

    fn init(&mut self) {
        self.state.init(&self.ctx).unwrap();
    }

    fn update(&mut self) -> Option<Transition> {
        self.state.update(&self.ctx, &mut self.surface)
    }

    fn int(&self, name: &str) -> i64 {
        self.state.variable(name).unwrap().as_int().unwrap()
    }

    fn text(&self, name: &str) -> String {
        self.state.variable(name).unwrap().to_string()
    }

    fn texts(&self) -> Vec<(i32, i32, String)> {
        self.surface
            .commands()
            .iter()
            .filter_map(|c| match &c.shape {
                Shape::Text { x, y, text, .. } => Some((*x, *y, text.clone())),
                _ => None,
            })
            .collect()
    }
}

#[test]
fn test_unset_nextstate_quits() {
    let mut h = Harness::new("let x = 1;");
    h.init();
    assert_eq!(h.update(), Some(Transition::Quit));
}

#[test]
fn test_nextstate_names_the_next_state() {
    let mut h = Harness::new(r#"nextstate = "menu";"#);
    h.init();
    assert_eq!(h.update(), Some(Transition::Switch("menu".into())));
}

#[test]
fn test_runtime_error_quits() {
    let mut h = Harness::new(
        r#"
        nextstate = "main";
        let zero = 0;
        let x = 1 / zero;
        "#,
    );
    h.init();
    assert_eq!(h.update(), Some(Transition::Quit));
    assert!(!h.ctx.quit_requested());
}

#[test]
fn test_parse_error_fails_init() {
    let mut h = Harness::new("let = ;");
    assert!(matches!(
        h.state.init(&h.ctx),
        Err(StateError::Script { .. })
    ));
    assert_eq!(h.update(), Some(Transition::Quit));
    h.state.deinit(&h.ctx);
}

#[test]
fn test_missing_script_fails_init() {
    let mut h = Harness::configured("", |config| {
        config.set("main", "script", "absent.rhai");
    });
    assert!(matches!(
        h.state.init(&h.ctx),
        Err(StateError::Resource { .. })
    ));
}

#[test]
fn test_script_reruns_and_top_level_variables_persist() {
    let mut h = Harness::new(
        r#"
        let count = if is_def_var("count") { count + 1 } else { 1 };
        nextstate = "main";
        "#,
    );
    h.init();
    for _ in 0..3 {
        assert_eq!(h.update(), Some(Transition::Switch("main".into())));
    }
    assert_eq!(h.int("count"), 3);
}

#[test]
fn test_screen_size_variables() {
    let mut h = Harness::new(r#"let area = width * height; nextstate = "main";"#);
    h.init();
    h.update();
    assert_eq!(h.int("area"), 320 * 240);
}

#[test]
fn test_print_follows_cursor() {
    let mut h = Harness::new(
        r#"
        gotoxy(10, 20);
        print("hi");
        print(42);
        let after = cursor.y;
        cursor.x = 0;
        print("left");
        nextstate = "main";
        "#,
    );
    h.init();
    h.update();
    assert_eq!(
        h.texts(),
        vec![
            (10, 20, "hi".to_string()),
            (10, 29, "42".to_string()),
            (0, 38, "left".to_string()),
        ]
    );
    assert_eq!(h.int("after"), 38);
}

#[test]
fn test_centertext_and_colors() {
    let mut h = Harness::configured(
        r#"
        cls();
        color("red");
        fillrect(0, 0, 10, 10);
        color();
        centertext("abc");
        let f = font("small");
        nextstate = "main";
        "#,
        |config| {
            config.set("styles", "background", "blue");
            config.set("main", "foreground", "lime");
        },
    );
    h.init();
    h.update();

    let commands = h.surface.commands();
    assert!(matches!(commands[0].shape, Shape::Clear));
    assert_eq!(commands[0].color, "blue".parse::<Color>().unwrap());
    assert_eq!(commands[1].color, Color::rgb(255, 0, 0));
    assert_eq!(h.texts(), vec![(148, 116, "abc".to_string())]);
    assert_eq!(commands[2].color, "lime".parse::<Color>().unwrap());
    assert_eq!(h.text("f"), "small");
}

#[test]
fn test_style_map() {
    let mut h = Harness::configured(
        r#"
        let bg = style.background;
        let pad = style.button_padding;
        let radius = style.border_radius;
        nextstate = "main";
        "#,
        |config| {
            config.set("main", "button-padding", "-3");
            config.set("styles", "border-radius", "4");
        },
    );
    h.init();
    h.update();
    assert_eq!(h.text("bg"), "black");
    assert_eq!(h.int("pad"), 0);
    assert_eq!(h.int("radius"), 4);
}

#[test]
fn test_show_advances_one_frame() {
    let mut h = Harness::new(
        r#"
        pixel(1, 1);
        show();
        let mx = mouse.x;
        nextstate = "main";
        "#,
    );
    h.init();
    h.platform.set_mouse(80, 60, 0);
    h.update();
    assert_eq!(h.platform.frames_presented(), 1);
    assert_eq!(h.platform.last_frame().len(), 1);
    assert_eq!(h.int("mx"), 80);
}

#[test]
fn test_delay_runs_frames_until_elapsed() {
    let mut h = Harness::new(r#"delay(200); nextstate = "main";"#);
    h.init();
    let start = h.ctx.frame.borrow().ticks();
    assert_eq!(h.update(), Some(Transition::Switch("main".into())));
    assert!(h.ctx.frame.borrow().ticks() - start >= 200);
    assert!(h.platform.frames_presented() >= 2);
}

#[test]
fn test_quit_halts_blocking_loop() {
    let mut h = Harness::new(
        r#"
        loop {
            show();
        }
        nextstate = "main";
        "#,
    );
    h.init();
    h.platform.schedule_event(3, PlatformEvent::Quit);
    assert_eq!(h.update(), Some(Transition::Quit));
    assert!(h.ctx.quit_requested());
    assert!(h.state.variable(NEXT_STATE_VAR).unwrap().is_unit());
}

#[test]
fn test_keyboard_functions() {
    let mut h = Harness::new(
        r#"
        let any = kbhit();
        let enter = kbhit("return");
        kbclr("return");
        let cleared = kbhit("return");
        kbclr();
        let none = kbhit();
        nextstate = "main";
        "#,
    );
    h.init();
    {
        let mut frame = h.ctx.frame.borrow_mut();
        frame.input_mut().set_key_pressed("return", true);
        frame.input_mut().set_key_pressed("a", true);
    }
    h.update();
    assert_eq!(h.state.variable("any").unwrap().as_bool(), Ok(true));
    assert_eq!(h.state.variable("enter").unwrap().as_bool(), Ok(true));
    assert_eq!(h.state.variable("cleared").unwrap().as_bool(), Ok(false));
    assert_eq!(h.state.variable("none").unwrap().as_bool(), Ok(false));
}

#[test]
fn test_store_functions() {
    let mut h = Harness::new(
        r#"
        db_set("score", 10);
        local_set("room", "cellar");
        let score = db_get("score");
        let fallback = db_get("lives", 3);
        let missing = local_get("lives");
        let has_room = local_has("room");
        let shared_room = db_has("room");
        nextstate = "main";
        "#,
    );
    h.init();
    h.update();
    assert_eq!(h.text("score"), "10");
    assert_eq!(h.int("fallback"), 3);
    assert!(h.state.variable("missing").unwrap().is_unit());
    assert_eq!(h.state.variable("has_room").unwrap().as_bool(), Ok(true));
    assert_eq!(h.state.variable("shared_room").unwrap().as_bool(), Ok(false));
    assert_eq!(h.ctx.store.borrow().local().get("room"), Some("cellar"));
}

#[test]
fn test_bitmap_functions() {
    let mut h = Harness::new(
        r##"
        loadbmp("sprites.png");
        draw("back.png");
        setmask("sprites.png", "#ff00ff");
        blit("sprites.png", 5, 6);
        blit("sprites.png", 7, 8, 4, 4, 8, 8);
        nextstate = "main";
        "##,
    );
    h.init();
    h.update();

    let blits: Vec<Blit> = h
        .surface
        .commands()
        .iter()
        .filter_map(|c| match &c.shape {
            Shape::Blit(b) => Some(*b),
            _ => None,
        })
        .collect();
    assert_eq!(blits.len(), 3);
    assert_eq!((blits[0].dx, blits[0].dy, blits[0].mask), (110, 100, None));
    assert_eq!((blits[1].dx, blits[1].w, blits[1].h), (5, 16, 16));
    assert_eq!(blits[1].mask, Some(Color::rgb(255, 0, 255)));
    assert_eq!((blits[2].sx, blits[2].sy, blits[2].w), (4, 4, 8));
}

#[test]
fn test_missing_bitmap_is_a_script_error() {
    let mut h = Harness::new(r#"nextstate = "main"; blit("nope.png", 0, 0);"#);
    h.init();
    assert_eq!(h.update(), Some(Transition::Quit));
}

#[test]
fn test_eval_is_disabled() {
    let mut h = Harness::new(r#"eval("nextstate = \"main\"");"#);
    if h.state.init(&h.ctx).is_ok() {
        assert_eq!(h.update(), Some(Transition::Quit));
    }
}

#[test]
fn test_deinit_releases_interpreter() {
    let mut h = Harness::new(r#"nextstate = "main";"#);
    h.init();
    h.state.deinit(&h.ctx);
    assert!(h.state.variable(NEXT_STATE_VAR).is_none());
    assert_eq!(h.update(), Some(Transition::Quit));
    h.state.deinit(&h.ctx);
}
