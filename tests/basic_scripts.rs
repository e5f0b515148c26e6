// tests/basic_scripts.rs
use glam::IVec3;
use voxsketch::{
    Color, ErrorKind, GroupFilter, Interpreter, InterpreterConfig, Material, Projection,
    ScriptError, Sketch, STARTER_SCRIPT,
};

fn interpreter(size: i32) -> Interpreter {
    Interpreter::new(InterpreterConfig {
        extent: IVec3::splat(size),
        ..Default::default()
    })
}

fn filled(interpreter: &Interpreter) -> Vec<(IVec3, u8)> {
    interpreter
        .grid()
        .cells()
        .map(|c| (c.position, c.group))
        .collect()
}

#[test]
fn box_fills_exactly_its_region() {
    let mut interp = interpreter(32);
    interp.evaluate("translate -6 -6 -6\nbox 2 3 4").unwrap();

    // Center of a 32 grid is 16, so the origin is (10, 10, 10).
    let origin = IVec3::splat(10);
    assert_eq!(interp.grid().filled_count(), 2 * 3 * 4);
    for cell in interp.grid().cells() {
        let local = cell.position - origin;
        assert!(
            local.cmpge(IVec3::ZERO).all() && local.cmplt(IVec3::new(2, 3, 4)).all(),
            "{} is outside the box",
            cell.position
        );
        assert_eq!(cell.group, 1);
    }
}

#[test]
fn plane_is_a_single_layer() {
    let mut interp = interpreter(32);
    interp.evaluate("plane 4 8").unwrap();
    assert_eq!(interp.grid().filled_count(), 32);
    assert!(interp.grid().cells().all(|c| c.position.y == 16));
}

#[test]
fn reset_then_translate_moves_from_center() {
    let mut interp = Interpreter::default();
    interp.evaluate("translate 1 2 3\nreset\ntranslate 10 0 0").unwrap();
    assert_eq!(interp.origin(), IVec3::new(138, 128, 128));
}

#[test]
fn extrude_single_cell() {
    let mut interp = interpreter(32);
    interp.evaluate("box 1 1 1\nextrude 5").unwrap();

    assert_eq!(interp.grid().filled_count(), 6);
    for y in 16..=21 {
        assert!(interp.grid().is_full(IVec3::new(16, y, 16)), "missing y={y}");
    }
}

#[test]
fn extrude_by_group_only_grows_that_group() {
    let mut interp = interpreter(32);
    interp
        .evaluate("group 2\nbox 1 1 1\ntranslate 4 0 0\ngroup 3\nbox 1 1 1\ngroup 4\nextrude 2 group 3")
        .unwrap();

    let grid = interp.grid();
    assert!(!grid.is_full(IVec3::new(16, 17, 16)), "group 2 must not grow");
    assert_eq!(grid.get(IVec3::new(20, 17, 16)), Some(4));
    assert_eq!(grid.get(IVec3::new(20, 18, 16)), Some(4));
    assert_eq!(grid.filled_count(), 4);
}

#[test]
fn extrude_is_clipped_at_the_top() {
    let mut interp = interpreter(8);
    interp.evaluate("translate 0 3 0\nbox 1 1 1\nextrude 100").unwrap();
    // Origin is (4, 7, 4): the cell already sits on the top layer.
    assert_eq!(interp.grid().filled_count(), 1);
}

#[test]
fn extrude_group_zero_is_rejected() {
    let mut interp = interpreter(8);
    let err = interp.evaluate("box 1 1 1\nextrude 3 group 0").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentValue);
    assert_eq!(err.line(), 2);
    assert!(err.to_string().contains("group cannot be zero"), "{err}");
    assert_eq!(interp.grid().filled_count(), 1, "box ran before the error");
}

#[test]
fn lsys_square() {
    let mut interp = interpreter(16);
    interp.evaluate("lsys F+F+F+F").unwrap();

    let origin = IVec3::splat(8);
    assert_eq!(interp.grid().filled_count(), 4);
    for offset in [IVec3::ZERO, IVec3::X, IVec3::new(1, 0, 1), IVec3::Z] {
        assert!(interp.grid().is_full(origin + offset), "missing {offset}");
    }
}

#[test]
fn lsys_at_the_coordinate_limit_is_harmless() {
    let mut interp = interpreter(8);
    interp.evaluate("translate 2147483647 0 0\nlsys FF").unwrap();
    assert_eq!(interp.grid().filled_count(), 0);

    interp.evaluate("translate -2147483648 0 0\nlsys ++FF").unwrap();
    assert_eq!(interp.grid().filled_count(), 0);
}

#[test]
fn lsys_uses_current_group_and_origin() {
    let mut interp = interpreter(16);
    interp.evaluate("group 7\ntranslate -8 0 -8\nlsys FFF").unwrap();
    assert_eq!(
        filled(&interp),
        vec![
            (IVec3::new(0, 8, 0), 7),
            (IVec3::new(1, 8, 0), 7),
            (IVec3::new(2, 8, 0), 7),
        ]
    );
}

#[test]
fn unknown_command_reports_its_line() {
    let mut interp = interpreter(8);
    let err = interp.evaluate("reset\n\n# nothing\nfoo 1 2").unwrap_err();
    assert_eq!(
        err,
        ScriptError::CommandNotFound {
            line: 4,
            command: "foo".into()
        }
    );
    assert_eq!(interp.last_error(), Some(&err));
    assert_eq!(err.to_string(), "[Line 4]: Command \"foo\" not found.");
}

#[test]
fn errors_abort_the_rest_of_the_script() {
    let mut interp = interpreter(16);
    let err = interp.evaluate("box 1 1 1\nbox 1 1\ntranslate 2 0 0\nbox 1 1 1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Arity);
    assert_eq!(interp.grid().filled_count(), 1);
    assert_eq!(interp.origin(), IVec3::splat(8));
}

#[test]
fn syntax_errors_stop_before_execution() {
    let mut interp = interpreter(8);
    let err = interp.evaluate("box 1 1 1\n   box 1 1 1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(interp.grid().filled_count(), 0);
}

#[test]
fn functions_run_their_body_each_call() {
    let script = "\
fn pillar height
  box 1 3 1
  translate 2 0 0

pillar
pillar
pillar
";
    let mut interp = interpreter(32);
    interp.evaluate(script).unwrap();
    assert_eq!(interp.grid().filled_count(), 9);
    assert_eq!(interp.origin(), IVec3::new(22, 16, 16));
}

#[test]
fn functions_can_be_called_before_definition() {
    let mut interp = interpreter(16);
    interp.evaluate("dot\nfn dot\n  box 1 1 1").unwrap();
    assert_eq!(interp.grid().filled_count(), 1);
}

#[test]
fn functions_can_shadow_builtins() {
    let mut interp = interpreter(16);
    interp.evaluate("fn box\n  plane 2 2\nbox 9 9 9").unwrap();
    assert_eq!(interp.grid().filled_count(), 4);
    assert!(interp.grid().cells().all(|c| c.position.y == 8));
}

#[test]
fn self_recursion_hits_the_call_depth_limit() {
    let mut interp = Interpreter::new(InterpreterConfig {
        extent: IVec3::splat(8),
        max_call_depth: 5,
        ..Default::default()
    });
    let err = interp.evaluate("fn loop\n  loop\nloop").unwrap_err();
    assert_eq!(
        err,
        ScriptError::CallDepth {
            line: 2,
            command: "loop".into(),
            limit: 5
        }
    );
}

#[test]
fn scene_hints_follow_the_script() {
    let mut interp = interpreter(8);
    interp
        .evaluate("material solid #ff0000\nbackground navy\ngrid off\ncamera ortho")
        .unwrap();
    let hints = interp.hints();
    assert_eq!(hints.material, Material::Solid(Color::from_rgb(0xff0000)));
    assert_eq!(hints.background, Color::from_rgb(0x000080));
    assert!(!hints.grid_visible);
    assert_eq!(hints.camera, Projection::Orthographic);

    interp.evaluate("material solid").unwrap();
    assert_eq!(interp.hints().material, Material::Solid(Color::BLACK));
    assert_eq!(interp.hints().camera, Projection::Perspective, "hints reset");
    assert!(interp.hints().grid_visible);

    interp.evaluate("material wireframe\ncamera perspective").unwrap();
    assert_eq!(interp.hints().material, Material::Wireframe);
}

#[test]
fn bad_hint_values_are_reported() {
    let mut interp = interpreter(8);
    for script in ["material chrome", "grid maybe", "camera fisheye", "background blurple"] {
        let err = interp.evaluate(script).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentValue, "{script}");
    }
    let err = interp.evaluate("material").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Arity);
}

#[test]
fn evaluation_is_deterministic() {
    let mut first = interpreter(64);
    first.evaluate(STARTER_SCRIPT).unwrap();
    let cells = filled(&first);
    assert!(!cells.is_empty());

    first.evaluate(STARTER_SCRIPT).unwrap();
    assert_eq!(filled(&first), cells);

    let mut second = interpreter(64);
    second.evaluate(STARTER_SCRIPT).unwrap();
    assert_eq!(filled(&second), cells);
}

#[test]
fn errors_clear_on_the_next_good_evaluation() {
    let mut interp = interpreter(8);
    assert!(interp.evaluate("nope").is_err());
    assert!(interp.last_error().is_some());
    interp.evaluate("reset").unwrap();
    assert!(interp.last_error().is_none());
}

#[test]
fn sketches_round_trip_through_the_interpreter() {
    let mut interp = interpreter(16);
    interp.load_sketch(&Sketch::new("box 2 2 2")).unwrap();
    assert_eq!(interp.grid().filled_count(), 8);
    assert_eq!(interp.source(), "box 2 2 2");
    assert_eq!(interp.to_sketch().code, "box 2 2 2");
}

#[test]
fn snapshot_matches_the_grid() {
    let mut interp = interpreter(16);
    interp.evaluate("group 3\nplane 2 2\ngrid off").unwrap();
    let snapshot = interp.snapshot();
    assert_eq!(snapshot.extent, IVec3::splat(16));
    assert_eq!(snapshot.cells.len(), 4);
    assert!(snapshot.cells.iter().all(|c| c.group == 3));
    assert!(!snapshot.hints.grid_visible);
    assert!(interp.grid().is_in_group(IVec3::splat(8), GroupFilter::Exactly(3)));
}
