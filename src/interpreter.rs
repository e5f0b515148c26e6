//! Interpreter that executes a parsed script against a [`VoxelGrid`].
//!
//! The entry point is [`Interpreter`]. Configure it with an
//! [`InterpreterConfig`] and call [`Interpreter::evaluate`] with the script
//! text. Every evaluation rebuilds the grid, the origin, the current group and
//! the scene hints from scratch, so evaluating the same text twice yields the
//! same model.
//!
//! # Error policy
//!
//! Evaluation stops at the first error. The grid keeps whatever was built up
//! to that point, the error is retained as [`Interpreter::last_error`], and
//! the interpreter stays ready for the next evaluation.

use crate::error::{Result, ScriptError};
use crate::grid::{DEFAULT_EXTENT, DEFAULT_GROUP, GroupFilter, GroupId, VoxelGrid};
use crate::parser::{FunctionBlock, Program, Statement, parse};
use crate::scene::{Color, Material, Projection, SceneHints, SceneSnapshot};
use crate::sketch::Sketch;
use crate::turtle::{LSystemConfig, TurtleInterpreter};
use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Configuration for script evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Grid size along X, Y and Z.
    pub extent: IVec3,
    /// Maximum nesting of user function calls. Guards against self-recursion.
    pub max_call_depth: usize,
    pub lsystem: LSystemConfig,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            extent: IVec3::splat(DEFAULT_EXTENT),
            max_call_depth: 64,
            lsystem: LSystemConfig::default(),
        }
    }
}

/// Everything commands read and mutate while a script runs.
#[derive(Clone, Debug)]
pub struct InterpreterState {
    pub grid: VoxelGrid,
    /// Anchor for `box`, `plane` and `lsys`.
    pub origin: IVec3,
    /// Group stamped by every drawing command.
    pub group: GroupId,
    pub hints: SceneHints,
    turtle: TurtleInterpreter,
}

impl InterpreterState {
    pub fn new(config: &InterpreterConfig) -> Self {
        let grid = VoxelGrid::new(config.extent);
        let mut turtle = TurtleInterpreter::new(config.lsystem.clone());
        turtle.populate_standard_symbols();
        Self {
            origin: grid.center(),
            grid,
            group: DEFAULT_GROUP,
            hints: SceneHints::default(),
            turtle,
        }
    }

    /// Returns to the state every evaluation starts from.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.origin = self.grid.center();
        self.group = DEFAULT_GROUP;
        self.hints = SceneHints::default();
    }

    /// Fills the box `[origin, origin + size)` with the current group.
    ///
    /// Iteration is clipped to the grid, so oversized boxes cost no more than
    /// the grid itself.
    pub fn fill(&mut self, size: IVec3) {
        let extent = self.grid.extent();
        let lo = self.origin.clamp(IVec3::ZERO, extent);
        let hi = self.origin.saturating_add(size).clamp(IVec3::ZERO, extent);
        for x in lo.x..hi.x {
            for y in lo.y..hi.y {
                for z in lo.z..hi.z {
                    self.grid.set(IVec3::new(x, y, z), self.group);
                }
            }
        }
    }

    /// Grows every matching surface upward by `height` voxels.
    ///
    /// Each column is scanned from the top down. Every cell that passes
    /// `filter` stamps the `height` cells directly above it. Stamps only land
    /// above the scan position, so a pass never reacts to its own output.
    pub fn extrude(&mut self, height: i32, filter: GroupFilter) {
        let extent = self.grid.extent();
        if height <= 0 {
            return;
        }
        for x in 0..extent.x {
            for z in 0..extent.z {
                for y in (0..extent.y).rev() {
                    if !self.grid.is_in_group(IVec3::new(x, y, z), filter) {
                        continue;
                    }
                    let top = y.saturating_add(height).min(extent.y - 1);
                    for yy in y + 1..=top {
                        self.grid.set(IVec3::new(x, yy, z), self.group);
                    }
                }
            }
        }
    }

    /// Runs an L-System rule from the current origin.
    pub fn lsystem(&mut self, rule: &str) -> usize {
        self.turtle.trace(rule, self.origin, &mut self.grid, self.group)
    }
}

/// Expected shape of one positional argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// A signed whole number.
    Int,
    /// A group id in `1..=255`.
    Group,
    /// Exactly this word.
    Keyword(&'static str),
    /// One of these words.
    Choice(&'static [&'static str]),
    /// A CSS colour name or hex code.
    Color,
    /// Any token.
    Word,
}

/// One named positional parameter of a [`Signature`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
}

const fn param(name: &'static str, kind: ParamKind) -> Param {
    Param { name, kind }
}

/// Argument schema of a built-in command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    /// Accepted argument counts.
    pub arities: &'static [usize],
    /// Positional parameters; trailing ones are optional when a shorter arity is allowed.
    pub params: &'static [Param],
    /// Example invocation shown in arity errors.
    pub usage: &'static str,
}

/// A validated argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i32),
    Group(GroupId),
    Choice(&'static str),
    Color(Color),
    Word(String),
}

fn number_word(n: usize) -> String {
    const WORDS: [&str; 4] = ["no", "one", "two", "three"];
    WORDS.get(n).map_or_else(|| n.to_string(), |w| (*w).to_string())
}

impl Signature {
    fn describe_arity(&self) -> String {
        let counts: Vec<String> = self.arities.iter().map(|&n| number_word(n)).collect();
        let plural = if self.arities == [1] { "argument" } else { "arguments" };
        format!("{} {plural}", counts.join(" or "))
    }

    /// Checks the argument count and converts every argument to its [`Value`].
    pub fn bind(&self, statement: &Statement) -> Result<Vec<Value>> {
        if !self.arities.contains(&statement.args.len()) {
            return Err(ScriptError::Arity {
                line: statement.line,
                command: statement.command.clone(),
                expected: self.describe_arity(),
                usage: self.usage.to_string(),
            });
        }
        statement
            .args
            .iter()
            .zip(self.params)
            .map(|(raw, param)| {
                convert(raw, param).map_err(|message| {
                    ScriptError::argument(statement.line, &statement.command, message)
                })
            })
            .collect()
    }
}

fn convert(raw: &str, param: &Param) -> std::result::Result<Value, String> {
    match param.kind {
        ParamKind::Int => raw
            .parse()
            .map(Value::Int)
            .map_err(|_| format!("{} must be a whole number, got '{raw}'", param.name)),
        ParamKind::Group => match raw.parse::<i64>() {
            Ok(0) => Err("group cannot be zero".to_string()),
            Ok(g) => GroupId::try_from(g)
                .map(Value::Group)
                .map_err(|_| format!("group must be between 1 and {}, got {g}", GroupId::MAX)),
            Err(_) => Err(format!("{} must be a group number, got '{raw}'", param.name)),
        },
        ParamKind::Keyword(word) if raw == word => Ok(Value::Choice(word)),
        ParamKind::Keyword(word) => Err(format!("expected '{word}' but found '{raw}'")),
        ParamKind::Choice(options) => options
            .iter()
            .copied()
            .find(|o| *o == raw)
            .map(Value::Choice)
            .ok_or_else(|| {
                format!(
                    "unknown {} '{raw}', expected one of: {}",
                    param.name,
                    options.join(", ")
                )
            }),
        ParamKind::Color => Color::parse(raw)
            .map(Value::Color)
            .ok_or_else(|| format!("unknown colour '{raw}'")),
        ParamKind::Word => Ok(Value::Word(raw.to_string())),
    }
}

/// A built-in command: its schema and the function that runs it.
#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub signature: Signature,
    run: fn(&mut InterpreterState, &[Value]),
}

/// What a command name resolves to.
#[derive(Debug, Clone)]
pub enum CommandBinding {
    Builtin(&'static Builtin),
    UserDefined(FunctionBlock),
}

fn bad_binding(command: &str, args: &[Value]) -> ! {
    unreachable!("{command} called with {args:?}, which its signature rejects")
}

fn run_box(state: &mut InterpreterState, args: &[Value]) {
    match args {
        [Value::Int(w), Value::Int(h), Value::Int(d)] => state.fill(IVec3::new(*w, *h, *d)),
        _ => bad_binding("box", args),
    }
}

fn run_plane(state: &mut InterpreterState, args: &[Value]) {
    match args {
        [Value::Int(w), Value::Int(d)] => state.fill(IVec3::new(*w, 1, *d)),
        _ => bad_binding("plane", args),
    }
}

fn run_extrude(state: &mut InterpreterState, args: &[Value]) {
    match args {
        [Value::Int(h)] => state.extrude(*h, GroupFilter::Any),
        [Value::Int(h), Value::Choice(_), Value::Group(g)] => {
            state.extrude(*h, GroupFilter::Exactly(*g))
        }
        _ => bad_binding("extrude", args),
    }
}

fn run_translate(state: &mut InterpreterState, args: &[Value]) {
    match args {
        [Value::Int(dx), Value::Int(dy), Value::Int(dz)] => {
            state.origin = state.origin.saturating_add(IVec3::new(*dx, *dy, *dz));
        }
        _ => bad_binding("translate", args),
    }
}

fn run_reset(state: &mut InterpreterState, _args: &[Value]) {
    state.origin = state.grid.center();
}

fn run_lsys(state: &mut InterpreterState, args: &[Value]) {
    match args {
        [Value::Word(rule)] => {
            let stamps = state.lsystem(rule);
            debug!(%rule, stamps, "traced L-System rule");
        }
        _ => bad_binding("lsys", args),
    }
}

fn run_group(state: &mut InterpreterState, args: &[Value]) {
    match args {
        [Value::Group(g)] => state.group = *g,
        _ => bad_binding("group", args),
    }
}

fn run_material(state: &mut InterpreterState, args: &[Value]) {
    state.hints.material = match args {
        [Value::Choice("solid")] => Material::Solid(Color::BLACK),
        [Value::Choice("solid"), Value::Color(c)] => Material::Solid(*c),
        [Value::Choice(kind), rest @ ..] => {
            if !rest.is_empty() {
                debug!(kind, "colour only applies to solid materials; ignoring it");
            }
            match *kind {
                "wireframe" => Material::Wireframe,
                _ => Material::Matcap,
            }
        }
        _ => bad_binding("material", args),
    };
}

fn run_background(state: &mut InterpreterState, args: &[Value]) {
    match args {
        [Value::Color(c)] => state.hints.background = *c,
        _ => bad_binding("background", args),
    }
}

fn run_grid(state: &mut InterpreterState, args: &[Value]) {
    match args {
        [Value::Choice(setting)] => state.hints.grid_visible = *setting == "on",
        _ => bad_binding("grid", args),
    }
}

fn run_camera(state: &mut InterpreterState, args: &[Value]) {
    state.hints.camera = match args {
        [Value::Choice("ortho")] => Projection::Orthographic,
        [Value::Choice(_)] => Projection::Perspective,
        _ => bad_binding("camera", args),
    };
}

/// The built-in command table.
pub static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "box",
        signature: Signature {
            arities: &[3],
            params: &[
                param("width", ParamKind::Int),
                param("height", ParamKind::Int),
                param("depth", ParamKind::Int),
            ],
            usage: "box 2 4 5",
        },
        run: run_box,
    },
    Builtin {
        name: "plane",
        signature: Signature {
            arities: &[2],
            params: &[param("width", ParamKind::Int), param("depth", ParamKind::Int)],
            usage: "plane 4 8",
        },
        run: run_plane,
    },
    Builtin {
        name: "extrude",
        signature: Signature {
            arities: &[1, 3],
            params: &[
                param("height", ParamKind::Int),
                param("filter", ParamKind::Keyword("group")),
                param("group", ParamKind::Group),
            ],
            usage: "extrude 10 group 3",
        },
        run: run_extrude,
    },
    Builtin {
        name: "translate",
        signature: Signature {
            arities: &[3],
            params: &[
                param("dx", ParamKind::Int),
                param("dy", ParamKind::Int),
                param("dz", ParamKind::Int),
            ],
            usage: "translate 2 4 5",
        },
        run: run_translate,
    },
    Builtin {
        name: "reset",
        signature: Signature {
            arities: &[0],
            params: &[],
            usage: "reset",
        },
        run: run_reset,
    },
    Builtin {
        name: "lsys",
        signature: Signature {
            arities: &[1],
            params: &[param("rule", ParamKind::Word)],
            usage: "lsys FF+FFF",
        },
        run: run_lsys,
    },
    Builtin {
        name: "group",
        signature: Signature {
            arities: &[1],
            params: &[param("group", ParamKind::Group)],
            usage: "group 5",
        },
        run: run_group,
    },
    Builtin {
        name: "material",
        signature: Signature {
            arities: &[1, 2],
            params: &[
                param("material", ParamKind::Choice(&["wireframe", "matcap", "solid"])),
                param("color", ParamKind::Color),
            ],
            usage: "material solid blue",
        },
        run: run_material,
    },
    Builtin {
        name: "background",
        signature: Signature {
            arities: &[1],
            params: &[param("color", ParamKind::Color)],
            usage: "background blue",
        },
        run: run_background,
    },
    Builtin {
        name: "grid",
        signature: Signature {
            arities: &[1],
            params: &[param("setting", ParamKind::Choice(&["on", "off"]))],
            usage: "grid on",
        },
        run: run_grid,
    },
    Builtin {
        name: "camera",
        signature: Signature {
            arities: &[1],
            params: &[param(
                "camera",
                ParamKind::Choice(&["ortho", "persp", "perspective"]),
            )],
            usage: "camera ortho",
        },
        run: run_camera,
    },
];

/// Command names visible to one evaluation.
#[derive(Debug, Clone)]
pub struct Namespace {
    bindings: HashMap<String, CommandBinding>,
    max_call_depth: usize,
}

impl Namespace {
    /// Built-ins plus the functions `program` defines. Functions shadow built-ins.
    pub fn new(program: &Program, max_call_depth: usize) -> Self {
        let mut bindings: HashMap<String, CommandBinding> = BUILTINS
            .iter()
            .map(|b| (b.name.to_string(), CommandBinding::Builtin(b)))
            .collect();
        for (name, function) in &program.functions {
            if let Some(CommandBinding::Builtin(_)) = bindings.get(name) {
                warn!(%name, line = function.line, "function shadows a built-in command");
            }
            bindings.insert(name.clone(), CommandBinding::UserDefined(function.clone()));
        }
        Self {
            bindings,
            max_call_depth,
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandBinding> {
        self.bindings.get(name)
    }

    /// Runs `statements` in order, stopping at the first error.
    pub fn execute(
        &self,
        state: &mut InterpreterState,
        statements: &[Statement],
        depth: usize,
    ) -> Result<()> {
        for statement in statements {
            match self.get(&statement.command) {
                Some(CommandBinding::Builtin(builtin)) => {
                    let args = builtin.signature.bind(statement)?;
                    debug!(line = statement.line, command = builtin.name, ?args, "builtin");
                    (builtin.run)(state, &args);
                }
                Some(CommandBinding::UserDefined(function)) => {
                    if depth >= self.max_call_depth {
                        return Err(ScriptError::CallDepth {
                            line: statement.line,
                            command: statement.command.clone(),
                            limit: self.max_call_depth,
                        });
                    }
                    debug!(line = statement.line, function = %function.name, depth, "call");
                    self.execute(state, &function.body, depth + 1)?;
                }
                None => {
                    return Err(ScriptError::CommandNotFound {
                        line: statement.line,
                        command: statement.command.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Evaluates scripts into a voxel model plus scene hints.
pub struct Interpreter {
    config: InterpreterConfig,
    state: InterpreterState,
    source: String,
    last_error: Option<ScriptError>,
}

impl Interpreter {
    /// Creates an interpreter with an empty grid of `config.extent`.
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            state: InterpreterState::new(&config),
            config,
            source: String::new(),
            last_error: None,
        }
    }

    /// Rebuilds the model from `source`.
    ///
    /// On error the grid is left as built up to the failing statement and the
    /// error is also kept in [`last_error`](Self::last_error).
    pub fn evaluate(&mut self, source: &str) -> Result<()> {
        self.source = source.to_string();
        self.state.reset();
        self.last_error = None;

        let result = parse(source).and_then(|program| {
            let namespace = Namespace::new(&program, self.config.max_call_depth);
            namespace
                .execute(&mut self.state, &program.statements, 0)
                .map(|()| program.statements.len())
        });

        match result {
            Ok(statements) => {
                info!(
                    statements,
                    filled = self.state.grid.filled_count(),
                    "sketch evaluated"
                );
                Ok(())
            }
            Err(err) => {
                warn!(line = err.line(), %err, "sketch evaluation aborted");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Evaluates the script stored in a sketch document.
    pub fn load_sketch(&mut self, sketch: &Sketch) -> Result<()> {
        self.evaluate(&sketch.code)
    }

    /// The most recently evaluated script as a sketch document.
    pub fn to_sketch(&self) -> Sketch {
        Sketch::new(self.source.clone())
    }

    /// The configuration this interpreter was built with.
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Grid, origin, group and hints as left by the last evaluation.
    pub fn state(&self) -> &InterpreterState {
        &self.state
    }

    /// The voxel grid built by the last evaluation.
    pub fn grid(&self) -> &VoxelGrid {
        &self.state.grid
    }

    /// Rendering hints set by the last evaluation.
    pub fn hints(&self) -> &SceneHints {
        &self.state.hints
    }

    /// Current anchor for shape commands.
    pub fn origin(&self) -> IVec3 {
        self.state.origin
    }

    /// The most recently evaluated script text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The error that stopped the last evaluation, if any.
    pub fn last_error(&self) -> Option<&ScriptError> {
        self.last_error.as_ref()
    }

    /// Copies the populated cells and hints for a renderer.
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot::capture(&self.state.grid, &self.state.hints)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}
