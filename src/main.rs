// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use function_plot::{
    config::{self, ConfigError, GeometryConfig, PlotConfig, PlotFunction, PlotSpec},
    eval::{EvalErrTyp, Ident, IdentKey},
    expr::{Bindings, EvalFailure, Expr},
    geometry::Scene,
    lex::{LexErrTyp, SubStr, TokTyp},
    parse::{ParseErr, ParseErrTyp},
    plot::FunctionPlot,
    shell::{self, Command},
    svg,
    vars::HostMessage,
    Number, Point,
};
use std::{
    cell::RefCell,
    fs::{self, OpenOptions},
    io::{stdout, BufWriter, Write},
    process::ExitCode,
    rc::Rc,
    sync::Arc,
};

const OUTPUT_RES: [Number; 2] = [config::DEFAULT_WIDTH, config::DEFAULT_HEIGHT];
const EXPLORER_RES: [Number; 2] = [1200.0, 800.0];

fn output_svg_filename(now: DateTime<Local>, kind: &str) -> String {
    format!(
        "{}_{kind}-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "svg"
    )
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

type Outbox = Rc<RefCell<Vec<HostMessage>>>;

struct State {
    config: PlotConfig,
    plot: FunctionPlot,
    outbox: Outbox,
}

impl State {
    fn new(config: PlotConfig) -> anyhow::Result<Self> {
        let plot = FunctionPlot::new(config.clone(), None).context("invalid startup plot")?;
        let mut state = Self {
            config,
            plot,
            outbox: Rc::default(),
        };
        state.connect();
        Ok(state)
    }

    fn connect(&mut self) {
        let outbox = Rc::clone(&self.outbox);
        self.plot.set_notifier(Some(Box::new(move |msg: &HostMessage| {
            outbox.borrow_mut().push(msg.clone());
        })));
    }

    /// Rebuilds the plot from `config`, keeping it only if it validates.
    fn rebuild(&mut self, config: PlotConfig, keep_values: bool) -> Result<(), ConfigError> {
        let saved = keep_values.then(|| self.plot.variables().state());
        self.plot = FunctionPlot::new(config.clone(), saved.as_ref())?;
        self.config = config;
        self.connect();
        Ok(())
    }
}

fn try_main() -> anyhow::Result<()> {
    env_logger::init();

    let mut state = State::new(config::preset("quadratic").unwrap_or_default())?;

    let mut stdout = BufWriter::new(stdout());
    loop {
        if state.plot.functions().is_empty() {
            writeln!(stdout, "no functions on {}", state.plot.domain())?;
        } else {
            for (idx, function) in state.plot.functions().iter().enumerate() {
                writeln!(stdout, "#{idx}: {}", function.label)?;
            }
        }

        let mut try_cmd = shell::input(&mut stdout, "> ")?;
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::AddFun => add_fun(&mut stdout, &mut state)?,

                Command::Clear => {
                    let config = PlotConfig {
                        functions: Vec::new(),
                        variables: Default::default(),
                        ..state.config.clone()
                    };
                    state.rebuild(config, false)?;
                }

                Command::Preset => set_preset(&mut stdout, &mut state)?,

                Command::Load => {
                    let path = shell::input(&mut stdout, "path = ")?;
                    if !path.is_empty() {
                        match load_plot(&path) {
                            Ok(config) => {
                                if let Err(err) = state.rebuild(config, false) {
                                    writeln!(stdout, "error: {err}")?;
                                }
                            }
                            Err(err) => report(&mut stdout, &err)?,
                        }
                    }
                }

                Command::SetWin => set_win(&mut stdout, &mut state)?,

                Command::Vars => list_vars(&mut stdout, &state)?,

                Command::SetVar => set_var(&mut stdout, &mut state)?,

                Command::PrintProg => print_progs(&mut stdout, &state)?,

                Command::Cross => {
                    let hits = state.plot.intersections();
                    if hits.is_empty() {
                        writeln!(stdout, "no intersections")?;
                    }
                    for hit in hits {
                        writeln!(
                            stdout,
                            "#{i} and #{j} cross at ({x}, {y})",
                            i = hit.f_idx1,
                            j = hit.f_idx2,
                            x = svg::fmt_num(hit.x),
                            y = svg::fmt_num(hit.y),
                        )?;
                    }
                }

                Command::Probe => probe(&mut stdout, &mut state)?,

                Command::Plot => {
                    if state.plot.functions().is_empty() {
                        shell::no_functions(&mut stdout)?;
                    } else {
                        let [width, height] = OUTPUT_RES;
                        let doc = svg::plot_document(&mut state.plot, width, height)?;
                        let path = output_svg_filename(Local::now(), "plot");
                        write_svg(&path, &doc)?;
                        writeln!(stdout, "wrote '{path}'")?;
                    }
                }

                Command::Geometry => {
                    let path = shell::input(&mut stdout, "path = ")?;
                    if !path.is_empty() {
                        match render_geometry(&path) {
                            Ok(out_path) => writeln!(stdout, "wrote '{out_path}'")?,
                            Err(err) => report(&mut stdout, &err)?,
                        }
                    }
                }
            }
        } else if let Some(similar) = shell::most_similar(
            &try_cmd,
            Command::exhaustive().iter().map(|c| c.name()),
        ) {
            writeln!(stdout, r#"Unknown command, did you mean "{similar}"?"#)?;
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn report<W: Write>(mut out: W, err: &anyhow::Error) -> anyhow::Result<()> {
    writeln!(out, "error: {err}")?;
    for it in err.chain().skip(1) {
        writeln!(out, "  {it}")?;
    }
    Ok(())
}

fn write_svg(path: &str, doc: &str) -> anyhow::Result<()> {
    let mut file = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .context("failed to open output svg file")?,
    );
    file.write_all(doc.as_bytes())
        .context("failed to write output svg file")?;
    file.flush()?;
    file.get_mut().sync_data()?;
    Ok(())
}

fn load_plot(path: &str) -> anyhow::Result<PlotConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read '{path}'"))?;
    let spec: PlotSpec =
        serde_json::from_str(&text).with_context(|| format!("'{path}' is not a plot config"))?;
    let config = spec.resolve()?;
    Ok(config)
}

fn render_geometry(path: &str) -> anyhow::Result<String> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read '{path}'"))?;
    let config: GeometryConfig = serde_json::from_str(&text)
        .with_context(|| format!("'{path}' is not a geometry config"))?;
    let scene = Scene::new(&config)?;
    let doc = svg::geometry_document(&scene, &config)?;
    let out_path = output_svg_filename(Local::now(), "geometry");
    write_svg(&out_path, &doc)?;
    Ok(out_path)
}

fn set_preset<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let names: Vec<&str> = config::PRESETS.iter().map(|p| p.name).collect();
    writeln!(out, "presets: {}", names.join(", "))?;
    let name = shell::input(&mut out, "preset = ")?;
    if name.is_empty() {
        return Ok(());
    }
    match PlotSpec::Preset(name).resolve() {
        Ok(config) => state.rebuild(config, false)?,
        Err(err) => writeln!(out, "error: {err}")?,
    }
    Ok(())
}

fn set_win<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(out, "domain = {:#}", state.plot.domain())?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    let mut config = state.config.clone();
    let [x_min, x_max] = &mut config.x_domain;
    let [y_min, y_max] = &mut config.y_domain;
    for (name, dst) in [
        ("x min", x_min),
        ("x max", x_max),
        ("y min", y_min),
        ("y max", y_max),
    ] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    if let Err(err) = state.rebuild(config, true) {
        writeln!(out, "error: {err}")?;
        writeln!(out, "note: the domain was left unchanged")?;
    }
    Ok(())
}

fn list_vars<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    let vars = state.plot.variables();
    if vars.is_empty() {
        writeln!(out, "no variables")?;
    }
    for (key, var) in vars.iter() {
        writeln!(
            out,
            "{key} = {value} in [{min}, {max}] by {step} ({label})",
            value = var.value,
            min = var.min,
            max = var.max,
            step = var.step,
            label = var.label(key),
        )?;
    }
    Ok(())
}

fn set_var<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let key = shell::input(&mut out, "name = ")?;
    if key.is_empty() {
        return Ok(());
    }
    if state.plot.variables().get(&key).is_none() {
        writeln!(out, "error: unknown variable '{key}'")?;
        let keys = state.plot.variables().iter().map(|(k, _)| k);
        if let Some(similar) = shell::most_similar(&key, keys) {
            writeln!(out, "note: variable '{similar}' has a similar name")?;
        }
        return Ok(());
    }

    let value = match shell::read_fromstr::<_, Number>(&mut out, format_args!("{key} = "), true)? {
        Ok(Some(value)) => value,
        Ok(None) | Err(_) => return Ok(()),
    };
    if !state.plot.set_variable(&key, value)? {
        writeln!(out, "{key} is unchanged")?;
    }
    for message in state.outbox.borrow_mut().drain(..) {
        writeln!(out, "{}", serde_json::to_string(&message)?)?;
    }
    Ok(())
}

fn print_progs<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    if state.plot.exprs().is_empty() {
        shell::no_functions(&mut out)?;
    }
    for (idx, expr) in state.plot.exprs().iter().enumerate() {
        match expr.program() {
            Ok(prog) => {
                shell::dump_program(&mut out, prog, format_args!("#{idx}: {}", expr.src()))?;
            }
            Err(err) => {
                writeln!(out, "#{idx}: does not compile")?;
                shell::underline(&mut out, &err.loc)?;
            }
        }
    }
    Ok(())
}

fn probe<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let [width, height] = EXPLORER_RES;
    writeln!(out, "note: the fullscreen view is {width}x{height} pixels")?;
    let px = match shell::read_fromstr::<_, Number>(&mut out, "pointer x (px) = ", true)? {
        Ok(Some(px)) => px,
        Ok(None) | Err(_) => return Ok(()),
    };

    state.plot.open_explorer(width, height);
    state.plot.pointer_enter(Point::new(px, 0.5 * height));
    let readout = state.plot.readout();
    state.plot.close_explorer();

    let Some(readout) = readout else {
        return Ok(());
    };
    write!(out, "x = {}", svg::fmt_num(readout.x))?;
    if let Some(hit) = readout.intersection {
        write!(out, " (snapped to #{} and #{})", hit.f_idx1, hit.f_idx2)?;
    }
    writeln!(out)?;
    for row in &readout.ys {
        let marker = if row.highlighted { '*' } else { ' ' };
        let val = if row.val.is_finite() {
            svg::fmt_num(row.val)
        } else {
            "undefined".to_string()
        };
        writeln!(out, "{marker} {} = {val}", row.label)?;
    }
    Ok(())
}

fn add_fun<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let input = shell::input(&mut out, "y = ")?;
    if input.is_empty() {
        return Ok(());
    }

    let expr = Expr::compile(&input);
    let mut bindings = Bindings::new(&state.plot.variables().values());
    let domain = state.plot.domain();
    let mid = 0.5 * (domain.x.start + domain.x.end);
    match expr.try_eval(&mut bindings, mid) {
        // NaN is a gap, not an error
        Ok(_) => {}
        Err(EvalFailure::Parse(err)) => return report_parse(&mut out, err),
        Err(EvalFailure::Eval(err)) => {
            let loc = err.op.clone().map(|op| op.loc);
            shell::underline(
                &mut out,
                // NOTE(unicode)
                &loc.clone()
                    .unwrap_or(SubStr::new(Arc::clone(expr.src()), expr.src().len(), 1)),
            )?;
            writeln!(out, "evaluation error: {err}")?;

            if loc.is_none() {
                writeln!(
                    out,
                    "note: exactly 1 final value is expected on the stack after evaluation"
                )?;
            }

            match err.typ {
                EvalErrTyp::StackMismatch { .. } => writeln!(
                    out,
                    "note: implicit multiplication is not supported, so for example '5x' would be '5*x'",
                )?,
                EvalErrTyp::UndefinedIdent { ref text } => {
                    let idents = bindings.idents();
                    let similar =
                        shell::most_similar(text.get(), idents.keys().map(|key| key.get()));
                    if let Some(key) = similar {
                        let ident_typ = match idents.get(&IdentKey::Owned(key.to_string())) {
                            Some(Ident::Var(_)) => "variable",
                            Some(Ident::Const(_)) => "constant",
                            Some(Ident::Fun(_)) | None => "function",
                        };
                        writeln!(out, "note: {ident_typ} '{key}' has a similar name")?;
                    }
                }
                EvalErrTyp::Empty
                | EvalErrTyp::MissingArgs { .. }
                | EvalErrTyp::NullVar { .. } => {}
            }
            return Ok(());
        }
    }

    let mut config = state.config.clone();
    config.functions.push(PlotFunction::new(input));
    state.rebuild(config, true)?;
    Ok(())
}

fn report_parse<W: Write>(mut out: W, err: &ParseErr) -> anyhow::Result<()> {
    writeln!(out)?;
    shell::underline(&mut out, &err.loc)?;
    writeln!(out, "parse error: {}", err.typ)?;
    match err.typ {
        ParseErrTyp::LexErr(LexErrTyp::InvalidChar) => writeln!(
            out,
            "note: available tokens are numbers, identifiers, and symbols +-*/%^<>=!,()"
        )?,
        ParseErrTyp::LexErr(LexErrTyp::Unsupported(typ)) => match typ {
            TokTyp::XEqual => {
                writeln!(out, "note: expected an expression but found an equation")?;
                writeln!(out, "note: use '==' to compare two values")?;
            }
            TokTyp::XPipe => writeln!(
                out,
                "note: use the 'abs' function to compute absolute value"
            )?,
            TokTyp::XBang => writeln!(out, "note: use '!=' to test for inequality")?,
            TokTyp::XAmpersand | TokTyp::XQuestion | TokTyp::XColon => {
                writeln!(out, "note: logical and conditional operators are not supported")?;
            }
            TokTyp::XOpenSquareBracket
            | TokTyp::XCloseSquareBracket
            | TokTyp::XOpenCurly
            | TokTyp::XCloseCurly => writeln!(out, "note: only round parentheses group")?,
            TokTyp::Ident
            | TokTyp::Number
            | TokTyp::Op(_)
            | TokTyp::Comma
            | TokTyp::OpenParen
            | TokTyp::CloseParen => {}
        },
        ParseErrTyp::ParseNum(_) => writeln!(out, "note: parsing as floating point number")?,
        ParseErrTyp::ParenMismatch => {}
    }
    Ok(())
}
