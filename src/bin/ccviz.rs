//! ccviz CLI - compiler pipeline visualizer.
//!
//! Usage:
//!   ccviz                 - interactive session with the sample program
//!   ccviz <file.c>        - run the pipeline once and print every panel
//!   ccviz --json <file.c> - same, as JSON
//!   ccviz --gui           - open the egui window (feature `gui`)

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use log::{debug, LevelFilter};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use ccviz::presentation::{render_all, render_diagnostics, render_panel};
use ccviz::{OptLevel, PanelKind, PipelineRun, Session, ToolCommand, Toolchain, VizResult};

const HELP: &str = r#"
COMMANDS:
    :run, :r                 Run the compiler pipeline on the current source
    :show [panel]            Show one panel (source, ast, ir, opt, asm) or all
    :source, :src            Show the current source
    :edit, :e                Enter new source; finish with a line containing "."
    :load <file>             Replace the source with a file's contents
    :reset                   Restore the sample program
    :diag [n|all|none]       Expand or collapse compiler messages
    :json                    Print the last run as JSON
    :toolchain               Show the configured tools
    :clear, :c               Clear screen
    :help, :h                Show help
    :quit, :q, :exit         Exit
"#;

/// Compiler pipeline visualizer for C and LLVM
#[derive(Parser, Debug)]
#[command(name = "ccviz")]
#[command(version)]
#[command(about = "Shows the AST, LLVM IR, optimized IR and assembly for C source", long_about = None)]
struct Cli {
    /// C source file to run once ("-" for stdin). Omit for the interactive session.
    file: Option<PathBuf>,

    /// Print the run as JSON instead of panels
    #[arg(long, requires = "file")]
    json: bool,

    /// Open the GUI window
    #[arg(long, conflicts_with_all = ["file", "json"])]
    gui: bool,

    /// C frontend command [env: CCVIZ_CLANG]
    #[arg(long, value_name = "CMD")]
    clang: Option<ToolCommand>,

    /// Optimizer command [env: CCVIZ_OPT]
    #[arg(long, value_name = "CMD")]
    opt: Option<ToolCommand>,

    /// Disassembler command [env: CCVIZ_LLVM_DIS]
    #[arg(long = "llvm-dis", value_name = "CMD")]
    llvm_dis: Option<ToolCommand>,

    /// Optimization level: O0, O1, O2, O3, Os or Oz [env: CCVIZ_OPT_LEVEL]
    #[arg(short = 'O', long = "opt-level", value_name = "LEVEL")]
    opt_level: Option<OptLevel>,

    /// Directory for per-run temporary workspaces
    #[arg(long, value_name = "DIR")]
    workspace_root: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Flags override environment, environment overrides defaults.
    fn toolchain(&self) -> VizResult<Toolchain> {
        let mut toolchain = Toolchain::from_env()?;
        if let Some(clang) = &self.clang {
            toolchain.clang = clang.clone();
        }
        if let Some(opt) = &self.opt {
            toolchain.opt = opt.clone();
        }
        if let Some(llvm_dis) = &self.llvm_dis {
            toolchain.llvm_dis = llvm_dis.clone();
        }
        if let Some(level) = self.opt_level {
            toolchain.opt_level = level;
        }
        if let Some(root) = &self.workspace_root {
            toolchain.workspace_root = Some(root.clone());
        }
        Ok(toolchain)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.no_color || !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let toolchain = match cli.toolchain() {
        Ok(toolchain) => toolchain,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };
    debug!("toolchain: {:?}", toolchain);

    if cli.gui {
        return run_gui(toolchain);
    }

    match &cli.file {
        Some(path) => run_file(path, toolchain, cli.json),
        None => {
            run_repl(toolchain);
            ExitCode::SUCCESS
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("ccviz", level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

#[cfg(feature = "gui")]
fn run_gui(toolchain: Toolchain) -> ExitCode {
    match ccviz::gui::run_gui(toolchain) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "gui"))]
fn run_gui(_toolchain: Toolchain) -> ExitCode {
    eprintln!(
        "{} ccviz was built without the `gui` feature",
        "error:".red().bold()
    );
    ExitCode::FAILURE
}

fn read_source(path: &Path) -> io::Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        fs::read_to_string(path)
    }
}

/// Run the pipeline once on a file and print the result.
fn run_file(path: &Path, toolchain: Toolchain, json: bool) -> ExitCode {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!(
                "{} cannot read '{}': {}",
                "error:".red().bold(),
                path.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };

    let mut session = Session::with_source(toolchain, source);
    session.trigger();

    if json {
        return match session.last_run().map(serde_json::to_string_pretty) {
            Some(Ok(text)) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Some(Err(e)) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                ExitCode::FAILURE
            }
            None => ExitCode::FAILURE,
        };
    }

    session.expand_all_diagnostics();
    print!("{}", render_all(&session.presentation(), session.expanded()));
    ExitCode::SUCCESS
}

fn run_repl(toolchain: Toolchain) {
    println!("ccviz {} - compiler pipeline visualizer", env!("CARGO_PKG_VERSION"));
    println!("The sample program is loaded. Type :run to compile it, :help for commands.\n");

    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Failed to initialize readline: {}", e);
            return;
        }
    };

    // History stays in memory; nothing outlives the session.
    let mut session = Session::new(toolchain);

    loop {
        match rl.readline("ccviz> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if !line.starts_with(':') {
                    println!("Commands start with ':'. Use :edit to change the source, :run to compile.");
                    continue;
                }

                match handle_command(line, &mut session, &mut rl) {
                    CommandResult::Continue => {}
                    CommandResult::Exit => break,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }
}

enum CommandResult {
    Continue,
    Exit,
}

fn handle_command(cmd: &str, session: &mut Session, rl: &mut DefaultEditor) -> CommandResult {
    let parts: Vec<&str> = cmd.splitn(2, ' ').collect();
    let command = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).filter(|s| !s.is_empty());

    match command {
        ":help" | ":h" => println!("{}", HELP),
        ":quit" | ":q" | ":exit" => return CommandResult::Exit,
        ":clear" | ":c" => print!("\x1B[2J\x1B[1;1H"),
        ":run" | ":r" => {
            println!("Running compiler pipeline...");
            let summary = summarize(session.trigger());
            print!("{}", render_all(&session.presentation(), session.expanded()));
            println!("{}", summary.dimmed());
        }
        ":show" => show(arg, session),
        ":source" | ":src" => show(Some("source"), session),
        ":edit" | ":e" => edit_source(session, rl),
        ":load" | ":l" => match arg {
            Some(path) => load_file(path, session),
            None => println!("Usage: :load <file.c>"),
        },
        ":reset" => {
            session.reset_source();
            println!("Sample program restored.");
        }
        ":diag" | ":d" => diag(arg, session),
        ":json" => match session.last_run() {
            Some(run) => match serde_json::to_string_pretty(run) {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("Serialization error: {}", e),
            },
            None => println!("Nothing has run yet. Type :run first."),
        },
        ":toolchain" => {
            let tc = session.toolchain();
            println!("  clang:    {}", tc.clang);
            println!("  opt:      {} {}", tc.opt, tc.opt_level.flag());
            println!("  llvm-dis: {}", tc.llvm_dis);
            if let Some(root) = &tc.workspace_root {
                println!("  workspaces under {}", root.display());
            }
        }
        _ => {
            println!("Unknown command: {}", command);
            println!("Type :help for available commands.");
        }
    }
    CommandResult::Continue
}

fn summarize(run: &PipelineRun) -> String {
    format!(
        "finished in {} ms: {} of 4 artifacts, {} compiler message(s)",
        run.elapsed_ms,
        run.non_empty_artifacts(),
        run.diagnostics.len()
    )
}

fn show(arg: Option<&str>, session: &Session) {
    let presentation = session.presentation();
    match arg {
        None | Some("all") => print!("{}", render_all(&presentation, session.expanded())),
        Some(name) => match name.parse::<PanelKind>() {
            Ok(kind) => print!("{}", render_panel(presentation.panel(kind))),
            Err(e) => println!("{}", e),
        },
    }
}

fn diag(arg: Option<&str>, session: &mut Session) {
    match arg {
        Some("all") => session.expand_all_diagnostics(),
        Some("none") => session.collapse_all_diagnostics(),
        Some(n) => match n.parse::<usize>() {
            Ok(n) if session.toggle_diagnostic(n) => {}
            _ => {
                println!("No compiler message '{}'.", n);
                return;
            }
        },
        None => {}
    }

    let presentation = session.presentation();
    if presentation.diagnostics.is_empty() {
        println!("No compiler messages.");
    } else {
        print!(
            "{}",
            render_diagnostics(&presentation.diagnostics, session.expanded())
        );
    }
}

/// Read source lines until a lone ".". Ctrl-C keeps the old source.
fn edit_source(session: &mut Session, rl: &mut DefaultEditor) {
    println!("Enter C source. Finish with a line containing only \".\" (Ctrl-C cancels).");
    let mut lines = Vec::new();
    loop {
        match rl.readline("  | ") {
            Ok(line) if line.trim() == "." => break,
            Ok(line) => lines.push(line),
            Err(ReadlineError::Eof) => break,
            Err(ReadlineError::Interrupted) => {
                println!("Edit cancelled.");
                return;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                return;
            }
        }
    }
    session.set_source(lines.join("\n"));
    println!("Source updated ({} lines). Type :run to compile.", lines.len());
}

fn load_file(path: &str, session: &mut Session) {
    match fs::read_to_string(path) {
        Ok(source) => {
            let lines = source.lines().count();
            session.set_source(source);
            println!("Loaded {} ({} lines).", path, lines);
        }
        Err(e) => eprintln!("Error reading '{}': {}", path, e),
    }
}
