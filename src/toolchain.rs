//! External toolchain configuration.
//!
//! A [`Toolchain`] names the three programs the pipeline drives (compiler
//! frontend, optimizer, disassembler) and the optimization level handed to
//! the optimizer. The pipeline itself never looks at the environment;
//! [`Toolchain::from_env`] is for the binary's configuration layer.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{VizError, VizResult};

pub const CLANG_ENV: &str = "CCVIZ_CLANG";
pub const OPT_ENV: &str = "CCVIZ_OPT";
pub const LLVM_DIS_ENV: &str = "CCVIZ_LLVM_DIS";
pub const OPT_LEVEL_ENV: &str = "CCVIZ_OPT_LEVEL";

/// A program plus the arguments that always precede the stage arguments.
///
/// `xcrun clang` parses to program `xcrun` with leading argument `clang`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a leading argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Parse a whitespace separated command line such as `xcrun clang`.
    pub fn parse(line: &str) -> VizResult<Self> {
        let mut words = line.split_whitespace();
        let program = words.next().ok_or(VizError::EmptyCommand)?;
        Ok(Self {
            program: program.to_string(),
            args: words.map(str::to_string).collect(),
        })
    }
}

impl FromStr for ToolCommand {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Optimization level passed to the optimizer as `-O<level>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OptLevel {
    O0,
    O1,
    O2,
    #[default]
    O3,
    Os,
    Oz,
}

impl OptLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::O0 => "O0",
            Self::O1 => "O1",
            Self::O2 => "O2",
            Self::O3 => "O3",
            Self::Os => "Os",
            Self::Oz => "Oz",
        }
    }

    /// The optimizer flag, e.g. `-O3`.
    pub fn flag(self) -> String {
        format!("-{}", self.as_str())
    }
}

impl FromStr for OptLevel {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('-');
        let level = trimmed.strip_prefix('O').unwrap_or(trimmed);
        match level {
            "0" => Ok(Self::O0),
            "1" => Ok(Self::O1),
            "2" => Ok(Self::O2),
            "3" => Ok(Self::O3),
            "s" => Ok(Self::Os),
            "z" => Ok(Self::Oz),
            _ => Err(VizError::InvalidOptLevel(s.to_string())),
        }
    }
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The external programs a pipeline run invokes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
    /// C frontend used for the AST dump, IR emission and assembly.
    pub clang: ToolCommand,
    /// IR optimizer.
    pub opt: ToolCommand,
    /// Bitcode disassembler.
    pub llvm_dis: ToolCommand,
    pub opt_level: OptLevel,
    /// Directory the per-run workspace is created in. `None` means the
    /// system temporary directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            clang: ToolCommand::new("clang"),
            opt: ToolCommand::new("opt"),
            llvm_dis: ToolCommand::new("llvm-dis"),
            opt_level: OptLevel::default(),
            workspace_root: None,
        }
    }
}

impl Toolchain {
    /// Defaults overridden by `CCVIZ_*` environment variables.
    pub fn from_env() -> VizResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Toolchain::from_env`] with an injectable variable lookup.
    pub fn from_lookup<F>(lookup: F) -> VizResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut toolchain = Self::default();
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = set(CLANG_ENV) {
            toolchain.clang = value.parse()?;
        }
        if let Some(value) = set(OPT_ENV) {
            toolchain.opt = value.parse()?;
        }
        if let Some(value) = set(LLVM_DIS_ENV) {
            toolchain.llvm_dis = value.parse()?;
        }
        if let Some(value) = set(OPT_LEVEL_ENV) {
            toolchain.opt_level = value.parse()?;
        }
        Ok(toolchain)
    }
}
