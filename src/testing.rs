//! Shell-script stand-ins for clang, opt and llvm-dis.
//!
//! The scripts are run as `sh <script> ...` through the toolchain's leading
//! arguments, so nothing has to be marked executable. Their behaviour is
//! keyed off markers in the source text:
//!
//! - `#error <msg>`: clang fails in every mode and writes nothing
//! - `NO_IR`: `-emit-llvm` succeeds without producing a file
//! - `WARN`: clang prints a warning but still succeeds

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::toolchain::{OptLevel, ToolCommand, Toolchain};

const FAKE_CLANG: &str = r##"
mode=asm
out=
src=
prev=
for arg in "$@"; do
  case "$arg" in
    -ast-dump) mode=ast ;;
    -emit-llvm) mode=ir ;;
    *.c) src="$arg" ;;
  esac
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
if grep -q '#error' "$src"; then
  echo "$src:1:2: error: $(sed -n 's/.*#error *//p' "$src" | head -n 1)" >&2
  exit 1
fi
if grep -q 'WARN' "$src"; then
  echo "$src:1:1: warning: demo warning" >&2
fi
case "$mode" in
  ast)
    echo "TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>"
    sed -n 's/^int \([a-z_]*\)(.*/|-FunctionDecl 0x2 <line:1:1> col:5 used \1/p' "$src"
    ;;
  ir)
    if grep -q 'NO_IR' "$src"; then exit 0; fi
    echo "; ModuleID = '$src'" > "$out"
    sed -n 's/^int \([a-z_]*\)(.*/define i32 @\1()/p' "$src" >> "$out"
    ;;
  asm)
    printf '\t.text\n' > "$out"
    sed -n 's/^int \([a-z_]*\)(.*/\1:/p' "$src" >> "$out"
    ;;
esac
"##;

const FAKE_OPT: &str = r##"
if [ ! -f "$2" ]; then
  echo "opt: $2: error: Could not open input file: No such file or directory" >&2
  exit 1
fi
echo "; optimized with $1" > "$4"
cat "$2" >> "$4"
"##;

const FAKE_LLVM_DIS: &str = r##"
if [ ! -f "$1" ]; then
  echo "llvm-dis: error: Could not open input file '$1': No such file or directory" >&2
  exit 1
fi
cp "$1" "$3"
"##;

/// Scripts plus a dedicated workspace root, removed on drop.
pub struct FakeToolchain {
    dir: TempDir,
    toolchain: Toolchain,
}

impl FakeToolchain {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create fake toolchain dir");
        let workspaces = dir.path().join("workspaces");
        fs::create_dir(&workspaces).expect("create workspace root");

        let script = |name: &str, body: &str| -> ToolCommand {
            let path = dir.path().join(name);
            fs::write(&path, body).expect("write fake tool");
            ToolCommand::new("sh").with_arg(path.to_string_lossy())
        };

        let toolchain = Toolchain {
            clang: script("clang.sh", FAKE_CLANG),
            opt: script("opt.sh", FAKE_OPT),
            llvm_dis: script("llvm-dis.sh", FAKE_LLVM_DIS),
            opt_level: OptLevel::O3,
            workspace_root: Some(workspaces),
        };

        Self { dir, toolchain }
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Where every run's workspace is created.
    pub fn workspace_root(&self) -> PathBuf {
        self.dir.path().join("workspaces")
    }

    /// Number of leftover entries under the workspace root.
    pub fn leftover_workspaces(&self) -> usize {
        count_entries(&self.workspace_root())
    }
}

fn count_entries(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
