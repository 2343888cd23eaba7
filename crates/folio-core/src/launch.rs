use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Port the worker's embedded HTTP server listens on. Window URLs and the
/// startup expression must agree on this value.
pub const SERVER_PORT: u16 = 8000;

/// Bind address handed to the worker server.
pub const SERVER_BIND_ADDR: &str = "0.0.0.0";

#[cfg(windows)]
const RSCRIPT_FILE_NAME: &str = "Rscript.exe";
#[cfg(not(windows))]
const RSCRIPT_FILE_NAME: &str = "Rscript";

/// Whether the launcher runs from an installed bundle or a source checkout.
/// Only the location of the worker's config directory differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallMode {
    Packaged,
    Dev,
}

impl InstallMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallMode::Packaged => "packaged",
            InstallMode::Dev => "dev",
        }
    }
}

/// On-disk shape of the bundled R distribution under a resources root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerLayout {
    pub r_home: PathBuf,
    pub rscript: PathBuf,
    pub app_dir: PathBuf,
}

impl WorkerLayout {
    /// Resolve the R-Portable tree under `resources_root`.
    ///
    /// The portable distribution nests the real R home two levels down
    /// (`R-Portable/App/R-Portable`). The worker's sources and its
    /// `rhino.yml` are copied into `app/` by the bundler; a dev checkout
    /// keeps them at the root.
    pub fn resolve(mode: InstallMode, resources_root: &Path) -> Self {
        let r_home = resources_root
            .join("R-Portable")
            .join("App")
            .join("R-Portable");
        let rscript = r_home.join("bin").join(RSCRIPT_FILE_NAME);
        let app_dir = match mode {
            InstallMode::Packaged => resources_root.join("app"),
            InstallMode::Dev => resources_root.to_path_buf(),
        };
        Self {
            r_home,
            rscript,
            app_dir,
        }
    }
}

/// Inline R expression handed to `Rscript -e`: pin the working directory
/// (the worker resolves `rhino.yml` relative to it), configure the embedded
/// server, then hand control to the application entry point.
pub fn startup_expression(app_dir: &Path) -> String {
    format!(
        "setwd(\"{}\");options(shiny.port={SERVER_PORT}, shiny.host='{SERVER_BIND_ADDR}', shiny.launch.browser=FALSE);rhino::app()",
        forward_slashes(app_dir),
    )
}

/// Normalize a path into the forward-slash form R accepts in string
/// literals on every platform. Backslashes would need escaping inside the
/// expression.
pub fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[derive(thiserror::Error, Debug)]
pub enum LaunchError {
    #[error("cannot splice worker bin dir into PATH: {0}")]
    JoinPaths(#[from] env::JoinPathsError),
}

/// Everything needed to spawn the worker, assembled as plain data before
/// any process exists so the whole invocation can be logged and tested.
#[derive(Clone, Debug)]
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(&'static str, OsString)>,
}

impl LaunchPlan {
    /// Build the invocation for a resolved layout: a literal two-element
    /// argv (never a shell string), cwd pinned to the R home, and an
    /// environment overlay setting `R_HOME` and prepending the worker's
    /// bin directory to `PATH`.
    pub fn for_layout(layout: &WorkerLayout) -> Result<Self, LaunchError> {
        let args = vec!["-e".to_string(), startup_expression(&layout.app_dir)];
        let env = vec![
            ("R_HOME", layout.r_home.clone().into_os_string()),
            ("PATH", prepend_to_path(layout.r_home.join("bin"))?),
        ];
        Ok(Self {
            program: layout.rscript.clone(),
            args,
            cwd: layout.r_home.clone(),
            env,
        })
    }
}

/// `PATH` value with `dir` prepended to the parent's search path, joined
/// with the platform's list separator.
fn prepend_to_path(dir: PathBuf) -> Result<OsString, LaunchError> {
    let mut entries = vec![dir];
    if let Some(current) = env::var_os("PATH") {
        entries.extend(env::split_paths(&current));
    }
    Ok(env::join_paths(entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_places_rscript_under_nested_r_home() {
        let root = Path::new("/opt/folio/resources");
        let layout = WorkerLayout::resolve(InstallMode::Packaged, root);
        assert_eq!(layout.r_home, root.join("R-Portable/App/R-Portable"));
        assert_eq!(layout.rscript.parent().unwrap(), layout.r_home.join("bin"));
        let file = layout.rscript.file_name().unwrap().to_string_lossy();
        if cfg!(windows) {
            assert_eq!(file, "Rscript.exe");
        } else {
            assert_eq!(file, "Rscript");
        }
    }

    #[test]
    fn app_dir_depends_on_install_mode() {
        let root = Path::new("/srv/folio");
        let packaged = WorkerLayout::resolve(InstallMode::Packaged, root);
        assert_eq!(packaged.app_dir, root.join("app"));
        let dev = WorkerLayout::resolve(InstallMode::Dev, root);
        assert_eq!(dev.app_dir, root);
    }

    #[test]
    fn startup_expression_pins_port_host_and_entry_point() {
        let expr = startup_expression(Path::new("/srv/folio/app"));
        assert_eq!(
            expr,
            "setwd(\"/srv/folio/app\");options(shiny.port=8000, shiny.host='0.0.0.0', shiny.launch.browser=FALSE);rhino::app()"
        );
    }

    #[test]
    fn startup_expression_normalizes_backslashes() {
        let expr = startup_expression(Path::new(r"C:\folio\resources\app"));
        assert!(expr.starts_with("setwd(\"C:/folio/resources/app\")"), "{expr}");
    }

    #[test]
    fn plan_is_literal_argv_with_env_overlay() {
        let layout = WorkerLayout::resolve(InstallMode::Dev, Path::new("/srv/folio"));
        let plan = LaunchPlan::for_layout(&layout).unwrap();
        assert_eq!(plan.program, layout.rscript);
        assert_eq!(plan.cwd, layout.r_home);
        assert_eq!(plan.args.len(), 2);
        assert_eq!(plan.args[0], "-e");
        assert!(plan.args[1].ends_with("rhino::app()"));

        let (_, r_home) = plan.env.iter().find(|(k, _)| *k == "R_HOME").unwrap();
        assert_eq!(r_home.as_os_str(), layout.r_home.as_os_str());
        let (_, path) = plan.env.iter().find(|(k, _)| *k == "PATH").unwrap();
        let first = env::split_paths(path).next().unwrap();
        assert_eq!(first, layout.r_home.join("bin"));
    }
}
