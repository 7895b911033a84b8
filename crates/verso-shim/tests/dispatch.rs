use std::cell::{Cell, RefCell};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use verso_platform::VersoPaths;
use verso_provider::{
    InstalledVersion, Provider, ProviderError, Registry, ResolvedVersion, Version, VersionSource,
};
use verso_shim::{
    Console, DispatchContext, DispatchError, Dispatcher, ProcessRunner, Resolution, ShimManager,
    ShimMap,
};

struct FakeRuntime {
    name: &'static str,
    shims: &'static [&'static str],
    root: PathBuf,
    configured: Option<&'static str>,
    reshim_on: &'static str,
}

impl FakeRuntime {
    fn bin_dir(&self, version: &Version) -> PathBuf {
        self.root
            .join("runtimes")
            .join(self.name)
            .join(version.as_str())
            .join("bin")
    }
}

impl Provider for FakeRuntime {
    fn name(&self) -> &'static str {
        self.name
    }

    fn display_name(&self) -> &'static str {
        self.name
    }

    fn shim_names(&self) -> &'static [&'static str] {
        self.shims
    }

    fn installed_versions(&self) -> Result<Vec<InstalledVersion>, ProviderError> {
        Ok(self
            .configured
            .map(Version::new)
            .filter(|version| self.is_installed(version))
            .map(|version| InstalledVersion {
                path: self.bin_dir(&version),
                version,
            })
            .into_iter()
            .collect())
    }

    fn is_installed(&self, version: &Version) -> bool {
        self.bin_dir(version).is_dir()
    }

    fn install_dir(&self, version: &Version) -> PathBuf {
        self.root.join("runtimes").join(self.name).join(version.as_str())
    }

    fn executable_path(&self, version: &Version) -> Result<PathBuf, ProviderError> {
        Ok(self.bin_dir(version).join(tool_file(self.name)))
    }

    fn executable_dirs(&self, version: &Version) -> Vec<PathBuf> {
        vec![self.bin_dir(version)]
    }

    fn global_version(&self) -> Result<Option<Version>, ProviderError> {
        Ok(self.configured.map(Version::new))
    }

    fn set_global_version(&self, _version: &Version) -> Result<(), ProviderError> {
        Ok(())
    }

    fn local_version(&self, _dir: &Path) -> Result<Option<Version>, ProviderError> {
        Ok(None)
    }

    fn set_local_version(&self, _dir: &Path, _version: &Version) -> Result<(), ProviderError> {
        Ok(())
    }

    fn current_version(&self, _cwd: &Path) -> Result<ResolvedVersion, ProviderError> {
        match self.configured {
            Some(version) => Ok(ResolvedVersion {
                version: Version::new(version),
                source: VersionSource::Global(self.root.join("runtimes.json")),
            }),
            None => Err(ProviderError::not_configured(self.name)),
        }
    }

    fn should_reshim(&self, command: &str, args: &[OsString]) -> bool {
        args.first().is_some_and(|arg| arg == self.reshim_on) && command == self.name
    }
}

#[derive(Default)]
struct RecordingRunner {
    exit_code: i32,
    calls: RefCell<Vec<(PathBuf, Vec<OsString>)>>,
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<i32, DispatchError> {
        self.calls
            .borrow_mut()
            .push((program.to_path_buf(), args.to_vec()));
        Ok(self.exit_code)
    }
}

struct FakeConsole {
    answer: bool,
    asked: Cell<usize>,
    notices: RefCell<Vec<String>>,
}

impl FakeConsole {
    fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: Cell::new(0),
            notices: RefCell::new(Vec::new()),
        }
    }
}

impl Console for FakeConsole {
    fn notice(&self, message: &str) {
        self.notices.borrow_mut().push(message.to_string());
    }

    fn confirm(&self, _question: &str) -> bool {
        self.asked.set(self.asked.get() + 1);
        self.answer
    }
}

fn tool_file(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

fn install_tool(dir: &Path, name: &str) -> PathBuf {
    std::fs::create_dir_all(dir).expect("create bin dir");
    let path = dir.join(tool_file(name));
    std::fs::write(&path, "#!/bin/sh\n").expect("write tool");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod tool");
    }
    path
}

struct Fixture {
    _temp_dir: tempfile::TempDir,
    root: PathBuf,
    registry: Registry,
    shims: ShimManager,
    ctx: DispatchContext,
}

impl Fixture {
    fn new(alpha_version: Option<&'static str>) -> Self {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let root = temp_dir.path().join("root");
        let paths = VersoPaths::with_root(&root);
        let target = install_tool(&temp_dir.path().join("bin"), "verso");

        let registry = Registry::new();
        for (name, shims, configured) in [
            ("alpha", &["alpha", "alpha-pkg"] as &'static [&'static str], alpha_version),
            ("beta", &["beta"], Some("2.0.0")),
        ] {
            registry
                .register(Arc::new(FakeRuntime {
                    name,
                    shims,
                    root: root.clone(),
                    configured,
                    reshim_on: "add-global",
                }))
                .expect("register runtime");
        }

        let ctx = DispatchContext {
            paths: paths.clone(),
            cwd: temp_dir.path().to_path_buf(),
            search_path: OsString::new(),
        };
        let shims = ShimManager::new(&paths, target);

        Self {
            _temp_dir: temp_dir,
            root,
            registry,
            shims,
            ctx,
        }
    }

    fn alpha_bin(&self, version: &str) -> PathBuf {
        self.root
            .join("runtimes")
            .join("alpha")
            .join(version)
            .join("bin")
    }

    fn dispatch(
        &self,
        argv0: &str,
        args: &[&str],
        runner: &RecordingRunner,
        console: &FakeConsole,
    ) -> Result<i32, DispatchError> {
        let args: Vec<OsString> = args.iter().map(OsString::from).collect();
        Dispatcher::new(&self.registry, &self.shims, &self.ctx, runner, runner, console)
            .dispatch(OsStr::new(argv0), &args)
    }
}

#[test]
fn forwards_arguments_to_the_configured_version() {
    let fixture = Fixture::new(Some("1.2.3"));
    let alpha = install_tool(&fixture.alpha_bin("1.2.3"), "alpha");
    let runner = RecordingRunner::default();
    let console = FakeConsole::answering(true);

    let code = fixture
        .dispatch("/shims/alpha", &["run", "--flag", "x y"], &runner, &console)
        .expect("dispatch succeeds");

    assert_eq!(code, 0);
    assert_eq!(
        runner.calls.borrow().as_slice(),
        [(
            alpha,
            vec![
                OsString::from("run"),
                OsString::from("--flag"),
                OsString::from("x y")
            ]
        )]
    );
}

#[test]
fn child_exit_code_is_returned_not_wrapped() {
    let fixture = Fixture::new(Some("1.2.3"));
    install_tool(&fixture.alpha_bin("1.2.3"), "alpha");
    let runner = RecordingRunner {
        exit_code: 42,
        ..RecordingRunner::default()
    };

    let code = fixture
        .dispatch("alpha", &[], &runner, &FakeConsole::answering(true))
        .expect("non-zero exit is not an error");

    assert_eq!(code, 42);
}

#[test]
fn cached_secondary_tool_runs_from_its_runtime() {
    let fixture = Fixture::new(Some("1.2.3"));
    let formatter = install_tool(&fixture.alpha_bin("1.2.3"), "alpha-fmt");
    fixture
        .shims
        .cache()
        .save(&ShimMap::from([(
            "alpha-fmt".to_string(),
            "alpha".to_string(),
        )]))
        .expect("seed shim cache");
    let runner = RecordingRunner::default();

    fixture
        .dispatch("alpha-fmt", &["--check"], &runner, &FakeConsole::answering(true))
        .expect("dispatch succeeds");

    assert_eq!(runner.calls.borrow()[0].0, formatter);
}

#[test]
fn prefix_match_maps_versioned_names_to_their_runtime() {
    let fixture = Fixture::new(Some("1.2.3"));
    let alpha = install_tool(&fixture.alpha_bin("1.2.3"), "alpha");
    let runner = RecordingRunner::default();

    assert_eq!(
        Dispatcher::new(
            &fixture.registry,
            &fixture.shims,
            &fixture.ctx,
            &runner,
            &runner,
            &FakeConsole::answering(true)
        )
        .runtime_for("alpha3"),
        "alpha"
    );

    let result = fixture.dispatch("alpha3", &[], &runner, &FakeConsole::answering(true));

    assert!(matches!(
        result,
        Err(DispatchError::ExecutableNotFound { ref command, .. }) if command == "alpha3"
    ));
    fixture
        .dispatch("alpha-pkg", &[], &runner, &FakeConsole::answering(true))
        .expect("declared name falls back to the main executable");
    assert_eq!(runner.calls.borrow()[0].0, alpha);
}

#[test]
fn unknown_command_is_treated_as_a_runtime_name() {
    let fixture = Fixture::new(Some("1.2.3"));
    let runner = RecordingRunner::default();

    let error = fixture
        .dispatch("gamma", &[], &runner, &FakeConsole::answering(true))
        .expect_err("gamma is not registered");

    assert!(matches!(error, DispatchError::UnknownRuntime(_)));
    assert!(error.to_string().contains("alpha, beta"));
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn unconfigured_runtime_falls_back_to_system_path_without_the_shims_dir() {
    let mut fixture = Fixture::new(None);
    install_tool(&fixture.ctx.paths.shims_dir(), "alpha");
    let system = install_tool(&fixture.root.join("usr-bin"), "alpha");
    fixture.ctx.search_path = std::env::join_paths([
        fixture.ctx.paths.shims_dir(),
        fixture.root.join("usr-bin"),
    ])
    .expect("join search path");
    let runner = RecordingRunner::default();
    let console = FakeConsole::answering(true);

    fixture
        .dispatch("alpha", &["-v"], &runner, &console)
        .expect("system alpha runs");

    assert_eq!(runner.calls.borrow()[0].0, system);
    assert_eq!(console.notices.borrow().len(), 1);
    assert!(console.notices.borrow()[0].contains("verso global alpha"));
}

#[test]
fn unconfigured_runtime_without_system_binary_is_an_error() {
    let mut fixture = Fixture::new(None);
    install_tool(&fixture.ctx.paths.shims_dir(), "alpha");
    fixture.ctx.search_path = fixture.ctx.paths.shims_dir().into_os_string();
    let runner = RecordingRunner::default();

    let error = fixture
        .dispatch("alpha", &[], &runner, &FakeConsole::answering(true))
        .expect_err("nothing to run");

    assert!(matches!(
        error,
        DispatchError::NotConfigured { ref runtime, .. } if runtime == "alpha"
    ));
    assert!(error.hint().is_some());
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn configured_but_missing_version_never_uses_system_path() {
    let mut fixture = Fixture::new(Some("9.9.9"));
    install_tool(&fixture.root.join("usr-bin"), "alpha");
    fixture.ctx.search_path = fixture.root.join("usr-bin").into_os_string();
    let runner = RecordingRunner::default();

    let error = fixture
        .dispatch("alpha", &[], &runner, &FakeConsole::answering(true))
        .expect_err("9.9.9 is not installed");

    assert!(matches!(
        error,
        DispatchError::NotInstalled { ref version, .. } if version == "9.9.9"
    ));
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn successful_mutating_command_offers_reshim() {
    let fixture = Fixture::new(Some("1.2.3"));
    install_tool(&fixture.alpha_bin("1.2.3"), "alpha");
    install_tool(&fixture.alpha_bin("1.2.3"), "alpha-new-tool");
    let runner = RecordingRunner::default();
    let console = FakeConsole::answering(true);

    let code = fixture
        .dispatch("alpha", &["add-global", "new-tool"], &runner, &console)
        .expect("dispatch succeeds");

    assert_eq!(code, 0);
    assert_eq!(console.asked.get(), 1);
    assert_eq!(
        fixture.shims.cache().lookup("alpha-new-tool").as_deref(),
        Some("alpha")
    );
    assert!(
        fixture
            .shims
            .list_shims()
            .expect("list shims")
            .contains(&"alpha-new-tool".to_string())
    );
}

#[test]
fn declined_or_failed_commands_do_not_reshim() {
    let fixture = Fixture::new(Some("1.2.3"));
    install_tool(&fixture.alpha_bin("1.2.3"), "alpha");
    let declining = FakeConsole::answering(false);

    fixture
        .dispatch(
            "alpha",
            &["add-global", "x"],
            &RecordingRunner::default(),
            &declining,
        )
        .expect("dispatch succeeds");
    let failing_console = FakeConsole::answering(true);
    let code = fixture
        .dispatch(
            "alpha",
            &["add-global", "x"],
            &RecordingRunner {
                exit_code: 1,
                ..RecordingRunner::default()
            },
            &failing_console,
        )
        .expect("non-zero exit is not an error");

    assert_eq!(declining.asked.get(), 1);
    assert_eq!(failing_console.asked.get(), 0);
    assert_eq!(code, 1);
    assert!(fixture.shims.list_shims().expect("list shims").is_empty());
}

#[test]
fn resolve_reports_the_program_without_running_it() {
    let mut fixture = Fixture::new(Some("1.2.3"));
    let alpha = install_tool(&fixture.alpha_bin("1.2.3"), "alpha");
    install_tool(&fixture.root.join("usr-bin"), "beta");
    fixture.ctx.search_path = fixture.root.join("usr-bin").into_os_string();
    let runner = RecordingRunner::default();
    let console = FakeConsole::answering(true);
    let dispatcher = Dispatcher::new(
        &fixture.registry,
        &fixture.shims,
        &fixture.ctx,
        &runner,
        &runner,
        &console,
    );

    assert_eq!(
        dispatcher.resolve("alpha").expect("alpha resolves"),
        Resolution::Managed {
            runtime: "alpha".to_string(),
            version: Version::new("1.2.3"),
            program: alpha,
        }
    );
    assert!(matches!(
        dispatcher.resolve("beta"),
        Err(DispatchError::NotInstalled { .. })
    ));
    assert!(runner.calls.borrow().is_empty());
    assert!(console.notices.borrow().is_empty());
}
