use std::ffi::OsString;

const NPM_MUTATING_COMMANDS: &[&str] = &[
    "install", "i", "add", "isntall", "uninstall", "un", "remove", "rm", "r", "unlink", "link",
    "ln", "update", "up", "upgrade",
];

/// npm options that take their value as the next argument.
const NPM_VALUE_FLAGS: &[&str] = &[
    "--prefix", "-C", "--registry", "--cache", "--userconfig", "--globalconfig", "--workspace",
    "-w", "--loglevel", "--location", "--tag",
];

fn utf8_args(args: &[OsString]) -> impl Iterator<Item = &str> {
    args.iter().filter_map(|arg| arg.to_str())
}

/// First positional argument, skipping flags and the values of `value_flags`.
fn subcommand<'a>(
    mut args: impl Iterator<Item = &'a str>,
    value_flags: &[&str],
) -> Option<&'a str> {
    while let Some(arg) = args.next() {
        if !arg.starts_with('-') {
            return Some(arg);
        }
        if value_flags.contains(&arg) {
            args.next();
        }
    }
    None
}

/// Whether an `npm` invocation installs or removes global packages.
#[must_use]
pub fn npm_changes_global_packages(args: &[OsString]) -> bool {
    let mut global = utf8_args(args)
        .any(|arg| matches!(arg, "-g" | "--global" | "--location=global"));
    global |= utf8_args(args)
        .zip(utf8_args(args).skip(1))
        .any(|(flag, value)| flag == "--location" && value == "global");

    global
        && subcommand(utf8_args(args), NPM_VALUE_FLAGS)
            .is_some_and(|command| NPM_MUTATING_COMMANDS.contains(&command))
}

/// `corepack enable` and `corepack disable` add or remove package manager
/// shims next to node.
fn corepack_changes_shims(args: &[OsString]) -> bool {
    subcommand(utf8_args(args), &["--install-directory"])
        .is_some_and(|command| matches!(command, "enable" | "disable"))
}

pub(crate) fn should_reshim(command: &str, args: &[OsString]) -> bool {
    match command {
        "npm" => npm_changes_global_packages(args),
        "corepack" => corepack_changes_shims(args),
        _ => false,
    }
}
