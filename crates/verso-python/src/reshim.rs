use std::ffi::OsString;

fn is_versioned(command: &str, base: &str) -> bool {
    command
        .strip_prefix(base)
        .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit() || c == '.'))
}

/// pip general options that take their value as the next argument.
const PIP_VALUE_FLAGS: &[&str] = &[
    "--log",
    "--proxy",
    "--retries",
    "--timeout",
    "--exists-action",
    "--trusted-host",
    "--cert",
    "--client-cert",
    "--cache-dir",
    "--python",
    "--use-feature",
    "--use-deprecated",
];

fn changes_packages<'a>(mut args: impl Iterator<Item = &'a str>) -> bool {
    while let Some(arg) = args.next() {
        if !arg.starts_with('-') {
            return matches!(arg, "install" | "uninstall");
        }
        if PIP_VALUE_FLAGS.contains(&arg) {
            args.next();
        }
    }
    false
}

/// `python -m pip install ...` or `python -mpip uninstall ...`.
fn runs_pip_module(args: &[OsString]) -> bool {
    let mut args = args.iter().filter_map(|arg| arg.to_str());
    while let Some(arg) = args.next() {
        let module = match arg {
            "-m" => args.next(),
            _ => arg.strip_prefix("-m").filter(|rest| !rest.is_empty()),
        };
        if let Some(module) = module {
            return is_versioned(module, "pip") && changes_packages(&mut args);
        }
        if !arg.starts_with('-') {
            return false;
        }
    }
    false
}

pub(crate) fn should_reshim(command: &str, args: &[OsString]) -> bool {
    if is_versioned(command, "pip") {
        return changes_packages(args.iter().filter_map(|arg| arg.to_str()));
    }
    if is_versioned(command, "python") {
        return runs_pip_module(args);
    }
    false
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::should_reshim;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn pip_install_and_uninstall_trigger_reshim() {
        assert!(should_reshim("pip", &args(&["install", "black"])));
        assert!(should_reshim("pip3", &args(&["--quiet", "uninstall", "-y", "black"])));
        assert!(should_reshim("pip3.12", &args(&["install", "-r", "req.txt"])));
    }

    #[test]
    fn pip_option_values_are_not_mistaken_for_commands() {
        assert!(should_reshim(
            "pip",
            &args(&["--proxy", "http://proxy:3128", "install", "black"])
        ));
        assert!(should_reshim(
            "python3",
            &args(&["-m", "pip", "--timeout", "30", "uninstall", "black"])
        ));
        assert!(!should_reshim("pip", &args(&["--log", "install", "list"])));
    }

    #[test]
    fn read_only_pip_commands_do_not() {
        assert!(!should_reshim("pip", &args(&["list"])));
        assert!(!should_reshim("pip", &args(&["show", "install"])));
        assert!(!should_reshim("pipx", &args(&["install", "black"])));
    }

    #[test]
    fn python_dash_m_pip_is_recognised() {
        assert!(should_reshim("python", &args(&["-m", "pip", "install", "black"])));
        assert!(should_reshim("python3", &args(&["-I", "-mpip", "uninstall", "black"])));
        assert!(!should_reshim("python", &args(&["-m", "venv", "install"])));
        assert!(!should_reshim("python", &args(&["script.py", "-m", "pip", "install"])));
        assert!(!should_reshim("python", &args(&["-m", "pip", "freeze"])));
    }
}
