use std::{
    env,
    path::{Path, PathBuf},
};

/// Debugger install directories, most preferred first: x64 before x86,
/// newer kits before older ones.
const CDB_INSTALL_DIRS: &[&str] = &[
    "Windows Kits/10/Debuggers/x64",
    "Windows Kits/10/Debuggers/x86",
    "Windows Kits/8.1/Debuggers/x64",
    "Windows Kits/8.1/Debuggers/x86",
    "Windows Kits/8.0/Debuggers/x64",
    "Windows Kits/8.0/Debuggers/x86",
    "Debugging Tools For Windows (x64)",
    "Debugging Tools For Windows (x86)",
    "Debugging Tools For Windows",
];

/// Program install roots from the environment followed by every `PATH`
/// entry. Unset or empty entries are left out.
pub fn search_roots() -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = ["PROGRAMFILES(X86)", "PROGRAMFILES", "LOCALAPPDATA"]
        .iter()
        .filter_map(env::var_os)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .collect();

    if let Some(path) = env::var_os("PATH") {
        roots.extend(env::split_paths(&path).filter(|p| !p.as_os_str().is_empty()));
    }

    roots
}

pub fn find_installed_application(roots: &[PathBuf], app_path: &Path) -> Option<PathBuf> {
    roots
        .iter()
        .map(|root| root.join(app_path))
        .find(|candidate| candidate.is_file())
}

pub fn find_cdb(roots: &[PathBuf]) -> Option<PathBuf> {
    let exe = format!("cdb{}", env::consts::EXE_SUFFIX);
    CDB_INSTALL_DIRS.iter().find_map(|dir| {
        let found = find_installed_application(roots, &Path::new(dir).join(&exe));
        if let Some(path) = &found {
            tracing::debug!(path = %path.display(), "found cdb");
        }
        found
    })
}
