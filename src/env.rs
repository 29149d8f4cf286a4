use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub fn bootstrap_from_args(args: &[OsString]) -> Result<()> {
    let explicit_env_file = extract_env_file_arg(args);
    load_env(explicit_env_file.as_ref())
}

pub fn load_env(explicit_env_file: Option<&PathBuf>) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let env_file = resolve_env_file(&cwd, explicit_env_file);

    if !env_file.exists() && explicit_env_file.is_none() {
        return Ok(());
    }

    let parsed = dotenvy::from_path_iter(&env_file)
        .with_context(|| format!("failed to read env file {}", env_file.display()))?;
    for item in parsed {
        let (key, value) =
            item.with_context(|| format!("failed to parse env file {}", env_file.display()))?;
        // Process environment always wins over file values.
        if std::env::var_os(&key).is_some() {
            continue;
        }
        std::env::set_var(key, value);
    }
    Ok(())
}

// Clap has not parsed anything when the env file must already be loaded,
// so the flag is pulled out of the raw argv by hand.
fn extract_env_file_arg(args: &[OsString]) -> Option<PathBuf> {
    let mut explicit = None;
    let mut idx = 1usize;
    while idx < args.len() {
        let Some(arg) = args[idx].to_str() else {
            idx += 1;
            continue;
        };

        if arg == "--" {
            break;
        }

        if arg == "--env-file" {
            if let Some(next) = args.get(idx + 1) {
                explicit = Some(PathBuf::from(next));
            }
            idx += 2;
            continue;
        }

        if let Some(value) = arg.strip_prefix("--env-file=") {
            explicit = Some(PathBuf::from(value));
        }

        idx += 1;
    }
    explicit
}

fn resolve_env_file(cwd: &Path, explicit_env_file: Option<&PathBuf>) -> PathBuf {
    match explicit_env_file {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => cwd.join(path),
        None => cwd.join(".env"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_env_file_arg_supports_both_flag_forms() {
        let args: Vec<OsString> = ["tq", "traces", "--env-file", "custom.env"]
            .iter()
            .map(OsString::from)
            .collect();
        assert_eq!(
            extract_env_file_arg(&args),
            Some(PathBuf::from("custom.env"))
        );

        let args: Vec<OsString> = ["tq", "--env-file=other.env", "status"]
            .iter()
            .map(OsString::from)
            .collect();
        assert_eq!(extract_env_file_arg(&args), Some(PathBuf::from("other.env")));

        let args: Vec<OsString> = ["tq", "status"].iter().map(OsString::from).collect();
        assert_eq!(extract_env_file_arg(&args), None);
    }

    #[test]
    fn extract_env_file_arg_stops_at_double_dash() {
        let args: Vec<OsString> = ["tq", "--", "--env-file", "ignored.env"]
            .iter()
            .map(OsString::from)
            .collect();
        assert_eq!(extract_env_file_arg(&args), None);
    }

    #[test]
    fn resolve_env_file_prefers_explicit_path() {
        let cwd = Path::new("/work");
        assert_eq!(
            resolve_env_file(cwd, Some(&PathBuf::from("conf/.env"))),
            PathBuf::from("/work/conf/.env")
        );
        assert_eq!(
            resolve_env_file(cwd, Some(&PathBuf::from("/abs/.env"))),
            PathBuf::from("/abs/.env")
        );
        assert_eq!(resolve_env_file(cwd, None), PathBuf::from("/work/.env"));
    }
}
