//! Repository metadata: the repository name and the modules it ships.
//!
//! `repo.conf` is read when present:
//!
//! ```ini
//! [repository]
//! name = fun
//! modules = dhash fun macro
//! ```
//!
//! Older repositories declare the same facts in their `__init__.py` through
//! `__name__ = "fun"` and `__all__ = ("dhash", "fun", "macro")`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{RepositoryError, RepositoryResult};

pub const REPO_CONF: &str = "repo.conf";
pub const INIT_FILE: &str = "__init__.py";
pub const MODULE_FILE: &str = "module.py";

static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z_][0-9a-z_]+$").unwrap());

static LEGACY_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^__name__\s*=\s*(?:"""|"|')([a-z_][0-9a-z_]+)(?:"""|"|')$"#).unwrap()
});

static LEGACY_ALL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^__all__\s*=\s*\(([a-z0-9_,\s"'()|]+)\)$"#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub name: String,
    pub module_names: Vec<String>,
}

/// Read and validate the metadata of the repository at `path`.
pub fn read(path: &Path) -> RepositoryResult<Metadata> {
    let conf = path.join(REPO_CONF);
    let metadata = if conf.is_file() {
        let text = std::fs::read_to_string(&conf).map_err(|e| RepositoryError::io(&conf, e))?;
        parse_repo_conf(&text)?
    } else {
        let init = path.join(INIT_FILE);
        if !init.is_file() {
            return Err(RepositoryError::metadata(format!(
                "Repository at '{}' has neither '{REPO_CONF}' nor '{INIT_FILE}'.",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(&init).map_err(|e| RepositoryError::io(&init, e))?;
        parse_legacy_init(path, &text)?
    };

    check_modules(path, &metadata.module_names)?;
    Ok(metadata)
}

/// Parse the `[repository]` section of a `repo.conf`.
///
/// Values are taken verbatim (quotes included); `modules` may be continued
/// over indented lines.
pub fn parse_repo_conf(text: &str) -> RepositoryResult<Metadata> {
    let sections = parse_ini(text)
        .map_err(|e| RepositoryError::metadata(format!("'{REPO_CONF}' could not be parsed: {e}")))?;
    let section = sections.get("repository");

    let value = |key: &str| {
        section
            .and_then(|options| options.get(key))
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| RepositoryError::metadata(format!("'{REPO_CONF}' does not have '{key}' key.")))
    };

    let name = value("name")?.trim().to_string();
    let module_names = value("modules")?
        .split_whitespace()
        .map(str::to_string)
        .collect();

    Ok(Metadata { name, module_names })
}

type IniSections = HashMap<String, HashMap<String, String>>;

/// INI reader following Python's `configparser` defaults: `=` or `:`
/// delimiters, case-insensitive option names, full-line `#`/`;` comments and
/// values continued on lines indented deeper than their option.
fn parse_ini(text: &str) -> Result<IniSections, String> {
    let mut sections = IniSections::new();
    let mut section: Option<String> = None;
    // Option being read, its indentation and its lines so far.
    let mut current: Option<(String, usize, Vec<String>)> = None;

    fn finish(sections: &mut IniSections, section: &Option<String>, current: Option<(String, usize, Vec<String>)>) {
        if let (Some(section), Some((key, _, lines))) = (section, current) {
            let value = lines.join("\n").trim_end().to_string();
            sections.entry(section.clone()).or_default().insert(key, value);
        }
    }

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let indent = raw.len() - raw.trim_start().len();

        if line.is_empty() {
            if let Some((_, _, lines)) = current.as_mut() {
                lines.push(String::new());
            }
            continue;
        }
        if let Some((_, option_indent, lines)) = current.as_mut() {
            if indent > *option_indent {
                lines.push(line.to_string());
                continue;
            }
        }
        finish(&mut sections, &section, current.take());

        if let Some(header) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            if sections.contains_key(header) {
                return Err(format!("line {}: section '{header}' already exists", index + 1));
            }
            sections.insert(header.to_string(), HashMap::new());
            section = Some(header.to_string());
            continue;
        }

        let Some(section_name) = section.as_ref() else {
            return Err(format!("line {}: missing section header", index + 1));
        };
        let Some(split) = line.find(['=', ':']) else {
            return Err(format!("line {}: expected 'key = value'", index + 1));
        };
        let key = line[..split].trim().to_lowercase();
        if key.is_empty() {
            return Err(format!("line {}: missing option name", index + 1));
        }
        if sections.get(section_name).is_some_and(|options| options.contains_key(&key)) {
            return Err(format!("line {}: option '{key}' already exists", index + 1));
        }
        let value = line[split + 1..].trim().to_string();
        current = Some((key, indent, vec![value]));
    }
    finish(&mut sections, &section, current);

    Ok(sections)
}

/// Extract `__name__` and `__all__` from a legacy `__init__.py`.
///
/// Only the syntax is checked here; module directories are checked by
/// [`read`].
pub fn parse_legacy_init(path: &Path, text: &str) -> RepositoryResult<Metadata> {
    let mut name = None;
    let mut module_names = None;

    for line in text.lines().map(str::trim) {
        if !line.contains('=') {
            continue;
        }

        if line.starts_with("__name__") {
            let captures = LEGACY_NAME_REGEX.captures(line).ok_or_else(|| {
                RepositoryError::metadata(format!("Repository at '{}' has invalid name.", path.display()))
            })?;
            name = Some(captures[1].to_string());
        }

        if line.starts_with("__all__") {
            let captures = LEGACY_ALL_REGEX.captures(line).ok_or_else(|| {
                RepositoryError::metadata(format!(
                    "Repository at '{}' has invalid specification of included modules.",
                    path.display()
                ))
            })?;
            let names: Vec<String> = captures[1]
                .split(',')
                .map(|entry| entry.trim_matches(|c| c == ' ' || c == '"' || c == '\'').to_string())
                .filter(|entry| !entry.is_empty())
                .collect();
            module_names = Some(names);
        }
    }

    let name = name.ok_or_else(|| {
        RepositoryError::metadata(format!(
            "Specification of a repository at '{}' is missing a name.",
            path.display()
        ))
    })?;
    let module_names = module_names.ok_or_else(|| {
        RepositoryError::metadata(format!(
            "Specification of a repository at '{}' is missing a list of modules.",
            path.display()
        ))
    })?;

    Ok(Metadata { name, module_names })
}

fn check_modules(path: &Path, module_names: &[String]) -> RepositoryResult<()> {
    for module in module_names {
        if !NAME_REGEX.is_match(module) {
            return Err(RepositoryError::metadata(format!(
                "Repository at '{}' specification contains invalid name for included module '{module}'.",
                path.display()
            )));
        }
        let dir = path.join(module);
        if !dir.join(INIT_FILE).is_file() {
            return Err(RepositoryError::metadata(format!(
                "Module '{module}' is missing its init file."
            )));
        }
        if !dir.join(MODULE_FILE).is_file() {
            return Err(RepositoryError::metadata(format!(
                "Module '{module}' is missing its module file."
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn module(root: &Path, name: &str) {
        fs::create_dir_all(root.join(name)).unwrap();
        fs::write(root.join(name).join(INIT_FILE), "").unwrap();
        fs::write(root.join(name).join(MODULE_FILE), "").unwrap();
    }

    #[test]
    fn test_repo_conf() {
        let meta = parse_repo_conf("[repository]\nname = fun\nmodules = dhash fun macro\n").unwrap();
        assert_eq!(meta.name, "fun");
        assert_eq!(meta.module_names, vec!["dhash", "fun", "macro"]);
    }

    #[test]
    fn test_repo_conf_missing_keys() {
        let err = parse_repo_conf("[repository]\nmodules = a\n").unwrap_err();
        assert_eq!(err.to_string(), "'repo.conf' does not have 'name' key.");

        let err = parse_repo_conf("[repository]\nname = fun\nmodules =\n").unwrap_err();
        assert_eq!(err.to_string(), "'repo.conf' does not have 'modules' key.");

        assert!(parse_repo_conf("[other]\nname = fun\n").unwrap_err().is_metadata());
    }

    #[test]
    fn test_repo_conf_multiline_modules() {
        let text = "[repository]\nname = fun\nmodules =\n    dhash\n    fun\n\n    macro\n";
        let meta = parse_repo_conf(text).unwrap();
        assert_eq!(meta.name, "fun");
        assert_eq!(meta.module_names, vec!["dhash", "fun", "macro"]);
    }

    #[test]
    fn test_repo_conf_values_are_verbatim() {
        let text = "# pie repository\n[repository]\n; display name\nName: \"fun\"\nmodules = a=b c:d\n";
        let meta = parse_repo_conf(text).unwrap();
        assert_eq!(meta.name, "\"fun\"");
        assert_eq!(meta.module_names, vec!["a=b", "c:d"]);
    }

    #[test]
    fn test_repo_conf_syntax_errors() {
        let err = parse_repo_conf("name = fun\n[repository]\n").unwrap_err();
        assert_eq!(err.to_string(), "'repo.conf' could not be parsed: line 1: missing section header");

        let err = parse_repo_conf("[repository]\nname\n").unwrap_err();
        assert!(err.to_string().ends_with("line 2: expected 'key = value'"));

        let err = parse_repo_conf("[repository]\nname = a\nNAME = b\n").unwrap_err();
        assert!(err.to_string().ends_with("option 'name' already exists"));
    }

    #[test]
    fn test_legacy_module_list_with_brackets_fails_on_name() {
        let path = Path::new("modules/x");
        let meta = parse_legacy_init(path, "__name__ = 'fun'\n__all__ = (\"a|b\", (\"c\"))").unwrap();
        assert_eq!(meta.module_names, vec!["a|b", "(\"c\")"]);

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INIT_FILE), "__name__ = 'fun'\n__all__ = (\"a|b\",)").unwrap();
        let err = read(dir.path()).unwrap_err();
        assert!(err.to_string().contains("invalid name for included module 'a|b'"));
    }

    #[test]
    fn test_legacy_init() {
        let text = r#"
import os

__name__ = "base"
__all__ = ("acl", 'admin', """base""",)
"#;
        let meta = parse_legacy_init(Path::new("modules/base"), text).unwrap();
        assert_eq!(meta.name, "base");
        assert_eq!(meta.module_names, vec!["acl", "admin", "base"]);
    }

    #[test]
    fn test_legacy_init_rejects_bad_lines() {
        let path = Path::new("modules/x");

        let err = parse_legacy_init(path, "__name__ = base\n__all__ = (\"a1\",)").unwrap_err();
        assert_eq!(err.to_string(), "Repository at 'modules/x' has invalid name.");

        let err = parse_legacy_init(path, "__name__ = \"Base\"").unwrap_err();
        assert!(err.to_string().ends_with("has invalid name."));

        let err = parse_legacy_init(path, "__name__ = \"base\"\n__all__ = [\"acl\"]").unwrap_err();
        assert!(err.to_string().contains("invalid specification of included modules"));
    }

    #[test]
    fn test_legacy_init_requires_both_facts() {
        let path = Path::new("modules/x");
        let err = parse_legacy_init(path, "__all__ = (\"acl\",)").unwrap_err();
        assert!(err.to_string().ends_with("is missing a name."));

        let err = parse_legacy_init(path, "__name__ = 'base'").unwrap_err();
        assert!(err.to_string().ends_with("is missing a list of modules."));
    }

    #[test]
    fn test_read_checks_module_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(REPO_CONF), "[repository]\nname = fun\nmodules = fun macro\n").unwrap();
        module(dir.path(), "fun");
        fs::create_dir(dir.path().join("macro")).unwrap();
        fs::write(dir.path().join("macro").join(INIT_FILE), "").unwrap();

        let err = read(dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "Module 'macro' is missing its module file.");

        fs::write(dir.path().join("macro").join(MODULE_FILE), "").unwrap();
        let meta = read(dir.path()).unwrap();
        assert_eq!(meta.module_names, vec!["fun", "macro"]);
    }

    #[test]
    fn test_read_rejects_invalid_module_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(REPO_CONF), "[repository]\nname = fun\nmodules = Fun\n").unwrap();

        let err = read(dir.path()).unwrap_err();
        assert!(err.to_string().contains("invalid name for included module 'Fun'"));
    }

    #[test]
    fn test_read_prefers_repo_conf() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INIT_FILE), "__name__ = 'legacy'\n__all__ = ('one',)").unwrap();
        fs::write(dir.path().join(REPO_CONF), "[repository]\nname = modern\nmodules = two\n").unwrap();
        module(dir.path(), "two");

        assert_eq!(read(dir.path()).unwrap().name, "modern");
    }

    #[test]
    fn test_read_legacy_missing_init_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INIT_FILE), "__name__ = 'legacy'\n__all__ = ('one',)").unwrap();
        fs::create_dir(dir.path().join("one")).unwrap();

        let err = read(dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "Module 'one' is missing its init file.");
    }
}
