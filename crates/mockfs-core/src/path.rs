//! Path syntax: separators, drive prefixes and components

use crate::error::{FsError, FsResult};

/// One step of a parsed path
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Component {
    Normal(String),
    CurDir,
    ParentDir,
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Drop a leading `C:` style drive prefix.
pub(crate) fn strip_drive(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        &path[2..]
    } else {
        path
    }
}

pub(crate) fn is_absolute(path: &str) -> bool {
    path.starts_with(is_separator)
}

/// Split on either separator. Empty components are dropped.
pub(crate) fn split(path: &str) -> Vec<Component> {
    path.split(is_separator)
        .filter(|part| !part.is_empty())
        .map(|part| match part {
            "." => Component::CurDir,
            ".." => Component::ParentDir,
            name => Component::Normal(name.to_string()),
        })
        .collect()
}

/// Components of an absolute path.
pub(crate) fn absolute_components(path: &str, strip_drive_prefix: bool) -> FsResult<Vec<Component>> {
    let stripped = if strip_drive_prefix { strip_drive(path) } else { path };
    if !is_absolute(stripped) {
        return Err(FsError::NotAbsolute {
            path: path.to_string(),
        });
    }
    Ok(split(stripped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal(name: &str) -> Component {
        Component::Normal(name.to_string())
    }

    #[test]
    fn test_mixed_separators() {
        let parts = absolute_components("/a\\b/c", true).unwrap();
        assert_eq!(parts, vec![normal("a"), normal("b"), normal("c")]);
    }

    #[test]
    fn test_drive_prefix() {
        let parts = absolute_components("C:\\Users\\me", true).unwrap();
        assert_eq!(parts, vec![normal("Users"), normal("me")]);

        assert!(matches!(
            absolute_components("C:\\Users", false),
            Err(FsError::NotAbsolute { .. })
        ));
        assert!(matches!(
            absolute_components("C:Users", true),
            Err(FsError::NotAbsolute { .. })
        ));
    }

    #[test]
    fn test_relative_rejected() {
        let err = absolute_components("tmp/file", true).unwrap_err();
        assert_eq!(err.to_string(), "path must be absolute: tmp/file");
    }

    #[test]
    fn test_root_and_dots() {
        assert!(absolute_components("/", true).unwrap().is_empty());
        assert_eq!(
            split("//a/./../b/"),
            vec![normal("a"), Component::CurDir, Component::ParentDir, normal("b")]
        );
    }
}
