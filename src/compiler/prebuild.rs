//! Checks on the edited files that run before anything is parsed.

use std::path::{Component, Path};

use super::error::{ErrorKind, LiveEditUpdateException};

const BUILD_SRC: &str = "buildSrc";

/// Reject edits to files live edit cannot handle.
///
/// | File                           | Error                          |
/// |--------------------------------|--------------------------------|
/// | anything under `buildSrc/`     | `UNSUPPORTED_BUILD_SRC_CHANGE` |
/// | `*.gradle`, `*.gradle.kts`     | `GRADLE_BUILD_FILE`            |
/// | anything but `*.kt`            | `NON_KOTLIN`                   |
pub fn prebuild_check(unit: &str) -> Result<(), LiveEditUpdateException> {
    let path = Path::new(unit);

    let in_build_src = path
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name == BUILD_SRC));
    if in_build_src {
        return Err(LiveEditUpdateException::new(
            ErrorKind::UnsupportedBuildSrcChange,
            "changes to buildSrc require a rebuild",
        )
        .in_unit(unit));
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if file_name.ends_with(".gradle") || file_name.ends_with(".gradle.kts") {
        return Err(LiveEditUpdateException::new(
            ErrorKind::GradleBuildFile,
            "build files require a project sync",
        )
        .in_unit(unit));
    }

    if path.extension().and_then(|e| e.to_str()) != Some("kt") {
        return Err(LiveEditUpdateException::new(
            ErrorKind::NonKotlin,
            "only Kotlin sources can be live edited",
        )
        .in_unit(unit));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(unit: &str) -> Option<ErrorKind> {
        prebuild_check(unit).err().map(|e| e.error)
    }

    #[test]
    fn test_kotlin_sources_pass() {
        assert_eq!(kind("app/src/main/java/com/example/Main.kt"), None);
        assert_eq!(kind("Main.kt"), None);
    }

    #[test]
    fn test_build_files() {
        assert_eq!(kind("app/build.gradle"), Some(ErrorKind::GradleBuildFile));
        assert_eq!(kind("settings.gradle.kts"), Some(ErrorKind::GradleBuildFile));
        assert_eq!(
            kind("buildSrc/src/main/kotlin/Deps.kt"),
            Some(ErrorKind::UnsupportedBuildSrcChange)
        );
        assert_eq!(
            kind("buildSrc/build.gradle.kts"),
            Some(ErrorKind::UnsupportedBuildSrcChange)
        );
    }

    #[test]
    fn test_non_kotlin() {
        assert_eq!(kind("src/Main.java"), Some(ErrorKind::NonKotlin));
        assert_eq!(kind("res/layout/main.xml"), Some(ErrorKind::NonKotlin));
        assert_eq!(kind("scripts/tool.kts"), Some(ErrorKind::NonKotlin));
        // Directory merely named like buildSrc
        assert_eq!(kind("mybuildSrc/Main.kt"), None);
    }

    #[test]
    fn test_error_names_unit() {
        let e = prebuild_check("src/Main.java").unwrap_err();
        assert_eq!(e.source_unit.as_deref(), Some("src/Main.java"));
    }
}
