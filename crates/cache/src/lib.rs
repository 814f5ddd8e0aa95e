//! Hub cache directory layout.
//!
//! Resolves where an artifact lands inside a Hugging Face style model
//! cache. Pure path arithmetic — callers perform all I/O, so the
//! resolver is deterministic and independently testable.
//!
//! Layout produced:
//!
//! ```text
//! <cache_root>/models--<repo with "/" -> "--">/snapshots/<commit>/<file>
//! <cache_root>/models--<repo with "/" -> "--">/refs/main
//! ```

use std::path::{Path, PathBuf};

/// Prefix for model repository directories.
pub const MODELS_PREFIX: &str = "models--";

/// Directory holding per-commit snapshot directories.
pub const SNAPSHOTS_SEGMENT: &str = "snapshots";

/// Directory holding ref pointer files.
pub const REFS_SEGMENT: &str = "refs";

/// Name of the default branch pointer file.
pub const MAIN_REF: &str = "main";

/// Resolved destination paths for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    /// Per-commit directory holding the artifact files.
    pub snapshot_dir: PathBuf,
    /// Full path of the artifact itself.
    pub artifact_path: PathBuf,
    /// Sibling directory holding ref pointer files.
    pub refs_dir: PathBuf,
    /// Pointer file whose contents are the raw commit hash.
    pub ref_path: PathBuf,
}

/// Returns the cache directory name for a repository.
///
/// The path-unsafe `/` separator in repository names is substituted
/// with `--`, e.g. `facebook/opt-125m` -> `models--facebook--opt-125m`.
pub fn repo_dir_name(repo_name: &str) -> String {
    format!("{MODELS_PREFIX}{}", repo_name.replace('/', "--"))
}

/// Resolves all destination paths for one artifact.
///
/// Never fails for non-empty inputs; callers validate non-emptiness
/// before invocation.
pub fn resolve(
    cache_root: &Path,
    repo_name: &str,
    commit_hash: &str,
    file_name: &str,
) -> CachePaths {
    let repo_dir = cache_root.join(repo_dir_name(repo_name));
    let snapshot_dir = repo_dir.join(SNAPSHOTS_SEGMENT).join(commit_hash);
    let artifact_path = snapshot_dir.join(file_name);
    let refs_dir = repo_dir.join(REFS_SEGMENT);
    let ref_path = refs_dir.join(MAIN_REF);

    CachePaths {
        snapshot_dir,
        artifact_path,
        refs_dir,
        ref_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_dir_name_substitutes_separator() {
        assert_eq!(
            repo_dir_name("facebook/opt-125m"),
            "models--facebook--opt-125m"
        );
    }

    #[test]
    fn repo_dir_name_without_namespace() {
        assert_eq!(repo_dir_name("gpt2"), "models--gpt2");
    }

    #[test]
    fn repo_dir_name_multiple_separators() {
        assert_eq!(repo_dir_name("a/b/c"), "models--a--b--c");
    }

    #[test]
    fn resolve_produces_expected_layout() {
        let paths = resolve(
            Path::new("/cache"),
            "facebook/opt-125m",
            "abc123",
            "model.bin",
        );

        assert_eq!(
            paths.snapshot_dir,
            Path::new("/cache/models--facebook--opt-125m/snapshots/abc123")
        );
        assert_eq!(
            paths.artifact_path,
            Path::new("/cache/models--facebook--opt-125m/snapshots/abc123/model.bin")
        );
        assert_eq!(
            paths.refs_dir,
            Path::new("/cache/models--facebook--opt-125m/refs")
        );
        assert_eq!(
            paths.ref_path,
            Path::new("/cache/models--facebook--opt-125m/refs/main")
        );
    }

    #[test]
    fn resolve_is_deterministic() {
        let a = resolve(Path::new("/c"), "org/repo", "deadbeef", "weights.safetensors");
        let b = resolve(Path::new("/c"), "org/repo", "deadbeef", "weights.safetensors");
        assert_eq!(a, b);
    }

    #[test]
    fn artifact_path_is_under_snapshot_dir() {
        let paths = resolve(Path::new("/c"), "org/repo", "v1", "tokenizer.json");
        assert!(paths.artifact_path.starts_with(&paths.snapshot_dir));
        assert!(paths.ref_path.starts_with(&paths.refs_dir));
    }
}
