//! Task planning: assign every input its output path before any work starts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::CollisionPolicy;
use crate::error::BatchError;
use crate::types::{ConversionTask, InputFile};

/// `<stem>.jpg` for an input path.
pub fn output_name(input: &Path) -> String {
    format!("{}.jpg", stem(input))
}

/// `<stem>_<ext>.jpg`, used to separate inputs that share a stem.
pub fn output_name_with_extension(input: &Path) -> String {
    match input.extension() {
        Some(ext) => format!(
            "{}_{}.jpg",
            stem(input),
            ext.to_string_lossy().to_lowercase()
        ),
        None => output_name(input),
    }
}

fn stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string())
}

/// Pair each input with its output path under `output_dir`.
///
/// Output names are compared case-insensitively, since `A.jpg` and `a.jpg` are
/// the same file on common filesystems. Under [`CollisionPolicy::Fail`] the
/// first shared name aborts planning; under
/// [`CollisionPolicy::KeepExtension`] colliding inputs get
/// [`output_name_with_extension`] and only a second collision aborts.
pub fn plan_tasks(
    files: Vec<InputFile>,
    output_dir: &Path,
    policy: CollisionPolicy,
) -> Result<Vec<ConversionTask>, BatchError> {
    let mut name_counts: HashMap<String, usize> = HashMap::new();
    for file in &files {
        *name_counts
            .entry(output_name(&file.path).to_lowercase())
            .or_default() += 1;
    }

    let mut claimed: HashMap<String, PathBuf> = HashMap::with_capacity(files.len());
    let mut tasks = Vec::with_capacity(files.len());

    for input in files {
        let mut name = output_name(&input.path);
        let shared = name_counts
            .get(&name.to_lowercase())
            .is_some_and(|&count| count > 1);
        if shared && policy == CollisionPolicy::KeepExtension {
            name = output_name_with_extension(&input.path);
        }

        let output_path = output_dir.join(&name);
        if let Some(first) = claimed.insert(name.to_lowercase(), input.path.clone()) {
            return Err(BatchError::OutputCollision {
                first,
                second: input.path,
                output: output_path,
            });
        }
        tasks.push(ConversionTask { input, output_path });
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(names: &[&str]) -> Vec<InputFile> {
        names
            .iter()
            .map(|n| InputFile {
                path: PathBuf::from("/in").join(n),
                size: 1,
            })
            .collect()
    }

    fn output_names(tasks: &[ConversionTask]) -> Vec<String> {
        tasks
            .iter()
            .map(|t| t.output_path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_output_name() {
        assert_eq!(output_name(Path::new("/in/a.HEIC")), "a.jpg");
        assert_eq!(output_name(Path::new("/in/trip.day1.heif")), "trip.day1.jpg");
        assert_eq!(
            output_name_with_extension(Path::new("/in/photo.HIF")),
            "photo_hif.jpg"
        );
    }

    #[test]
    fn test_plan_preserves_order_and_root() {
        let tasks = plan_tasks(
            inputs(&["a.HEIC", "b.heif", "c.hif"]),
            Path::new("/out"),
            CollisionPolicy::Fail,
        )
        .unwrap();
        assert_eq!(output_names(&tasks), vec!["a.jpg", "b.jpg", "c.jpg"]);
        assert!(tasks.iter().all(|t| t.output_path.starts_with("/out")));
        assert_eq!(tasks[1].input.path, PathBuf::from("/in/b.heif"));
    }

    #[test]
    fn test_plan_fails_on_collision() {
        let err = plan_tasks(
            inputs(&["photo.heic", "photo.HIF"]),
            Path::new("/out"),
            CollisionPolicy::Fail,
        )
        .unwrap_err();
        match err {
            BatchError::OutputCollision {
                first,
                second,
                output,
            } => {
                assert_eq!(first, PathBuf::from("/in/photo.heic"));
                assert_eq!(second, PathBuf::from("/in/photo.HIF"));
                assert_eq!(output, PathBuf::from("/out/photo.jpg"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_plan_collision_ignores_case() {
        let result = plan_tasks(
            inputs(&["Photo.heic", "photo.heif"]),
            Path::new("/out"),
            CollisionPolicy::Fail,
        );
        assert!(matches!(result, Err(BatchError::OutputCollision { .. })));
    }

    #[test]
    fn test_plan_keep_extension_renames_colliders_only() {
        let tasks = plan_tasks(
            inputs(&["other.heic", "photo.HIF", "photo.heic"]),
            Path::new("/out"),
            CollisionPolicy::KeepExtension,
        )
        .unwrap();
        assert_eq!(
            output_names(&tasks),
            vec!["other.jpg", "photo_hif.jpg", "photo_heic.jpg"]
        );
    }

    #[test]
    fn test_plan_keep_extension_still_fails_on_same_extension() {
        let result = plan_tasks(
            inputs(&["photo.heic", "photo.HEIC"]),
            Path::new("/out"),
            CollisionPolicy::KeepExtension,
        );
        assert!(matches!(result, Err(BatchError::OutputCollision { .. })));
    }

    #[test]
    fn test_plan_empty() {
        let tasks = plan_tasks(Vec::new(), Path::new("/out"), CollisionPolicy::Fail).unwrap();
        assert!(tasks.is_empty());
    }
}
