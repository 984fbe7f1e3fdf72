// ─── Native Library Extraction ───
// Unpacks platform binaries from native archives into a per-launch
// temporary directory that is removed when the launch ends.

use std::fs::File;
use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};

/// Folder under the OS temp root that holds every launch's natives.
pub const NATIVES_FOLDER: &str = "ModLaunchNatives";

/// Entries whose path contains any of these are never extracted.
pub const DEFAULT_EXCLUDES: [&str; 3] = ["META-INF/", ".git", ".sha1"];

/// Randomly named natives directory owned by exactly one launch.
///
/// Removed by [`NativesDir::remove`], or on drop if the launch is abandoned
/// on an error path.
#[derive(Debug)]
pub struct NativesDir {
    path: PathBuf,
    removed: bool,
}

impl NativesDir {
    pub fn allocate(temp_root: &Path) -> LauncherResult<Self> {
        let path = temp_root
            .join(NATIVES_FOLDER)
            .join(Uuid::new_v4().simple().to_string());
        std::fs::create_dir_all(&path).map_err(|e| LauncherError::io(&path, e))?;
        debug!("Allocated natives directory {:?}", path);
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn remove(mut self) -> LauncherResult<()> {
        self.removed = true;
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {
                debug!("Removed natives directory {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LauncherError::io(&self.path, e)),
        }
    }
}

impl Drop for NativesDir {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed natives directory {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Cannot remove natives directory {:?}: {}", self.path, e),
        }
    }
}

/// One native archive to unpack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeJob {
    /// Library name, for logging.
    pub library: String,
    pub archive: PathBuf,
    /// Exclusions declared by the library itself.
    pub excludes: Vec<String>,
}

impl NativeJob {
    fn is_excluded(&self, entry_name: &str) -> bool {
        DEFAULT_EXCLUDES
            .iter()
            .copied()
            .chain(self.excludes.iter().map(String::as_str))
            .any(|exclusion| entry_name.contains(exclusion))
    }
}

/// Unpacks every job into `dest`, in parallel. Returns the number of files
/// written.
///
/// A missing or unreadable archive only skips that library, unless `strict`
/// is set, in which case the first failure is returned.
pub async fn extract_natives(jobs: Vec<NativeJob>, dest: &Path, strict: bool) -> LauncherResult<usize> {
    let tasks = jobs.into_iter().map(|job| {
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let outcome = extract_archive(&job, &dest);
            (job, outcome)
        })
    });

    let mut written = 0;
    for joined in join_all(tasks).await {
        let (job, outcome) =
            joined.map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))?;
        match outcome {
            Ok(count) => {
                debug!("Extracted {} native file(s) from {}", count, job.library);
                written += count;
            }
            Err(reason) if strict => {
                return Err(LauncherError::NativeExtraction {
                    library: job.library,
                    reason,
                });
            }
            Err(reason) => {
                warn!("Skipping natives for {}: {}", job.library, reason);
            }
        }
    }

    info!("Extracted {} native file(s) into {:?}", written, dest);
    Ok(written)
}

/// Writes each non-excluded file entry of the archive into `dest` under its
/// base name; directory structure is flattened.
fn extract_archive(job: &NativeJob, dest: &Path) -> Result<usize, String> {
    if !job.archive.exists() {
        return Err(format!("native archive missing at {:?}", job.archive));
    }

    let file = File::open(&job.archive).map_err(|e| format!("cannot open {:?}: {}", job.archive, e))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| format!("cannot read {:?}: {}", job.archive, e))?;

    let mut written = 0;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| format!("corrupt entry #{} in {:?}: {}", index, job.archive, e))?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        if job.is_excluded(&name) {
            continue;
        }

        let Some(base_name) = Path::new(&name).file_name() else {
            continue;
        };
        let target = dest.join(base_name);
        let mut out =
            File::create(&target).map_err(|e| format!("cannot create {:?}: {}", target, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| format!("cannot write {:?}: {}", target, e))?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("natives-test-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_zip(path: &Path, entries: &[(&str, Option<&[u8]>)]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in entries {
            match contents {
                Some(bytes) => {
                    writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                    writer.write_all(bytes).unwrap();
                }
                None => writer.add_directory(*name, SimpleFileOptions::default()).unwrap(),
            }
        }
        writer.finish().unwrap();
    }

    #[tokio::test]
    async fn extraction_flattens_and_honors_exclusions() {
        let temp = scratch("flatten");
        let archive = temp.join("lwjgl-natives.jar");
        write_zip(
            &archive,
            &[
                ("META-INF/MANIFEST.MF", Some(b"manifest")),
                ("linux/", None),
                ("linux/x64/liblwjgl.so", Some(b"so")),
                ("libopenal.so", Some(b"al")),
                ("libopenal.so.sha1", Some(b"hash")),
                ("extras/readme.txt", Some(b"skip me")),
            ],
        );
        let dest = temp.join("out");
        std::fs::create_dir_all(&dest).unwrap();

        let job = NativeJob {
            library: "org.lwjgl:lwjgl:3.3.1:natives-linux".into(),
            archive,
            excludes: vec!["extras/".into()],
        };
        let written = extract_natives(vec![job], &dest, false).await.unwrap();

        assert_eq!(written, 2);
        assert!(dest.join("liblwjgl.so").exists());
        assert!(dest.join("libopenal.so").exists());
        assert!(!dest.join("MANIFEST.MF").exists());
        assert!(!dest.join("libopenal.so.sha1").exists());
        assert!(!dest.join("readme.txt").exists());
        assert!(!dest.join("linux").exists());

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn missing_archive_is_skipped_unless_strict() {
        let temp = scratch("missing");
        let good = temp.join("good.jar");
        write_zip(&good, &[("libgood.so", Some(b"ok"))]);

        let jobs = vec![
            NativeJob {
                library: "missing:natives:1".into(),
                archive: temp.join("nope.jar"),
                excludes: vec![],
            },
            NativeJob {
                library: "good:natives:1".into(),
                archive: good,
                excludes: vec![],
            },
        ];

        let written = extract_natives(jobs.clone(), &temp, false).await.unwrap();
        assert_eq!(written, 1);
        assert!(temp.join("libgood.so").exists());

        let err = extract_natives(jobs, &temp, true).await.unwrap_err();
        assert!(matches!(err, LauncherError::NativeExtraction { ref library, .. } if library == "missing:natives:1"));

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn corrupt_archive_is_skipped() {
        let temp = scratch("corrupt");
        let broken = temp.join("broken.jar");
        std::fs::write(&broken, b"definitely not a zip").unwrap();

        let job = NativeJob {
            library: "broken:natives:1".into(),
            archive: broken,
            excludes: vec![],
        };
        assert_eq!(extract_natives(vec![job], &temp, false).await.unwrap(), 0);

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn natives_dir_is_unique_and_removed() {
        let temp = scratch("alloc");
        let first = NativesDir::allocate(&temp).unwrap();
        let second = NativesDir::allocate(&temp).unwrap();
        assert_ne!(first.path(), second.path());
        assert!(first.path().starts_with(temp.join(NATIVES_FOLDER)));

        let first_path = first.path().to_path_buf();
        std::fs::write(first_path.join("lib.so"), b"x").unwrap();
        first.remove().await.unwrap();
        assert!(!first_path.exists());

        let second_path = second.path().to_path_buf();
        drop(second);
        assert!(!second_path.exists());

        let _ = std::fs::remove_dir_all(&temp);
    }
}
