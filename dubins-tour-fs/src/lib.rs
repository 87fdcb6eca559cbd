//! Scratch files for oracles that exchange data through the filesystem.
//!
//! File-based solvers want a problem file, a parameter file and an output
//! file per call. [`ScratchFiles`] hands out unique names in one directory and
//! removes whatever it handed out when released, so concurrent trials never
//! collide and no files outlive the trial.
#![forbid(unsafe_code)]

use std::io;
use std::path::Component;
use std::sync::atomic::{AtomicU64, Ordering};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use dubins_tour_core::{ResourceCleanupError, ScratchResource};

static NEXT_FILE: AtomicU64 = AtomicU64::new(0);

/// A set of uniquely named files in one directory.
///
/// Names follow `<stem>-<pid>-<counter>.<extension>`, with a counter shared by
/// the whole process.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use dubins_tour_core::ScratchResource;
/// use dubins_tour_fs::ScratchFiles;
///
/// # fn main() -> std::io::Result<()> {
/// let mut scratch = ScratchFiles::create(Utf8Path::new("/tmp/dubins"), "trial")?;
/// let problem = scratch.write("atsp", b"NAME: demo\n")?;
/// assert!(problem.as_str().ends_with(".atsp"));
/// assert!(scratch.release().is_ok());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ScratchFiles {
    dir: fs_utf8::Dir,
    root: Utf8PathBuf,
    stem: String,
    files: Vec<String>,
}

impl ScratchFiles {
    /// Open `root`, creating it if needed, for files named after `stem`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from creating or opening the directory.
    pub fn create(root: &Utf8Path, stem: &str) -> io::Result<Self> {
        let (base, relative) = base_dir_and_relative(root)?;
        let dir = if relative.as_os_str().is_empty() {
            base
        } else {
            base.create_dir_all(&relative)?;
            base.open_dir(&relative)?
        };
        Ok(Self {
            dir,
            root: root.to_path_buf(),
            stem: stem.to_owned(),
            files: Vec::new(),
        })
    }

    /// Reserve a fresh file name with `extension` and return its full path.
    ///
    /// The file itself is not created.
    pub fn allocate(&mut self, extension: &str) -> Utf8PathBuf {
        let counter = NEXT_FILE.fetch_add(1, Ordering::Relaxed);
        let name = format!(
            "{}-{}-{counter}.{extension}",
            self.stem,
            std::process::id()
        );
        let path = self.root.join(&name);
        self.files.push(name);
        path
    }

    /// Allocate a file with `extension` and write `contents` to it.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from writing the file.
    pub fn write(&mut self, extension: &str, contents: &[u8]) -> io::Result<Utf8PathBuf> {
        let path = self.allocate(extension);
        let name = path
            .file_name()
            .ok_or_else(|| io::Error::other("scratch path should include a file name"))?;
        self.dir.write(name, contents)?;
        Ok(path)
    }

    /// Read a scratch file back as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error when `path` was not allocated here or cannot be read.
    pub fn read_to_string(&self, path: &Utf8Path) -> io::Result<String> {
        let name = self.owned_name(path)?;
        self.dir.read_to_string(name)
    }

    /// Full path of a file allocated here, looked up by file name.
    #[must_use]
    pub fn path(&self, name: &str) -> Option<Utf8PathBuf> {
        self.files
            .iter()
            .any(|file| file == name)
            .then(|| self.root.join(name))
    }

    /// Directory holding the files.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Names allocated so far, in allocation order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.files
    }

    fn owned_name<'a>(&self, path: &'a Utf8Path) -> io::Result<&'a str> {
        path.file_name()
            .filter(|name| self.files.iter().any(|file| file == name))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{path} is not a scratch file of {}", self.root),
                )
            })
    }

    fn remove_all(&mut self) -> Vec<ResourceCleanupError> {
        std::mem::take(&mut self.files)
            .into_iter()
            .filter_map(|name| match self.dir.remove_file(&name) {
                Ok(()) => None,
                Err(err) if err.kind() == io::ErrorKind::NotFound => None,
                Err(err) => Some(ResourceCleanupError::new(
                    self.root.join(&name).as_str(),
                    err.to_string(),
                )),
            })
            .collect()
    }
}

impl ScratchResource for ScratchFiles {
    fn release(mut self) -> Result<(), Vec<ResourceCleanupError>> {
        let failures = self.remove_all();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for failure in self.remove_all() {
            log::warn!("scratch file left behind: {failure}");
        }
    }
}

/// Split a directory path into an ambient base directory and a relative
/// suffix that cap-std can walk.
fn base_dir_and_relative(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_path = path.as_std_path();
    let (base, relative) = match std_path.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_path
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_path.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_path
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_path.to_path_buf()),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative =
        Utf8PathBuf::from_path_buf(relative).map_err(|_| io::Error::other("non-UTF-8 path"))?;
    Ok((dir, relative))
}
