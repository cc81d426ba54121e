//! Transform executor: runs a single job.
//!
//! Image jobs decode the source into a private RGBA buffer, apply the pixel
//! transform in place and hand the result to the backend. Non-image jobs
//! follow the run's [`OtherFilePolicy`]. Nothing here is shared between
//! jobs, so any number of workers can call [`JobRunner::run_job`] at once.
//!
//! Every error comes back as a [`JobError`]; deciding whether it fails the
//! job or the run is the dispatcher's business.

use crate::config::OtherFilePolicy;
use crate::imaging::{ImageBackend, SourceError, WriteError, apply_in_place};
use crate::job::{JobDescriptor, JobError, SourceKind};
use crate::template;
use encoding_rs::Encoding;
use std::fs;
use std::path::Path;

/// Something that can run one job to completion.
pub trait JobRunner: Sync {
    fn run_job(&self, job: &JobDescriptor) -> Result<(), JobError>;
}

/// The production job runner.
pub struct FilterExecutor<B: ImageBackend> {
    backend: B,
    other_files: OtherFilePolicy,
    encoding: &'static Encoding,
}

impl<B: ImageBackend> FilterExecutor<B> {
    pub fn new(backend: B, other_files: OtherFilePolicy, encoding: &'static Encoding) -> Self {
        Self {
            backend,
            other_files,
            encoding,
        }
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn run_image(&self, job: &JobDescriptor) -> Result<(), JobError> {
        let mut image = self.backend.decode(&job.source)?;
        apply_in_place(&mut image, job.transform);
        if let Some(destination) = &job.destination {
            ensure_parent(destination)?;
            self.backend.encode(&image, destination)?;
        }
        Ok(())
    }

    fn run_other(&self, job: &JobDescriptor) -> Result<(), JobError> {
        let bytes = match self.other_files {
            OtherFilePolicy::Skip => return Err(JobError::Skipped(job.source.clone())),
            OtherFilePolicy::Copy => read_source(&job.source)?,
            OtherFilePolicy::Template => {
                let raw = read_source(&job.source)?;
                template::render(&raw, &job.label.filter, self.encoding).map_err(|_| {
                    JobError::TemplateDecode {
                        path: job.source.clone(),
                        encoding: self.encoding.name().to_string(),
                    }
                })?
            }
        };
        if let Some(destination) = &job.destination {
            ensure_parent(destination)?;
            fs::write(destination, bytes).map_err(|source| WriteError {
                path: destination.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

impl<B: ImageBackend> JobRunner for FilterExecutor<B> {
    fn run_job(&self, job: &JobDescriptor) -> Result<(), JobError> {
        match job.kind {
            SourceKind::Image => self.run_image(job),
            SourceKind::Other => self.run_other(job),
        }
    }
}

fn read_source(path: &Path) -> Result<Vec<u8>, SourceError> {
    fs::read(path).map_err(|e| SourceError::from_io(path, e))
}

/// Create the destination's parent directory if it is missing.
///
/// Several workers may race to create the same directory; `create_dir_all`
/// treats an existing directory as success.
fn ensure_parent(destination: &Path) -> Result<(), WriteError> {
    match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| WriteError {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Filter;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::MockBackend;
    use crate::job::JobLabel;
    use crate::test_helpers::{image_job, other_job, write_png};
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn executor<B: ImageBackend>(backend: B, policy: OtherFilePolicy) -> FilterExecutor<B> {
        FilterExecutor::new(backend, policy, encoding_rs::UTF_8)
    }

    // =========================================================================
    // Image jobs
    // =========================================================================

    #[test]
    fn image_job_writes_filtered_png() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("in.png");
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([200, 10, 10, 255]));
        img.put_pixel(1, 0, Rgba([10, 10, 200, 255]));
        write_png(&source, &img);

        let dest = tmp.path().join("out/nested/white_black.png");
        let job = image_job(&source, Filter::WhiteBlack, Some(dest.clone()));
        executor(RustBackend::new(), OtherFilePolicy::Copy)
            .run_job(&job)
            .unwrap();

        let written = image::open(&dest).unwrap().into_rgba8();
        assert_eq!(written.get_pixel(0, 0), &Rgba([73, 73, 73, 255]));
        assert_eq!(written.get_pixel(1, 0), &Rgba([73, 73, 73, 255]));
    }

    #[test]
    fn original_job_output_matches_input() {
        let img = RgbaImage::from_fn(6, 4, |x, y| Rgba([x as u8, y as u8, 3, 128]));
        let backend = MockBackend::new().with_image("/src/a.png", img.clone());
        let exec = executor(backend, OtherFilePolicy::Copy);

        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("a/original.png");
        let job = image_job(Path::new("/src/a.png"), Filter::Original, Some(dest.clone()));
        exec.run_job(&job).unwrap();

        assert_eq!(exec.backend().written(&dest), Some(img));
    }

    #[test]
    fn decode_failure_is_recoverable() {
        let backend = MockBackend::new()
            .with_image("/src/a.png", RgbaImage::new(1, 1))
            .with_corrupt("/src/a.png");
        let job = image_job(Path::new("/src/a.png"), Filter::OnlyRed, None);

        let err = executor(backend, OtherFilePolicy::Copy)
            .run_job(&job)
            .unwrap_err();
        assert!(matches!(err, JobError::Source(SourceError::Corrupt { .. })));
        assert!(!err.is_fatal());
    }

    #[test]
    fn write_failure_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("x.png");
        let backend = MockBackend::new()
            .with_image("/src/a.png", RgbaImage::new(1, 1))
            .with_unwritable(dest.clone());
        let job = image_job(Path::new("/src/a.png"), Filter::OnlyRed, Some(dest));

        let err = executor(backend, OtherFilePolicy::Copy)
            .run_job(&job)
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn no_destination_means_nothing_written() {
        let backend = MockBackend::new().with_image("/src/a.png", RgbaImage::new(2, 2));
        let exec = executor(backend, OtherFilePolicy::Copy);
        exec.run_job(&image_job(Path::new("/src/a.png"), Filter::OnlyRed, None))
            .unwrap();
        assert!(exec.backend().written.lock().unwrap().is_empty());
    }

    // =========================================================================
    // Non-image jobs
    // =========================================================================

    #[test]
    fn copy_policy_copies_bytes_verbatim() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("notes.bin");
        let bytes = vec![0u8, 159, 146, 150, 255, 10];
        fs::write(&source, &bytes).unwrap();
        let dest = tmp.path().join("out/only_red.bin");

        executor(RustBackend::new(), OtherFilePolicy::Copy)
            .run_job(&other_job(&source, "ONLY_RED", Some(dest.clone())))
            .unwrap();

        assert_eq!(fs::read(&dest).unwrap(), bytes);
    }

    #[test]
    fn skip_policy_fails_without_writing() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("notes.txt");
        fs::write(&source, "hello").unwrap();
        let dest = tmp.path().join("out/original.txt");

        let err = executor(RustBackend::new(), OtherFilePolicy::Skip)
            .run_job(&other_job(&source, "ORIGINAL", Some(dest.clone())))
            .unwrap_err();

        assert!(matches!(err, JobError::Skipped(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn template_policy_substitutes_filter_name() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("readme.md");
        fs::write(&source, "# {{FILTER}}\nFiltered with {{filter name}}.").unwrap();
        let dest = tmp.path().join("out/in_three_steps.md");

        executor(RustBackend::new(), OtherFilePolicy::Template)
            .run_job(&other_job(&source, "IN_THREE_STEPS", Some(dest.clone())))
            .unwrap();

        assert_eq!(
            fs::read_to_string(&dest).unwrap(),
            "# IN_THREE_STEPS\nFiltered with in three steps."
        );
    }

    #[test]
    fn template_with_wrong_encoding_is_recoverable() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("latin1.txt");
        fs::write(&source, [0x43, 0x61, 0x66, 0xE9]).unwrap();
        let dest = tmp.path().join("out/x.txt");

        let err = executor(RustBackend::new(), OtherFilePolicy::Template)
            .run_job(&other_job(&source, "ONLY_RED", Some(dest.clone())))
            .unwrap_err();

        assert!(matches!(err, JobError::TemplateDecode { .. }));
        assert!(!err.is_fatal());
        assert!(!dest.exists());
    }

    #[test]
    fn missing_other_file_is_recoverable() {
        let err = executor(RustBackend::new(), OtherFilePolicy::Copy)
            .run_job(&other_job(Path::new("/nonexistent/file.txt"), "ORIGINAL", None))
            .unwrap_err();
        assert!(matches!(err, JobError::Source(SourceError::NotFound(_))));
    }

    #[test]
    fn label_filter_drives_template_tokens() {
        let job = other_job(Path::new("/x.txt"), "WITHOUT_RED", None);
        assert_eq!(job.label, JobLabel::new("WITHOUT_RED", "x"));
    }
}
