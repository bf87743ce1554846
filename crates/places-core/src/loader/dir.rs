// crates/places-core/src/loader/dir.rs
use crate::error::{PlacesError, Result};
use crate::traits::{DataSource, Resource};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads dataset files from a local directory.
///
/// A `places.txt.gz` next to (or instead of) `places.txt` is picked up too;
/// the loader inflates it.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, resource: &Resource) -> [PathBuf; 2] {
        let name = resource.file_name();
        [self.root.join(&name), self.root.join(format!("{name}.gz"))]
    }
}

#[async_trait]
impl DataSource for DirSource {
    async fn fetch(&self, resource: &Resource) -> Result<Vec<u8>> {
        for path in self.candidates(resource) {
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    log::debug!("read {}", path.display());
                    return Ok(bytes);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(PlacesError::NotFound(format!(
            "{} not found in {}",
            resource,
            self.root.display()
        )))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("places-dir-{name}-{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn reads_plain_and_gz_fallback() {
        let dir = scratch_dir("read");
        std::fs::write(dir.join("countries.txt"), "iso2,country\n").unwrap();
        std::fs::write(dir.join("places-fr.txt.gz"), [0x1f, 0x8b]).unwrap();

        let source = DirSource::new(&dir);
        assert_eq!(source.fetch(&Resource::Countries).await.unwrap(), b"iso2,country\n");
        assert_eq!(
            source.fetch(&Resource::CountryPlaces("fr".into())).await.unwrap(),
            vec![0x1f, 0x8b]
        );

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = scratch_dir("missing");
        let err = DirSource::new(&dir).fetch(&Resource::Places).await.unwrap_err();
        assert!(matches!(err, PlacesError::NotFound(_)));
        std::fs::remove_dir_all(dir).unwrap();
    }
}
