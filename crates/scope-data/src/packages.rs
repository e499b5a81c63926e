//! The `packages.xml` manifest: which package owns which UID.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use scope_core::{Result, ScopeError};
use tracing::{debug, warn};

use crate::parser::read_file;

/// File name of the manifest inside the source directory.
pub const MANIFEST_FILE: &str = "packages.xml";

/// UID of the platform itself; never listed in the manifest.
pub const SYSTEM_UID: u32 = 0;

/// Name reported for [`SYSTEM_UID`].
pub const SYSTEM_PACKAGE: &str = "system";

/// One `<package>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub uid: u32,
}

/// Read-only UID ↔ package-name lookup built from the manifest.
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    packages: Vec<Package>,
    by_uid: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
}

impl PackageRegistry {
    /// Load `<source_dir>/packages.xml`.
    pub fn load(source_dir: &Path) -> Result<Self> {
        let path = source_dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(ScopeError::MissingManifest(path));
        }
        let xml = read_file(&path)?;
        Self::parse(&xml, &path)
    }

    /// Parse manifest text. `origin` is only used in error messages.
    ///
    /// Only `<package>` elements directly under the root count. `userId`
    /// wins over `sharedUserId`; entries with neither, or with a
    /// non-numeric id, are skipped. When several packages share a UID the
    /// first one names it.
    pub fn parse(xml: &str, origin: &Path) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut registry = Self::default();
        let mut depth = 0usize;

        loop {
            let event = reader.read_event().map_err(|e| manifest_error(origin, e))?;
            match event {
                Event::Start(ref e) => {
                    if depth == 1 && e.name().as_ref() == b"package" {
                        registry.add_element(e, origin)?;
                    }
                    depth += 1;
                }
                Event::Empty(ref e) => {
                    if depth == 1 && e.name().as_ref() == b"package" {
                        registry.add_element(e, origin)?;
                    }
                }
                Event::End(_) => depth = depth.saturating_sub(1),
                Event::Eof => break,
                _ => {}
            }
        }

        debug!(
            "Loaded {} packages from {}",
            registry.packages.len(),
            origin.display()
        );

        Ok(registry)
    }

    /// Package name owning `uid`; [`SYSTEM_UID`] resolves to
    /// [`SYSTEM_PACKAGE`].
    pub fn name_for_uid(&self, uid: u32) -> Option<&str> {
        if let Some(&i) = self.by_uid.get(&uid) {
            return Some(self.packages[i].name.as_str());
        }
        (uid == SYSTEM_UID).then_some(SYSTEM_PACKAGE)
    }

    pub fn uid_for_name(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).map(|&i| self.packages[i].uid)
    }

    fn add_element(&mut self, element: &BytesStart<'_>, origin: &Path) -> Result<()> {
        let name = attribute(element, "name", origin)?;
        let id = match attribute(element, "userId", origin)? {
            Some(id) => Some(id),
            None => attribute(element, "sharedUserId", origin)?,
        };

        let (Some(name), Some(id)) = (name, id) else {
            warn!("Skipping <package> without name or user id in {}", origin.display());
            return Ok(());
        };
        let Ok(uid) = id.trim().parse::<u32>() else {
            warn!("Skipping package {name}: user id {id:?} is not a number");
            return Ok(());
        };

        self.push(Package { name, uid });
        Ok(())
    }

    fn push(&mut self, package: Package) {
        let index = self.packages.len();
        self.by_uid.entry(package.uid).or_insert(index);
        self.by_name.entry(package.name.clone()).or_insert(index);
        self.packages.push(package);
    }
}

impl FromIterator<Package> for PackageRegistry {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        let mut registry = Self::default();
        for package in iter {
            registry.push(package);
        }
        registry
    }
}

fn attribute(element: &BytesStart<'_>, key: &str, origin: &Path) -> Result<Option<String>> {
    let Some(attr) = element
        .try_get_attribute(key)
        .map_err(|e| manifest_error(origin, e))?
    else {
        return Ok(None);
    };
    let value = attr.unescape_value().map_err(|e| manifest_error(origin, e))?;
    Ok(Some(value.into_owned()).filter(|v| !v.is_empty()))
}

fn manifest_error(origin: &Path, err: impl std::fmt::Display) -> ScopeError {
    ScopeError::ManifestParse {
        path: origin.to_path_buf(),
        message: err.to_string(),
    }
}
