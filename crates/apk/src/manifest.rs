//! AndroidManifest.xml access
//!
//! Reads the decoded (plain-text) manifest apktool emits and collects the
//! permissions the app requests. Parsing is namespace-aware: the interesting
//! attribute is `name` in the `android` namespace, whatever prefix the
//! document binds it to.

use apkscout_core::error::{Error, Result, ResultExt};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::collections::BTreeSet;
use std::path::Path;

/// The Android resource namespace
const ANDROID_NS: Namespace<'static> = Namespace(b"http://schemas.android.com/apk/res/android");

/// The parts of a decoded manifest this tool cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// The `package` attribute of the root element
    pub package: Option<String>,
    /// Requested permissions, deduplicated
    pub permissions: BTreeSet<String>,
}

impl Manifest {
    /// Parse a decoded AndroidManifest.xml file
    pub fn parse(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(Error::from)
            .context(format!("While reading {}", path.display()))?;
        Self::parse_str(&content).context(format!("While parsing {}", path.display()))
    }

    /// Parse manifest XML from a string
    ///
    /// A `uses-permission` element without an `android:name` attribute is an
    /// error, never a silent skip.
    pub fn parse_str(xml: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(xml);
        let mut package = None;
        let mut permissions = BTreeSet::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"manifest" => {
                        package = plain_attribute(&e, b"package")?;
                    }
                    b"uses-permission" => {
                        match android_attribute(&reader, &e, b"name")? {
                            Some(name) => {
                                permissions.insert(name);
                            }
                            None => {
                                return Err(Error::missing_attribute(
                                    "uses-permission",
                                    "android:name",
                                ));
                            }
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self {
            package,
            permissions,
        })
    }

    /// Whether any requested permission is classified dangerous
    pub fn requests_dangerous(&self) -> bool {
        crate::permissions::any_dangerous(&self.permissions)
    }
}

/// The set of permissions a manifest requests
pub fn requested_permissions(path: impl AsRef<Path>) -> Result<BTreeSet<String>> {
    Manifest::parse(path).map(|m| m.permissions)
}

/// Whether a manifest requests any dangerous permission
pub fn requests_dangerous_permissions(path: impl AsRef<Path>) -> Result<bool> {
    Manifest::parse(path).map(|m| m.requests_dangerous())
}

/// Value of an attribute bound to the Android namespace
fn android_attribute(
    reader: &NsReader<&[u8]>,
    element: &BytesStart<'_>,
    name: &[u8],
) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::InvalidAttr)?;
        let (ns, local) = reader.resolve_attribute(attr.key);
        if local.as_ref() == name {
            if let ResolveResult::Bound(bound) = ns {
                if bound == ANDROID_NS {
                    return Ok(Some(attr.unescape_value()?.into_owned()));
                }
            }
        }
    }
    Ok(None)
}

/// Value of an unprefixed attribute
fn plain_attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::InvalidAttr)?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
